//! Message router
//!
//! Turns one client line into registry actions. The router keeps no state of
//! its own; everything goes through the `ClientRegistry` it is handed.

use tracing::debug;

use crate::command::{self, CommandOutcome, ParsedCommand};
use crate::error::SendError;
use crate::registry::ClientRegistry;
use crate::types::Username;

/// Route a line received from `sender`
///
/// Returns `Quit` when the sender asked to leave. Removing the sender and
/// closing the connection is left to the caller.
pub fn route(registry: &mut ClientRegistry, sender: &Username, raw_line: &str) -> CommandOutcome {
    match ParsedCommand::parse(raw_line) {
        ParsedCommand::Broadcast { text } => {
            let line = command::chat_line(sender, &text);
            registry.broadcast(&line, Some(sender.as_str()));
        }
        ParsedCommand::PrivateMessage { target, text } => {
            send_private_message(registry, sender, &target, &text);
        }
        ParsedCommand::ListUsers => {
            let names = registry.snapshot_names();
            let line = command::users_online_line(names.as_slice());
            let _ = registry.send_to(sender.as_str(), &line);
        }
        ParsedCommand::Quit => {
            debug!("{} asked to quit", sender);
            return CommandOutcome::Quit;
        }
        ParsedCommand::Invalid { reason } => {
            let _ = registry.send_to(sender.as_str(), &command::error_line(reason));
        }
    }
    CommandOutcome::Continue
}

/// Deliver a private message and confirm it to the sender
///
/// Confirmations and error notices are best-effort.
fn send_private_message(registry: &mut ClientRegistry, sender: &Username, target: &str, text: &str) {
    match registry.send_to(target, &command::pm_from_line(sender, text)) {
        Ok(()) => {
            debug!("PM {} -> {}", sender, target);
            let _ = registry.send_to(sender.as_str(), &command::pm_to_line(target, text));
        }
        Err(SendError::NotFound) => {
            let _ = registry.send_to(sender.as_str(), &command::user_not_found_line(target));
        }
        Err(SendError::SendFailed) => {
            // Target was evicted by send_to; it is reported as absent next time
            debug!("PM {} -> {} dropped", sender, target);
        }
    }
}
