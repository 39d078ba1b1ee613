//! Line protocol definitions
//!
//! Parses one client line into a `ParsedCommand` and formats every line the
//! server sends back. All messages are plain UTF-8 text, one per line.

use std::fmt::Display;

/// Prompt sent right after accepting a connection
pub const USERNAME_PROMPT: &str = "Enter your username: ";

/// Sent before closing a connection whose username was rejected
pub const NAME_TAKEN: &str = "Username already taken. Disconnecting.";

/// Sent to a client once it is registered
pub const WELCOME: &str = "Welcome to TerminalChat! Type '/pm <user> <message>' to send private messages. And /quit to exit.";

/// Usage hint for a `/pm` without a message body
pub const PM_USAGE: &str = "Usage: /pm <username> <message>";

const PM_PREFIX: &str = "/pm ";
const QUIT_PREFIX: &str = "/quit";
const LIST_PREFIX: &str = "/list";

/// One parsed client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// Plain text for everyone else
    Broadcast { text: String },
    /// `/pm <target> <text>`
    PrivateMessage { target: String, text: String },
    /// `/list`
    ListUsers,
    /// `/quit`
    Quit,
    /// Malformed command, reported back to the sender
    Invalid { reason: String },
}

/// What the connection handler should do after a line is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Keep reading lines
    Continue,
    /// Remove the sender and close the connection
    Quit,
}

impl ParsedCommand {
    /// Parse a raw client line
    ///
    /// Prefix matching is case-sensitive and runs on the trimmed line. The
    /// first matching rule wins: `/pm `, then `/quit`, then `/list`.
    pub fn parse(raw: &str) -> Self {
        let line = raw.trim();

        if let Some(rest) = line.strip_prefix(PM_PREFIX) {
            return match rest.split_once(' ') {
                Some((target, text)) => ParsedCommand::PrivateMessage {
                    target: target.to_string(),
                    text: text.to_string(),
                },
                None => ParsedCommand::Invalid {
                    reason: PM_USAGE.to_string(),
                },
            };
        }

        if line.starts_with(QUIT_PREFIX) {
            ParsedCommand::Quit
        } else if line.starts_with(LIST_PREFIX) {
            ParsedCommand::ListUsers
        } else {
            ParsedCommand::Broadcast {
                text: line.to_string(),
            }
        }
    }
}

/// `[alice] hello`
pub fn chat_line(sender: impl Display, text: &str) -> String {
    format!("[{}] {}", sender, text)
}

/// `[PM from alice] hi`
pub fn pm_from_line(sender: impl Display, text: &str) -> String {
    format!("[PM from {}] {}", sender, text)
}

/// `[PM to bob] hi`
pub fn pm_to_line(target: &str, text: &str) -> String {
    format!("[PM to {}] {}", target, text)
}

/// `[ERROR] ...`
pub fn error_line(reason: impl Display) -> String {
    format!("[ERROR] {}", reason)
}

/// Error sent when a private message target is not online
pub fn user_not_found_line(target: &str) -> String {
    error_line(format!("User '{}' not found.", target))
}

/// `[USERS ONLINE] alice, bob`
pub fn users_online_line<T: Display>(names: &[T]) -> String {
    let joined = names
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[USERS ONLINE] {}", joined)
}

/// `[SERVER] alice has joined the chat.`
pub fn joined_line(username: impl Display) -> String {
    format!("[SERVER] {} has joined the chat.", username)
}

/// `[SERVER] alice has left the chat.`
pub fn left_line(username: impl Display) -> String {
    format!("[SERVER] {} has left the chat.", username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_private_message() {
        assert_eq!(
            ParsedCommand::parse("/pm bob hi there"),
            ParsedCommand::PrivateMessage {
                target: "bob".to_string(),
                text: "hi there".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_private_message_without_body() {
        assert_eq!(
            ParsedCommand::parse("/pm bob"),
            ParsedCommand::Invalid {
                reason: PM_USAGE.to_string(),
            }
        );
    }

    #[test]
    fn test_parse_quit_and_list() {
        assert_eq!(ParsedCommand::parse("/quit"), ParsedCommand::Quit);
        assert_eq!(ParsedCommand::parse("  /quit now\n"), ParsedCommand::Quit);
        assert_eq!(ParsedCommand::parse("/list"), ParsedCommand::ListUsers);
    }

    #[test]
    fn test_parse_broadcast() {
        assert_eq!(
            ParsedCommand::parse("hello"),
            ParsedCommand::Broadcast {
                text: "hello".to_string(),
            }
        );
        assert_eq!(
            ParsedCommand::parse(""),
            ParsedCommand::Broadcast {
                text: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(
            ParsedCommand::parse("/QUIT"),
            ParsedCommand::Broadcast {
                text: "/QUIT".to_string(),
            }
        );
        // "/pm" without the trailing space is not a private message
        assert_eq!(
            ParsedCommand::parse("/pm"),
            ParsedCommand::Broadcast {
                text: "/pm".to_string(),
            }
        );
    }

    #[test]
    fn test_users_online_line() {
        assert_eq!(
            users_online_line(&["alice", "bob"][..]),
            "[USERS ONLINE] alice, bob"
        );
    }
}
