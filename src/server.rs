//! ChatServer Actor implementation
//!
//! The central actor that owns the client registry. Connection handlers never
//! touch the registry directly; they send `ServerCommand`s over an mpsc
//! channel and the actor applies them one at a time.

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::client::ConnectionHandle;
use crate::command::{self, CommandOutcome};
use crate::config::SessionConfig;
use crate::handler::handle_connection;
use crate::registry::ClientRegistry;
use crate::router;
use crate::types::{ConnectionId, Username};

/// Channel buffer size for server commands
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Register a username; replies whether it was accepted
    Join {
        client_id: ConnectionId,
        username: Username,
        sender: mpsc::Sender<String>,
        reply: oneshot::Sender<bool>,
    },
    /// Route one line from a registered client
    Route {
        client_id: ConnectionId,
        username: Username,
        line: String,
        reply: oneshot::Sender<CommandOutcome>,
    },
    /// Client quit or its connection dropped
    Leave {
        client_id: ConnectionId,
        username: Username,
    },
    /// Number of registered clients
    Count {
        reply: oneshot::Sender<usize>,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// Who is online
    registry: ClientRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: ClientRegistry::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Join {
                client_id,
                username,
                sender,
                reply,
            } => {
                self.handle_join(client_id, username, sender, reply);
            }
            ServerCommand::Route {
                client_id,
                username,
                line,
                reply,
            } => {
                self.handle_route(client_id, username, line, reply);
            }
            ServerCommand::Leave { client_id, username } => {
                self.handle_leave(client_id, username);
            }
            ServerCommand::Count { reply } => {
                let _ = reply.send(self.registry.count());
            }
        }
    }

    /// Handle username registration
    fn handle_join(
        &mut self,
        client_id: ConnectionId,
        username: Username,
        sender: mpsc::Sender<String>,
        reply: oneshot::Sender<bool>,
    ) {
        let handle = ConnectionHandle::new(client_id, sender);
        if !self.registry.add(username.clone(), handle) {
            info!("Client {} rejected: '{}' is taken", client_id, username);
            let _ = reply.send(false);
            return;
        }

        if reply.send(true).is_err() {
            // Handler went away while waiting for the answer
            self.registry.release(username.as_str(), client_id);
            return;
        }

        info!("Client {} joined as '{}'", client_id, username);
        self.registry
            .broadcast(&command::joined_line(&username), Some(username.as_str()));
        let _ = self.registry.send_to(username.as_str(), command::WELCOME);

        debug!("Total clients: {}", self.registry.count());
    }

    /// Handle one line from a client
    fn handle_route(
        &mut self,
        client_id: ConnectionId,
        username: Username,
        line: String,
        reply: oneshot::Sender<CommandOutcome>,
    ) {
        // Evicted connections must stop
        if !self.registry.owns(username.as_str(), client_id) {
            debug!("Dropping line from stale connection {}", client_id);
            let _ = reply.send(CommandOutcome::Quit);
            return;
        }

        let outcome = router::route(&mut self.registry, &username, &line);
        let _ = reply.send(outcome);
    }

    /// Handle client departure
    fn handle_leave(&mut self, client_id: ConnectionId, username: Username) {
        if !self.registry.release(username.as_str(), client_id) {
            return;
        }

        info!("Client {} ('{}') left", client_id, username);
        self.registry.broadcast(&command::left_line(&username), None);

        debug!("Total clients: {}", self.registry.count());
    }
}

/// Accept connections forever, one handler task per connection
pub async fn serve(listener: TcpListener, session: SessionConfig) {
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    tokio::spawn(ChatServer::new(cmd_rx).run());

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, session).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
