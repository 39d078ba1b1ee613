//! Terminal Chat Server Library
//!
//! A multi-user text chat over newline-framed TCP. Every client picks a
//! unique username and can then broadcast, send private messages and list
//! who is online.
//!
//! # Commands
//! - `/pm <user> <message>`: private message
//! - `/list`: list online users
//! - `/quit`: leave the chat
//! - anything else: broadcast to everyone else
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the `ClientRegistry`
//! - Each connection has a `handler` task communicating with the server
//! - `router::route` turns one line into registry operations inside the actor
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use terminal_chat::{serve, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:5000").await.unwrap();
//!     serve(listener, SessionConfig::default()).await;
//! }
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod registry;
pub mod router;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::ConnectionHandle;
pub use command::{CommandOutcome, ParsedCommand};
pub use config::{ClientConfig, ServerConfig, SessionConfig};
pub use error::{AppError, SendError, UsernameError};
pub use handler::handle_connection;
pub use registry::ClientRegistry;
pub use router::route;
pub use server::{serve, ChatServer, ServerCommand};
pub use types::{ConnectionId, Username};
