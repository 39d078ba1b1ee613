//! Command line configuration for the server and client binaries

use std::time::Duration;

use clap::{Args, Parser};

/// Default bind/connect host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind/connect port
pub const DEFAULT_PORT: u16 = 5000;

/// Host and port shared by both binaries
#[derive(Args, Debug, Clone)]
pub struct Endpoint {
    /// Host to bind to or connect to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// TCP port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl Endpoint {
    /// `host:port`, as accepted by `TcpListener::bind` and `TcpStream::connect`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chat server arguments
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal chat server", long_about = None)]
pub struct ServerConfig {
    #[command(flatten)]
    pub endpoint: Endpoint,

    #[command(flatten)]
    pub session: SessionConfig,
}

/// Per-connection limits
#[derive(Args, Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Milliseconds a single socket write may take before the client is dropped
    #[arg(long = "write-timeout-ms", default_value_t = 5000)]
    pub write_timeout_ms: u64,

    /// Lines queued per client before it counts as stalled
    #[arg(long, default_value_t = 64)]
    pub outbound_buffer: usize,

    /// Longest accepted input line in bytes, line terminator excluded
    #[arg(long, default_value_t = 4096)]
    pub max_line_length: usize,
}

impl SessionConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: 5000,
            outbound_buffer: 64,
            max_line_length: 4096,
        }
    }
}

/// Chat client arguments
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal chat client", long_about = None)]
pub struct ClientConfig {
    #[command(flatten)]
    pub endpoint: Endpoint,
}
