//! TCP connection handler
//!
//! Handles individual client connections: username handshake, newline-framed
//! reading, and a writer task that drains the client's outbound queue with a
//! bounded time per socket write.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::command::{CommandOutcome, NAME_TAKEN, USERNAME_PROMPT};
use crate::config::SessionConfig;
use crate::error::AppError;
use crate::server::ServerCommand;
use crate::types::{ConnectionId, Username};

const LINE_ENDINGS: &[char] = &['\n', '\r'];

/// Handle a new TCP connection
///
/// Runs the username handshake, then forwards every line to the ChatServer
/// until the client quits, disconnects, or can no longer be written to.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    session: SessionConfig,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let client_id = ConnectionId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    let write_timeout = session.write_timeout();
    let (reader, mut writer) = stream.into_split();
    let mut lines = LineReader::new(reader, session.max_line_length);

    write_line(&mut writer, USERNAME_PROMPT, write_timeout).await?;
    let Some(raw_name) = lines.next_line().await? else {
        debug!("Client {} left before choosing a username", client_id);
        return Ok(());
    };

    // Server -> client line queue
    let (msg_tx, mut msg_rx) = mpsc::channel::<String>(session.outbound_buffer.max(1));

    let username = match register(&cmd_tx, client_id, &raw_name, msg_tx).await {
        Ok(username) => username,
        Err(AppError::NameTaken | AppError::Username(_)) => {
            info!("Client {} rejected username '{}'", client_id, raw_name.trim());
            write_line(&mut writer, NAME_TAKEN, write_timeout).await?;
            let _ = writer.shutdown().await;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    // Spawn write task (outbound queue -> socket)
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = msg_rx.recv().await {
            if let Err(e) = write_line(&mut writer, &line, write_timeout).await {
                warn!("Write to {} failed: {}", client_id, e);
                break;
            }
        }
        let _ = timeout(write_timeout, writer.shutdown()).await;
        debug!("Write task ended for {}", client_id);
    });

    // Spawn read task (socket -> ServerCommand)
    let cmd_tx_read = cmd_tx.clone();
    let sender = username.clone();
    let mut read_task = tokio::spawn(async move {
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Client {} closed the connection", client_id);
                    break;
                }
                Err(e) => {
                    warn!("Read error for {}: {}", client_id, e);
                    break;
                }
            };

            let (reply, outcome) = oneshot::channel();
            let cmd = ServerCommand::Route {
                client_id,
                username: sender.clone(),
                line,
                reply,
            };
            if cmd_tx_read.send(cmd).await.is_err() {
                debug!("Server closed, ending read task for {}", client_id);
                break;
            }

            match outcome.await {
                Ok(CommandOutcome::Continue) => {}
                Ok(CommandOutcome::Quit) | Err(_) => break,
            }
        }
        debug!("Read task ended for {}", client_id);
    });

    // Wait for either task to complete
    let writer_finished = tokio::select! {
        _ = &mut read_task => false,
        _ = &mut write_task => true,
    };
    if writer_finished {
        read_task.abort();
    }

    let _ = cmd_tx
        .send(ServerCommand::Leave {
            client_id,
            username: username.clone(),
        })
        .await;

    // Leave dropped the registry's handle, so the writer flushes and exits
    if !writer_finished && timeout(write_timeout, write_task).await.is_err() {
        debug!("Write task for {} did not drain in time", client_id);
    }

    info!("Client {} ('{}') disconnected", client_id, username);

    Ok(())
}

/// Ask the ChatServer to register `raw_name` for this connection
async fn register(
    cmd_tx: &mpsc::Sender<ServerCommand>,
    client_id: ConnectionId,
    raw_name: &str,
    sender: mpsc::Sender<String>,
) -> Result<Username, AppError> {
    let username = Username::parse(raw_name)?;

    let (reply, accepted) = oneshot::channel();
    cmd_tx
        .send(ServerCommand::Join {
            client_id,
            username: username.clone(),
            sender,
            reply,
        })
        .await
        .map_err(|_| AppError::ChannelSend)?;

    if accepted.await.map_err(|_| AppError::ChannelSend)? {
        Ok(username)
    } else {
        Err(AppError::NameTaken)
    }
}

/// Newline-framed reader with a per-line size limit
struct LineReader<R> {
    inner: BufReader<R>,
    /// Longest accepted line in bytes, terminator excluded
    max_len: usize,
    buf: String,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    fn new(inner: R, max_len: usize) -> Self {
        Self {
            inner: BufReader::new(inner),
            max_len: max_len.max(1),
            buf: String::new(),
        }
    }

    /// Next line without its terminator, or `None` at end of stream
    ///
    /// A line longer than the limit is an `InvalidData` error. A final
    /// unterminated line is still returned.
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        // Room for the content plus a `\r\n` terminator
        let budget = self.max_len as u64 + 2;

        self.buf.clear();
        let n = (&mut self.inner)
            .take(budget)
            .read_line(&mut self.buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }

        let line = self.buf.trim_end_matches(LINE_ENDINGS);
        let truncated = n as u64 >= budget && !self.buf.ends_with('\n');
        if line.len() > self.max_len || truncated {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "line too long"));
        }

        Ok(Some(line.to_string()))
    }
}

/// Write one newline-terminated line, giving up after `limit`
async fn write_line<W>(writer: &mut W, line: &str, limit: Duration) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = Vec::with_capacity(line.len() + 1);
    encoded.extend_from_slice(line.as_bytes());
    encoded.push(b'\n');

    let write = async {
        writer.write_all(&encoded).await?;
        writer.flush().await
    };

    timeout(limit, write)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "write timed out"))?
}
