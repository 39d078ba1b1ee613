//! Terminal Chat Client - Entry Point
//!
//! Connects to the chat server, answers the username prompt, then relays
//! stdin lines to the server while printing everything the server sends.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use terminal_chat::ClientConfig;

const BANNER_WIDTH: usize = 50;

/// Input lines buffered between the stdin thread and the chat loop
const INPUT_BUFFER: usize = 16;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr and stay quiet unless RUST_LOG asks for more
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("terminal_chat=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = ClientConfig::parse();
    let addr = config.endpoint.addr();

    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("       TERMINAL CHAT CLIENT");
    println!("{}", "=".repeat(BANNER_WIDTH));

    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            debug!("Connect to {} failed: {}", addr, e);
            eprintln!("[ERROR] Could not connect to server at {}", addr);
            eprintln!("[INFO] Make sure the server is running.");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run(stream, &addr).await {
        eprintln!("[ERROR] {}", e);
        return ExitCode::FAILURE;
    }

    println!("\n[GOODBYE] Thanks for using Terminal Chat!");
    ExitCode::SUCCESS
}

/// Handshake, then the chat loop until `/quit`, Ctrl-C or server EOF
async fn run(stream: TcpStream, addr: &str) -> io::Result<()> {
    println!("[CONNECTED] Connected to server at {}\n", addr);

    let (reader, mut writer) = stream.into_split();
    let mut server = BufReader::new(reader).lines();
    let mut stdin = spawn_input_reader(io::BufReader::new(io::stdin()));

    if !handshake(&mut server, &mut writer, &mut stdin).await? {
        let _ = writer.shutdown().await;
        return Ok(());
    }

    show_prompt()?;
    loop {
        tokio::select! {
            line = server.next_line() => {
                match line? {
                    Some(line) => {
                        println!("\n{}", line);
                        show_prompt()?;
                    }
                    None => {
                        println!("\n[DISCONNECTED] Connection to server lost.");
                        break;
                    }
                }
            }
            input = stdin.recv() => {
                let Some(input) = input else {
                    // stdin closed
                    send_line(&mut writer, "/quit").await?;
                    break;
                };
                let text = input.trim();
                if text.is_empty() {
                    show_prompt()?;
                    continue;
                }
                send_line(&mut writer, text).await?;
                if text == "/quit" {
                    println!("[INFO] Disconnecting...");
                    break;
                }
            }
            ctrl_c = tokio::signal::ctrl_c() => {
                if let Err(e) = ctrl_c {
                    warn!("Ctrl-C handler failed: {}", e);
                }
                println!("\n[INFO] Disconnecting...");
                let _ = send_line(&mut writer, "/quit").await;
                break;
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Socket shutdown failed: {}", e);
    }
    Ok(())
}

/// Answer the username prompt; returns false if the server turned us away
async fn handshake(
    server: &mut Lines<BufReader<OwnedReadHalf>>,
    writer: &mut OwnedWriteHalf,
    stdin: &mut mpsc::Receiver<String>,
) -> io::Result<bool> {
    let Some(prompt) = server.next_line().await? else {
        println!("[DISCONNECTED] Connection to server lost.");
        return Ok(false);
    };
    print!("{}", prompt);
    io::stdout().flush()?;

    let username = stdin.recv().await.unwrap_or_default();
    send_line(writer, username.trim()).await?;

    let Some(response) = server.next_line().await? else {
        println!("[DISCONNECTED] Connection to server lost.");
        return Ok(false);
    };
    println!("{}", response);

    Ok(!response.contains("Disconnecting"))
}

/// Read `input` line by line on a dedicated thread
///
/// The thread is never joined, so a read blocked on the terminal does not
/// keep the process alive once the chat loop is done. The channel closes at
/// end of input or on a read error.
fn spawn_input_reader<R>(input: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    std::thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn send_line(writer: &mut OwnedWriteHalf, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

fn show_prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}
