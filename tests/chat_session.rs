use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use terminal_chat::command::{NAME_TAKEN, USERNAME_PROMPT, WELCOME};
use terminal_chat::{serve, SessionConfig};

const READ_TIMEOUT: Duration = Duration::from_secs(3);

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Next server line, or `None` once the server closed the connection
    async fn recv(&mut self) -> Option<String> {
        timeout(READ_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for server")
            .unwrap()
    }

    async fn expect(&mut self, expected: &str) {
        assert_eq!(self.recv().await.as_deref(), Some(expected));
    }
}

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, SessionConfig::default()));
    addr
}

async fn join(addr: SocketAddr, username: &str) -> TestClient {
    let mut client = TestClient::connect(addr).await;
    client.expect(USERNAME_PROMPT).await;
    client.send(username).await;
    client.expect(WELCOME).await;
    client
}

#[tokio::test]
async fn test_join_is_announced_to_others() {
    let addr = start_server().await;

    let mut alice = join(addr, "alice").await;
    let _bob = join(addr, "bob").await;

    alice.expect("[SERVER] bob has joined the chat.").await;
}

#[tokio::test]
async fn test_private_message_and_confirmation() {
    let addr = start_server().await;
    let mut alice = join(addr, "alice").await;
    let mut bob = join(addr, "bob").await;
    alice.expect("[SERVER] bob has joined the chat.").await;

    alice.send("/pm bob hi there").await;

    bob.expect("[PM from alice] hi there").await;
    alice.expect("[PM to bob] hi there").await;
}

#[tokio::test]
async fn test_private_message_to_missing_user() {
    let addr = start_server().await;
    let mut alice = join(addr, "alice").await;

    alice.send("/pm carol hi").await;
    alice.expect("[ERROR] User 'carol' not found.").await;

    alice.send("/pm carol").await;
    alice
        .expect("[ERROR] Usage: /pm <username> <message>")
        .await;
}

#[tokio::test]
async fn test_broadcast_skips_sender() {
    let addr = start_server().await;
    let mut alice = join(addr, "alice").await;
    let mut bob = join(addr, "bob").await;
    let mut carol = join(addr, "carol").await;
    alice.expect("[SERVER] bob has joined the chat.").await;
    alice.expect("[SERVER] carol has joined the chat.").await;
    bob.expect("[SERVER] carol has joined the chat.").await;

    alice.send("hello").await;

    bob.expect("[alice] hello").await;
    carol.expect("[alice] hello").await;

    // The next thing alice sees is her own /list reply, not her broadcast
    alice.send("/list").await;
    alice.expect("[USERS ONLINE] alice, bob, carol").await;
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let addr = start_server().await;
    let mut alice = join(addr, "alice").await;
    let mut bob = join(addr, "bob").await;
    alice.expect("[SERVER] bob has joined the chat.").await;

    let mut impostor = TestClient::connect(addr).await;
    impostor.expect(USERNAME_PROMPT).await;
    impostor.send("bob").await;
    impostor.expect(NAME_TAKEN).await;
    assert_eq!(impostor.recv().await, None);

    // The original bob still works
    alice.send("/pm bob still there?").await;
    bob.expect("[PM from alice] still there?").await;
    alice.expect("[PM to bob] still there?").await;
}

#[tokio::test]
async fn test_empty_username_rejected() {
    let addr = start_server().await;

    let mut client = TestClient::connect(addr).await;
    client.expect(USERNAME_PROMPT).await;
    client.send("   ").await;
    client.expect(NAME_TAKEN).await;
    assert_eq!(client.recv().await, None);
}

#[tokio::test]
async fn test_quit_announces_departure_and_frees_name() {
    let addr = start_server().await;
    let mut alice = join(addr, "alice").await;
    let mut bob = join(addr, "bob").await;
    alice.expect("[SERVER] bob has joined the chat.").await;

    bob.send("/quit").await;
    assert_eq!(bob.recv().await, None);
    alice.expect("[SERVER] bob has left the chat.").await;

    let _bob_again = join(addr, "bob").await;
    alice.expect("[SERVER] bob has joined the chat.").await;
}

#[tokio::test]
async fn test_dropped_connection_announces_departure() {
    let addr = start_server().await;
    let mut alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;
    alice.expect("[SERVER] bob has joined the chat.").await;

    drop(bob);

    alice.expect("[SERVER] bob has left the chat.").await;
    alice.send("/list").await;
    alice.expect("[USERS ONLINE] alice").await;
}
