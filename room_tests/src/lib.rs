// Test-only room client for cross-crate integration tests.
//
// Wraps the real `NetClient` (from `parlor_server::client`) to provide a
// synchronous, test-friendly API for exercising the full pipeline:
// handshake → seat assignment → move → legality check → broadcast →
// snapshot. The only test-specific code here is the blocking wrappers
// around `NetClient::poll()`; all networking uses the same code paths as
// a real client.
//
// The `expect_*` helpers assert on the *next* message, not the next
// message of a given kind — tests rely on that to prove a rejected move
// produced no broadcast at all (an emote sent right after it must be the
// very next thing every member sees).
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use parlor_games::board::{Color, Mark};
use parlor_protocol::message::{ServerMessage, StateSnapshot};
use parlor_protocol::types::Role;
use parlor_server::client::NetClient;
use parlor_server::server::{ServerConfig, ServerHandle, start_server};

/// Default timeout for blocking poll operations.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep duration between poll attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Start a room server on an OS-picked port and give the listener thread
/// a moment to come up.
pub fn start_test_server() -> (ServerHandle, SocketAddr) {
    let (handle, addr) = start_server(ServerConfig { port: 0 }).expect("start_server failed");
    thread::sleep(Duration::from_millis(50));
    (handle, addr)
}

/// A test client wrapping a real NetClient.
pub struct TestRoomClient {
    client: NetClient,
    /// Messages polled but not yet consumed by an `expect_*` call.
    pending: VecDeque<ServerMessage>,
    pub role: Role,
    pub color: Option<Color>,
    pub mark: Option<Mark>,
}

impl TestRoomClient {
    /// Connect and join `room` with the given board dimension.
    pub fn connect(addr: SocketAddr, room: &str, size: u32) -> Self {
        let (client, info) = NetClient::connect(&addr.to_string(), room, size)
            .expect("TestRoomClient::connect failed");
        Self {
            client,
            pending: VecDeque::new(),
            role: info.role,
            color: info.color,
            mark: info.mark,
        }
    }

    pub fn send_move(&mut self, from: u32, to: u32) {
        self.client.send_move(from, to).expect("send_move failed");
    }

    pub fn send_place(&mut self, index: u32) {
        self.client.send_place(index).expect("send_place failed");
    }

    pub fn send_reset(&mut self) {
        self.client.send_reset().expect("send_reset failed");
    }

    pub fn send_emote(&mut self, emoji: &str) {
        self.client.send_emote(emoji).expect("send_emote failed");
    }

    pub fn disconnect(&mut self) {
        self.client.disconnect();
    }

    /// Blocking: the next server message, whatever it is.
    pub fn next_message(&mut self) -> ServerMessage {
        let start = Instant::now();
        loop {
            if let Some(msg) = self.pending.pop_front() {
                return msg;
            }
            assert!(
                start.elapsed() < POLL_TIMEOUT,
                "timed out waiting for a server message"
            );
            self.pending.extend(self.client.poll());
            if self.pending.is_empty() {
                thread::sleep(POLL_INTERVAL);
            }
        }
    }

    /// Blocking: assert the next message is a State and return it.
    pub fn expect_state(&mut self) -> StateSnapshot {
        match self.next_message() {
            ServerMessage::State(state) => state,
            other => panic!("expected State, got {other:?}"),
        }
    }

    /// Blocking: assert the next message is an Emote and return it.
    pub fn expect_emote(&mut self) -> (String, Role) {
        match self.next_message() {
            ServerMessage::Emote { emoji, from } => (emoji, from),
            other => panic!("expected Emote, got {other:?}"),
        }
    }

    /// Blocking: assert the next message is a departure notice and return
    /// the freed seat.
    pub fn expect_player_left(&mut self) -> Role {
        match self.next_message() {
            ServerMessage::PlayerLeft { role, .. } => role,
            other => panic!("expected PlayerLeft, got {other:?}"),
        }
    }
}
