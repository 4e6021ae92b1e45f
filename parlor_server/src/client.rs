// TCP client for connecting to the room server.
//
// Provides a non-blocking interface for driving a room from another
// process or from integration tests. Architecture:
// - `connect()` performs TCP connect + Hello handshake on the calling
//   thread, then spawns a background reader thread.
// - The reader thread calls `read_message()` in a loop, deserializes
//   `ServerMessage`, and pushes into an `mpsc` channel.
// - The caller holds a `BufWriter<TcpStream>` for sending.
// - `poll()` drains the inbox non-blocking, returning all queued messages.
//
// This separation ensures the caller never blocks on network I/O. The
// reader thread handles the blocking reads, and the writer flushes
// synchronously (acceptable for the small messages we send).
//
// This module lives in the server crate because it is purely std TCP +
// protocol framing + mpsc; integration tests in `room_tests` use it to
// exercise the full pipeline without duplicating the handshake.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use parlor_games::board::{Color, Mark};
use parlor_protocol::framing::{read_message, write_message};
use parlor_protocol::message::{ClientMessage, ServerMessage};
use parlor_protocol::types::{Role, RoomId};

/// Information returned by a successful `connect()` handshake.
pub struct JoinInfo {
    pub role: Role,
    pub color: Option<Color>,
    pub mark: Option<Mark>,
}

/// TCP client for room-server communication.
pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: Option<JoinHandle<()>>,
}

impl NetClient {
    /// Connect to a room server, perform the Hello handshake, and spawn a
    /// reader thread. Returns the client and its seat assignment.
    pub fn connect(addr: &str, room: &str, size: u32) -> Result<(Self, JoinInfo), String> {
        let stream = TcpStream::connect(addr).map_err(|e| format!("connect failed: {e}"))?;

        // Set a read timeout for the handshake.
        stream
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .ok();

        let reader_stream = stream
            .try_clone()
            .map_err(|e| format!("clone failed: {e}"))?;
        let mut writer = BufWriter::new(stream);

        // Send Hello.
        let hello = ClientMessage::Hello {
            protocol_version: 1,
            room: RoomId::new(room),
            size,
        };
        send_msg(&mut writer, &hello).map_err(|e| format!("send Hello failed: {e}"))?;

        // Read AssignRole or Rejected.
        let mut reader = BufReader::new(reader_stream);
        let response_bytes =
            read_message(&mut reader).map_err(|e| format!("read AssignRole failed: {e}"))?;
        let response: ServerMessage = serde_json::from_slice(&response_bytes)
            .map_err(|e| format!("parse AssignRole failed: {e}"))?;

        let join_info = match response {
            ServerMessage::AssignRole { role, color, mark } => JoinInfo { role, color, mark },
            ServerMessage::Rejected { reason } => {
                return Err(format!("rejected: {reason}"));
            }
            other => {
                return Err(format!("unexpected response: {other:?}"));
            }
        };

        // Clear the read timeout for the long-lived reader loop.
        if let Ok(inner) = reader.get_ref().try_clone() {
            inner.set_read_timeout(None).ok();
        }

        // Spawn the reader thread. The initial State snapshot arrives
        // through the inbox like every later broadcast.
        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            reader_loop(reader, tx);
        });

        Ok((
            Self {
                writer,
                inbox: rx,
                _reader_thread: Some(reader_thread),
            },
            join_info,
        ))
    }

    /// Send a chess move by board indices.
    pub fn send_move(&mut self, from: u32, to: u32) -> Result<(), String> {
        let msg = ClientMessage::Move { from, to };
        send_msg(&mut self.writer, &msg).map_err(|e| format!("send Move failed: {e}"))
    }

    /// Send a tic-tac-toe placement.
    pub fn send_place(&mut self, index: u32) -> Result<(), String> {
        let msg = ClientMessage::Place { index };
        send_msg(&mut self.writer, &msg).map_err(|e| format!("send Place failed: {e}"))
    }

    /// Ask the room to reinitialize its game.
    pub fn send_reset(&mut self) -> Result<(), String> {
        send_msg(&mut self.writer, &ClientMessage::Reset)
            .map_err(|e| format!("send Reset failed: {e}"))
    }

    /// Send an emote.
    pub fn send_emote(&mut self, emoji: &str) -> Result<(), String> {
        let msg = ClientMessage::Emote {
            emoji: emoji.into(),
        };
        send_msg(&mut self.writer, &msg).map_err(|e| format!("send Emote failed: {e}"))
    }

    /// Send Goodbye and close the connection.
    pub fn disconnect(&mut self) {
        let _ = send_msg(&mut self.writer, &ClientMessage::Goodbye);
    }

    /// Drain all queued server messages (non-blocking).
    pub fn poll(&self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.inbox.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

/// Serialize a `ClientMessage` to JSON and write with length-delimited framing.
fn send_msg(writer: &mut BufWriter<TcpStream>, msg: &ClientMessage) -> Result<(), String> {
    let json = serde_json::to_vec(msg).map_err(|e| e.to_string())?;
    write_message(writer, &json).map_err(|e| e.to_string())
}

/// Reader thread: read framed messages in a loop, push to channel.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<ServerMessage>) {
    while let Ok(bytes) = read_message(&mut reader) {
        match serde_json::from_slice::<ServerMessage>(&bytes) {
            Ok(msg) => {
                if tx.send(msg).is_err() {
                    break; // Caller dropped the receiver
                }
            }
            Err(_) => break, // Malformed message
        }
    }
}
