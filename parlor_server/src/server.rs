// TCP server and main event loop for the room server.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and sends `InternalEvent::NewConnection` to the dispatch
//   thread.
// - **Reader threads** (one per client): call `framing::read_message()` in
//   a loop, deserialize `ClientMessage`, and send
//   `InternalEvent::MessageFrom` to the dispatch thread. On error/EOF,
//   send `InternalEvent::Disconnected`. Malformed frames are logged and
//   skipped — the connection stays open and no state changes.
// - **Dispatch thread**: owns the `RoomRegistry`, receives events from the
//   channel, and processes each one to completion before the next. Board
//   mutation, legality check, and snapshot broadcast therefore form one
//   atomic unit relative to any other message, and a fault in one room's
//   message never affects another room.
//
// The dispatch thread is the only writer to client TCP streams (via
// `Room::broadcast`/`send_to`). Reader threads only read from streams.
// This avoids concurrent read/write on the same `TcpStream`, which is safe
// on most platforms but fragile.
//
// Shutdown: the dispatch thread checks a `keep_running` flag (set to false
// by `ServerHandle::stop`) and breaks out of the event loop.

use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use parlor_protocol::framing::{read_message, write_message};
use parlor_protocol::message::{ClientMessage, ServerMessage};
use parlor_protocol::types::ConnectionId;

use crate::registry::RoomRegistry;

/// How often the dispatch thread wakes up to check the shutdown flag when
/// no events are pending.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Events sent from listener/reader threads to the dispatch thread.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
    },
    MessageFrom {
        conn: ConnectionId,
        message: ClientMessage,
    },
    Disconnected {
        conn: ConnectionId,
    },
}

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the server to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a room server.
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Start the room server on a background thread. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used
/// to let the OS pick a free port).
pub fn start_server(config: ServerConfig) -> std::io::Result<(ServerHandle, std::net::SocketAddr)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_server(listener, keep_running_clone);
    });

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Dispatch loop. Runs until `keep_running` is set to false.
fn run_server(listener: TcpListener, keep_running: Arc<AtomicBool>) {
    let mut registry = RoomRegistry::new();

    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Set the listener to non-blocking so the accept thread can check
    // keep_running periodically.
    listener.set_nonblocking(true).ok();

    // Listener thread: accepts new connections.
    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).ok();
                    let _ = tx_listener.send(InternalEvent::NewConnection { stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(_) => break,
            }
        }
    });

    // Main event loop: one inbound event at a time, to completion.
    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(IDLE_POLL) {
            Ok(event) => {
                handle_event(&mut registry, event, &tx, &keep_running);
                // Drain any additional events that arrived during handling.
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut registry, event, &tx, &keep_running);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Dispatch a single event to the registry.
fn handle_event(
    registry: &mut RoomRegistry,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::NewConnection { stream } => {
            handle_new_connection(registry, stream, tx, keep_running);
        }
        InternalEvent::MessageFrom { conn, message } => {
            registry.handle_message(conn, message);
        }
        InternalEvent::Disconnected { conn } => {
            registry.leave(conn);
        }
    }
}

/// Handle a new TCP connection: read the Hello handshake, join the room,
/// and spawn a reader thread.
fn handle_new_connection(
    registry: &mut RoomRegistry,
    stream: TcpStream,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    // Set a read timeout so the handshake doesn't block forever.
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok();

    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });

    let hello_bytes = match read_message(&mut reader) {
        Ok(bytes) => bytes,
        Err(_) => return,
    };

    let hello: ClientMessage = match serde_json::from_slice(&hello_bytes) {
        Ok(msg) => msg,
        Err(_) => return,
    };

    match hello {
        ClientMessage::Hello {
            protocol_version: _,
            room,
            size,
        } => {
            // Clone the stream for the room's write half.
            let write_stream = match stream.try_clone() {
                Ok(s) => s,
                Err(_) => return,
            };

            let conn = registry.allocate_connection_id();
            match registry.join(room, size, conn, write_stream) {
                Ok(_role) => {
                    // Clear the read timeout for the long-lived reader loop.
                    stream.set_read_timeout(None).ok();

                    // Spawn a reader thread for this client.
                    let tx_reader = tx.clone();
                    let keep_running_reader = keep_running.clone();
                    thread::spawn(move || {
                        reader_loop(reader, conn, tx_reader, keep_running_reader);
                    });
                }
                Err(reason) => {
                    // Send Rejected and close the connection.
                    let rejected = ServerMessage::Rejected { reason };
                    if let Ok(json) = serde_json::to_vec(&rejected) {
                        let mut writer = std::io::BufWriter::new(stream);
                        let _ = write_message(&mut writer, &json);
                    }
                }
            }
        }
        _ => {
            // Expected Hello as the first message — drop the connection.
        }
    }
}

/// Reader loop for a single client. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    conn: ConnectionId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match read_message(&mut reader) {
            Ok(bytes) => match serde_json::from_slice::<ClientMessage>(&bytes) {
                Ok(ClientMessage::Goodbye) => {
                    let _ = tx.send(InternalEvent::Disconnected { conn });
                    break;
                }
                Ok(message) => {
                    let _ = tx.send(InternalEvent::MessageFrom { conn, message });
                }
                Err(err) => {
                    // Malformed input is discarded, not fatal: no state
                    // change, no broadcast, connection stays open.
                    eprintln!("Discarding malformed message from {conn:?}: {err}");
                }
            },
            Err(_) => {
                // Read error or EOF — treat as a normal disconnect.
                let _ = tx.send(InternalEvent::Disconnected { conn });
                break;
            }
        }
    }
}
