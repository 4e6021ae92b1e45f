// parlor_server — authoritative game-room server.
//
// Clients connect over TCP, name a room and a board dimension in their
// Hello handshake, and exchange moves against a shared board that the
// server validates and broadcasts. Dimension 8 selects chess; any other
// positive dimension selects N×N tic-tac-toe. The server is
// authoritative: illegal, out-of-turn, and observer input is silently
// discarded and can never desync a room.
//
// Module overview:
// - `room.rs`:     Per-room session state — seat assignment, move
//                  handling through the game engines, snapshot
//                  broadcasting, departure notices.
// - `registry.rs`: Room registry and per-connection session records.
//                  Rooms are created on first join and destroyed the
//                  instant they empty.
// - `server.rs`:   TCP listener, reader threads (one per client), and the
//                  dispatch loop. Uses `std::net` with a thread-per-reader
//                  architecture and an `mpsc` channel to funnel events
//                  into the single-threaded registry.
// - `client.rs`:   TCP client with the same framing, used by integration
//                  tests and embeddable in other processes.
//
// Dependencies: `parlor_protocol` (shared message types, codec, framing)
// and `parlor_games` (board model and rules engines).
//
// The server can run as a standalone binary (`main.rs`) or be embedded in
// another process via the library API (`start_server`).

pub mod client;
pub mod registry;
pub mod room;
pub mod server;

pub use server::start_server;
