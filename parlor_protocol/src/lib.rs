// parlor_protocol — wire protocol for the game-room server.
//
// This crate defines the message types, cell codec, and framing used by
// the room server (`parlor_server`) and game clients to communicate over
// TCP. It is shared between both sides and depends only on the game-rules
// crate for the value types that cross the wire.
//
// Module overview:
// - `types.rs`:   Core ID and role types — `ConnectionId`, `RoomId`, `Role`.
// - `message.rs`: Client-to-server and server-to-client message enums,
//                 plus the `StateSnapshot` every member receives after an
//                 accepted move or reset.
// - `codec.rs`:   Cell/board encoding — typed cells inside the engine,
//                 nullable two-character codes on the wire.
// - `framing.rs`: Length-delimited framing over any `Read`/`Write` stream:
//                 4-byte big-endian length prefix, then JSON payload.
//
// Design decisions:
// - **JSON serialization.** Human-inspectable on the wire and matches the
//   serde derives the game crate already carries. Binary framing can be
//   swapped in later if bandwidth matters.
// - **Snapshots, not deltas.** The server broadcasts the whole room state
//   after every accepted event; clients replace rather than patch, so a
//   missed frame can never desynchronize them.
// - **No async runtime.** Uses `std::io::Read`/`Write` for framing,
//   compatible with blocking TCP streams and buffered wrappers.

pub mod codec;
pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_MESSAGE_SIZE, read_message, write_message};
pub use message::{ClientMessage, ServerMessage, StateSnapshot, Winner};
pub use types::{ConnectionId, Role, RoomId};
