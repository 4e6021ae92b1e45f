// Protocol messages for client-server communication.
//
// Two enums define the full protocol vocabulary:
// - `ClientMessage`: sent by game clients to the server.
// - `StateSnapshot` / `ServerMessage`: sent by the server to clients.
//
// All types derive `Serialize`/`Deserialize` for JSON framing (see
// `framing.rs`). The handshake is `Hello` — it names the room and the
// board dimension (8 selects chess, any other positive value selects
// N×N tic-tac-toe; the dimension is fixed by whoever creates the room
// and later joiners inherit it).
//
// A `State` snapshot is the whole authoritative truth for a room: a
// client can always replace its local state with it wholesale. Boards
// travel as nullable two-character cell codes (see `codec.rs`); typed
// cells exist only inside the engine.

use serde::{Deserialize, Serialize};

use parlor_games::board::{Color, Mark};
use parlor_games::chess::DrawReason;

use crate::types::{Role, RoomId};

/// Messages sent by a client to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Join a room (handshake; must be the first frame on a connection).
    Hello {
        protocol_version: u32,
        room: RoomId,
        size: u32,
    },
    /// A chess move by board indices.
    Move { from: u32, to: u32 },
    /// A tic-tac-toe placement by cell index.
    Place { index: u32 },
    /// Reinitialize the room's game state (players only).
    Reset,
    /// Opaque emote payload, relayed verbatim to the whole room.
    Emote { emoji: String },
    /// Player is leaving gracefully.
    Goodbye,
}

/// Messages sent by the server to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Sent once per connection on join: the assigned seat and the color
    /// or mark it controls (`None`/`None` for observers).
    AssignRole {
        role: Role,
        color: Option<Color>,
        mark: Option<Mark>,
    },
    /// Full authoritative snapshot of the room's game.
    State(StateSnapshot),
    /// Emote relay; carries the sender's seat, mutates nothing.
    Emote { emoji: String, from: Role },
    /// Departure notice to remaining members, naming the freed seat.
    PlayerLeft { role: Role, message: String },
    /// Handshake rejected (bad board size, malformed Hello).
    Rejected { reason: String },
}

/// One complete room state: board, side to move, and terminal flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Nullable cell codes in row-major order ("wP", "bK", "X", ...).
    pub board: Vec<Option<String>>,
    /// Side to move. Constant for tic-tac-toe rooms, kept for protocol
    /// uniformity.
    pub turn: Color,
    pub winner: Option<Winner>,
    pub is_draw: bool,
    pub draw_reason: Option<DrawReason>,
    /// Color currently in check (chess only, UI feedback).
    pub in_check: Option<Color>,
}

/// Who won: a chess color or a tic-tac-toe mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Color(Color),
    Mark(Mark),
}
