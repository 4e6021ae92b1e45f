// Core ID and role types for the room protocol.
//
// `ConnectionId` is a server-assigned compact integer identifying one
// client connection; `RoomId` is the opaque key clients choose to meet
// under — it is equality-compared and never otherwise interpreted. `Role`
// is a seat in a room, distinct from the color or mark it controls (the
// room decides that binding once, at creation).

use serde::{Deserialize, Serialize};

/// Server-assigned connection ID (compact u32, unique per process).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

/// Opaque room key chosen by clients.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// A seat in a room. The first two joiners take the active seats in join
/// order; everyone after them observes (read-only, emotes allowed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    PlayerOne,
    PlayerTwo,
    Observer,
}

impl Role {
    pub fn is_player(self) -> bool {
        !matches!(self, Role::Observer)
    }

    /// Human-readable seat name for departure notices.
    pub fn label(self) -> &'static str {
        match self {
            Role::PlayerOne => "player one",
            Role::PlayerTwo => "player two",
            Role::Observer => "an observer",
        }
    }
}
