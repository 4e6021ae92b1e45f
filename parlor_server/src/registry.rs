// Room registry and per-connection session records.
//
// The registry is the single owned collection of rooms, scoped to the
// server process's lifetime. Rooms are created lazily on the first join to
// an unseen id and removed the instant their member set empties — no room
// persists with zero members, and a later join to the same id starts a
// fresh game.
//
// Each connection gets an explicit `SessionRecord { room, role }` looked
// up by `ConnectionId`; inbound messages are routed through it to the
// owning room. The registry is only ever touched from the server's single
// dispatch thread, so room creation and deletion are atomic with respect
// to every other message.

use std::net::TcpStream;

use rustc_hash::FxHashMap;

use parlor_protocol::message::ClientMessage;
use parlor_protocol::types::{ConnectionId, Role, RoomId};

use crate::room::Room;

/// Upper bound on the board dimension accepted at handshake. Guards the
/// `size²` cell allocation against hostile Hello frames.
pub const MAX_BOARD_SIZE: u32 = 32;

/// Where a connection lives and which seat it holds.
pub struct SessionRecord {
    pub room: RoomId,
    pub role: Role,
}

/// All rooms in the process, plus the connection→session map.
pub struct RoomRegistry {
    rooms: FxHashMap<RoomId, Room>,
    sessions: FxHashMap<ConnectionId, SessionRecord>,
    next_connection_id: u32,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: FxHashMap::default(),
            sessions: FxHashMap::default(),
            next_connection_id: 0,
        }
    }

    /// Allocate a process-unique connection ID. IDs increase
    /// monotonically, which makes a room's member order its join order.
    pub fn allocate_connection_id(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        id
    }

    /// Join `conn` to the room named by `room_id`, creating the room if
    /// this is the first join. The dimension is fixed by the creator;
    /// later joiners inherit it and their requested size is ignored.
    /// Returns the assigned seat, or a rejection reason.
    pub fn join(
        &mut self,
        room_id: RoomId,
        size: u32,
        conn: ConnectionId,
        stream: TcpStream,
    ) -> Result<Role, String> {
        if size == 0 {
            return Err("board size must be at least 1".into());
        }
        if size > MAX_BOARD_SIZE {
            return Err(format!("board size {size} exceeds maximum {MAX_BOARD_SIZE}"));
        }
        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            println!("Creating room {} with size {size}", room_id.0);
            Room::new(room_id.clone(), size as usize)
        });
        let role = room.add_member(conn, stream);
        self.sessions.insert(
            conn,
            SessionRecord {
                room: room_id,
                role,
            },
        );
        Ok(role)
    }

    /// Deregister a connection. Remaining members get a departure notice;
    /// an emptied room is deleted on the spot.
    pub fn leave(&mut self, conn: ConnectionId) {
        let Some(session) = self.sessions.remove(&conn) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&session.room) else {
            return;
        };
        room.remove_member(conn);
        if room.member_count() == 0 {
            self.rooms.remove(&session.room);
            println!("Room {} deleted (empty)", session.room.0);
        }
    }

    /// Route one in-room message from a registered connection. Unknown
    /// connections and handshake/teardown messages are ignored (those are
    /// handled at connection setup and in the reader loop).
    pub fn handle_message(&mut self, conn: ConnectionId, message: ClientMessage) {
        let Some(session) = self.sessions.get(&conn) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&session.room) else {
            return;
        };
        match message {
            ClientMessage::Move { from, to } => room.handle_move(conn, from as usize, to as usize),
            ClientMessage::Place { index } => room.handle_place(conn, index as usize),
            ClientMessage::Reset => room.handle_reset(conn),
            ClientMessage::Emote { emoji } => room.handle_emote(conn, emoji),
            ClientMessage::Hello { .. } | ClientMessage::Goodbye => {}
        }
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn session(&self, conn: ConnectionId) -> Option<&SessionRecord> {
        self.sessions.get(&conn)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
