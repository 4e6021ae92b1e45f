// Per-room session state.
//
// `Room` is the unit of isolation the registry hands messages to. It
// tracks the members of one game (seat assignment in join order), owns the
// game state, and broadcasts exactly one `State` snapshot per accepted
// event. All mutation happens through methods called from the server's
// single dispatch thread — no internal locking.
//
// Key responsibilities:
// - Seat assignment: the first two joiners take the active seats, later
//   joiners observe. The seat→color/mark binding is fixed: seat one plays
//   White/X, seat two plays Black/O.
// - Move handling: resolve the sender's seat to a color or mark, filter
//   out-of-turn and observer input, apply the move through the game
//   engine, and broadcast the new snapshot. Rejected input produces no
//   broadcast at all — an illegal move can never desync the room.
// - Emotes: relayed to every member with the sender's seat attached, no
//   board mutation. Observers may emote.
// - Departure notices: remaining members learn which seat was freed.
//
// Writing to client streams: `Room` holds `TcpStream` write halves wrapped
// in `BufWriter`. Write errors on a single client are swallowed — the
// reader thread for that client will detect the broken pipe and report the
// disconnect.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::TcpStream;

use parlor_games::board::{Color, Mark};
use parlor_games::chess::{ChessGame, Status};
use parlor_games::tictactoe::TicTacToe;
use parlor_protocol::codec;
use parlor_protocol::framing::write_message;
use parlor_protocol::message::{ServerMessage, StateSnapshot, Winner};
use parlor_protocol::types::{ConnectionId, Role, RoomId};

/// The game a room hosts: dimension 8 selects chess, anything else an
/// N×N tic-tac-toe board. Fixed for the room's whole lifetime.
enum GameState {
    Chess(ChessGame),
    TicTacToe(TicTacToe),
}

/// One room: an independent game instance plus its membership.
pub struct Room {
    pub id: RoomId,
    game: GameState,
    /// Keyed by connection ID; IDs are allocated monotonically, so
    /// iteration order is join order.
    members: BTreeMap<ConnectionId, MemberState>,
}

struct MemberState {
    role: Role,
    writer: BufWriter<TcpStream>,
}

impl Room {
    pub fn new(id: RoomId, size: usize) -> Self {
        let game = if size == 8 {
            GameState::Chess(ChessGame::new())
        } else {
            GameState::TicTacToe(TicTacToe::new(size))
        };
        Self {
            id,
            game,
            members: BTreeMap::new(),
        }
    }

    /// Register a connection, assign it the lowest free seat, and send it
    /// the seat assignment followed by the current snapshot.
    pub fn add_member(&mut self, conn: ConnectionId, stream: TcpStream) -> Role {
        let role = self.next_free_role();
        self.members.insert(
            conn,
            MemberState {
                role,
                writer: BufWriter::new(stream),
            },
        );
        let assign = ServerMessage::AssignRole {
            role,
            color: self.role_color(role),
            mark: self.role_mark(role),
        };
        self.send_to(conn, &assign);
        let state = ServerMessage::State(self.snapshot());
        self.send_to(conn, &state);
        role
    }

    /// Deregister a connection and notify the remaining members which
    /// seat was freed.
    pub fn remove_member(&mut self, conn: ConnectionId) {
        if let Some(member) = self.members.remove(&conn) {
            let msg = ServerMessage::PlayerLeft {
                role: member.role,
                message: format!("{} left the room", member.role.label()),
            };
            self.broadcast(&msg);
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member_role(&self, conn: ConnectionId) -> Option<Role> {
        self.members.get(&conn).map(|member| member.role)
    }

    /// A chess move from one member. Discarded without a broadcast when
    /// the sender holds no color, it is not their turn, or the move is
    /// illegal.
    pub fn handle_move(&mut self, conn: ConnectionId, from: usize, to: usize) {
        let Some(role) = self.member_role(conn) else {
            return;
        };
        let Some(color) = self.role_color(role) else {
            return;
        };
        let GameState::Chess(game) = &mut self.game else {
            return;
        };
        if game.turn() != color || !game.try_move(from, to) {
            return;
        }
        let state = ServerMessage::State(self.snapshot());
        self.broadcast(&state);
    }

    /// A tic-tac-toe placement from one member. Discarded without a
    /// broadcast when the sender holds no mark or the placement is
    /// rejected (occupied cell, finished game).
    pub fn handle_place(&mut self, conn: ConnectionId, index: usize) {
        let Some(role) = self.member_role(conn) else {
            return;
        };
        let Some(mark) = self.role_mark(role) else {
            return;
        };
        let GameState::TicTacToe(game) = &mut self.game else {
            return;
        };
        if !game.place(index, mark) {
            return;
        }
        let state = ServerMessage::State(self.snapshot());
        self.broadcast(&state);
    }

    /// Reinitialize the game. Observers are read-only and cannot reset.
    /// Membership and seat assignment are untouched.
    pub fn handle_reset(&mut self, conn: ConnectionId) {
        let Some(role) = self.member_role(conn) else {
            return;
        };
        if !role.is_player() {
            return;
        }
        match &mut self.game {
            GameState::Chess(game) => game.reset(),
            GameState::TicTacToe(game) => game.reset(),
        }
        let state = ServerMessage::State(self.snapshot());
        self.broadcast(&state);
    }

    /// Relay an emote to the whole room with the sender's seat attached.
    pub fn handle_emote(&mut self, conn: ConnectionId, emoji: String) {
        let Some(role) = self.member_role(conn) else {
            return;
        };
        let msg = ServerMessage::Emote { emoji, from: role };
        self.broadcast(&msg);
    }

    /// Build the full authoritative snapshot of this room's game.
    pub fn snapshot(&self) -> StateSnapshot {
        match &self.game {
            GameState::Chess(game) => {
                let (winner, is_draw, draw_reason) = match game.status() {
                    Status::Ongoing => (None, false, None),
                    Status::Checkmate { winner } => (Some(Winner::Color(winner)), false, None),
                    Status::Draw(reason) => (None, true, Some(reason)),
                };
                StateSnapshot {
                    board: codec::encode_board(game.board()),
                    turn: game.turn(),
                    winner,
                    is_draw,
                    draw_reason,
                    in_check: game.in_check(),
                }
            }
            GameState::TicTacToe(game) => {
                let eval = game.evaluation();
                StateSnapshot {
                    board: codec::encode_board(game.board()),
                    // Kept for protocol uniformity; tic-tac-toe rooms do
                    // not track a side to move.
                    turn: Color::White,
                    winner: eval.winner.map(Winner::Mark),
                    is_draw: eval.is_draw,
                    draw_reason: None,
                    in_check: None,
                }
            }
        }
    }

    /// Seat→color binding, chess rooms only.
    fn role_color(&self, role: Role) -> Option<Color> {
        match (&self.game, role) {
            (GameState::Chess(_), Role::PlayerOne) => Some(Color::White),
            (GameState::Chess(_), Role::PlayerTwo) => Some(Color::Black),
            _ => None,
        }
    }

    /// Seat→mark binding, tic-tac-toe rooms only.
    fn role_mark(&self, role: Role) -> Option<Mark> {
        match (&self.game, role) {
            (GameState::TicTacToe(_), Role::PlayerOne) => Some(Mark::X),
            (GameState::TicTacToe(_), Role::PlayerTwo) => Some(Mark::O),
            _ => None,
        }
    }

    /// The lowest seat no current member holds.
    fn next_free_role(&self) -> Role {
        let held = |role| self.members.values().any(|member| member.role == role);
        if !held(Role::PlayerOne) {
            Role::PlayerOne
        } else if !held(Role::PlayerTwo) {
            Role::PlayerTwo
        } else {
            Role::Observer
        }
    }

    /// Send a message to a specific member. Silently ignores write errors
    /// (the reader thread will detect the broken pipe).
    fn send_to(&mut self, conn: ConnectionId, msg: &ServerMessage) {
        if let Some(member) = self.members.get_mut(&conn) {
            let _ = send_message(&mut member.writer, msg);
        }
    }

    /// Broadcast a message to every current member.
    fn broadcast(&mut self, msg: &ServerMessage) {
        let ids: Vec<ConnectionId> = self.members.keys().copied().collect();
        for id in ids {
            self.send_to(id, msg);
        }
    }
}

/// Serialize a `ServerMessage` to JSON and write it with length-delimited
/// framing. Returns any I/O error (caller decides whether to log or drop).
fn send_message(
    writer: &mut BufWriter<TcpStream>,
    msg: &ServerMessage,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_vec(msg)?;
    write_message(writer, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;
    use std::net::TcpListener;

    use parlor_protocol::framing::read_message;

    use super::*;

    /// Create a TCP pair: (client_stream, server_stream) on localhost.
    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    /// Read a ServerMessage from a TCP stream.
    fn recv(reader: &mut BufReader<TcpStream>) -> ServerMessage {
        let bytes = read_message(reader).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Read and discard `n` messages.
    fn drain(reader: &mut BufReader<TcpStream>, n: usize) {
        for _ in 0..n {
            let _ = recv(reader);
        }
    }

    fn conn(id: u32) -> ConnectionId {
        ConnectionId(id)
    }

    #[test]
    fn seats_assigned_in_join_order() {
        let (client1, server1) = tcp_pair();
        let (_client2, server2) = tcp_pair();
        let (_client3, server3) = tcp_pair();
        let mut room = Room::new(RoomId::new("t"), 3);

        assert_eq!(room.add_member(conn(0), server1), Role::PlayerOne);
        assert_eq!(room.add_member(conn(1), server2), Role::PlayerTwo);
        assert_eq!(room.add_member(conn(2), server3), Role::Observer);
        assert_eq!(room.member_count(), 3);

        let mut reader1 = BufReader::new(client1);
        match recv(&mut reader1) {
            ServerMessage::AssignRole { role, color, mark } => {
                assert_eq!(role, Role::PlayerOne);
                assert_eq!(color, None);
                assert_eq!(mark, Some(Mark::X));
            }
            other => panic!("expected AssignRole, got {other:?}"),
        }
        match recv(&mut reader1) {
            ServerMessage::State(state) => {
                assert_eq!(state.board.len(), 9);
                assert!(state.board.iter().all(|cell| cell.is_none()));
                assert_eq!(state.winner, None);
                assert!(!state.is_draw);
            }
            other => panic!("expected State, got {other:?}"),
        }
    }

    #[test]
    fn chess_room_binds_colors_to_the_active_seats() {
        let (client1, server1) = tcp_pair();
        let (_client2, server2) = tcp_pair();
        let mut room = Room::new(RoomId::new("c"), 8);

        room.add_member(conn(0), server1);
        room.add_member(conn(1), server2);

        let mut reader1 = BufReader::new(client1);
        match recv(&mut reader1) {
            ServerMessage::AssignRole { role, color, mark } => {
                assert_eq!(role, Role::PlayerOne);
                assert_eq!(color, Some(Color::White));
                assert_eq!(mark, None);
            }
            other => panic!("expected AssignRole, got {other:?}"),
        }
        match recv(&mut reader1) {
            ServerMessage::State(state) => {
                assert_eq!(state.board[4].as_deref(), Some("wK"));
                assert_eq!(state.board[60].as_deref(), Some("bK"));
                assert_eq!(state.turn, Color::White);
            }
            other => panic!("expected State, got {other:?}"),
        }
    }

    #[test]
    fn a_freed_seat_goes_to_the_next_joiner() {
        let (_client1, server1) = tcp_pair();
        let (_client2, server2) = tcp_pair();
        let (_client3, server3) = tcp_pair();
        let mut room = Room::new(RoomId::new("t"), 3);

        room.add_member(conn(0), server1);
        room.add_member(conn(1), server2);
        room.remove_member(conn(0));
        assert_eq!(room.add_member(conn(2), server3), Role::PlayerOne);
    }

    #[test]
    fn accepted_placement_broadcasts_one_state_to_every_member() {
        let (client1, server1) = tcp_pair();
        let (client2, server2) = tcp_pair();
        let mut room = Room::new(RoomId::new("t"), 3);

        room.add_member(conn(0), server1);
        room.add_member(conn(1), server2);

        let mut reader1 = BufReader::new(client1);
        let mut reader2 = BufReader::new(client2);
        drain(&mut reader1, 2); // AssignRole + State
        drain(&mut reader2, 2);

        room.handle_place(conn(0), 4);

        for reader in [&mut reader1, &mut reader2] {
            match recv(reader) {
                ServerMessage::State(state) => {
                    assert_eq!(state.board[4].as_deref(), Some("X"));
                }
                other => panic!("expected State, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejected_placements_produce_no_broadcast() {
        let (client1, server1) = tcp_pair();
        let (_client2, server2) = tcp_pair();
        let (_client3, server3) = tcp_pair();
        let mut room = Room::new(RoomId::new("t"), 3);

        room.add_member(conn(0), server1);
        room.add_member(conn(1), server2);
        room.add_member(conn(2), server3);

        let mut reader1 = BufReader::new(client1);
        drain(&mut reader1, 2);

        room.handle_place(conn(0), 4);
        drain(&mut reader1, 1);

        // Occupied cell, observer placement, out-of-bounds index: all
        // silently discarded. The emote afterwards must be the very next
        // message each member sees.
        room.handle_place(conn(1), 4);
        room.handle_place(conn(2), 0);
        room.handle_place(conn(1), 99);
        room.handle_emote(conn(1), "👀".into());

        match recv(&mut reader1) {
            ServerMessage::Emote { emoji, from } => {
                assert_eq!(emoji, "👀");
                assert_eq!(from, Role::PlayerTwo);
            }
            other => panic!("expected Emote, got {other:?}"),
        }
    }

    #[test]
    fn out_of_turn_chess_moves_are_discarded() {
        let (client1, server1) = tcp_pair();
        let (_client2, server2) = tcp_pair();
        let mut room = Room::new(RoomId::new("c"), 8);

        room.add_member(conn(0), server1);
        room.add_member(conn(1), server2);

        let mut reader1 = BufReader::new(client1);
        drain(&mut reader1, 2);

        // Black may not open; a Place is the wrong message for a chess
        // room; then White's real move goes through.
        room.handle_move(conn(1), 52, 44);
        room.handle_place(conn(0), 4);
        room.handle_move(conn(0), 12, 28);

        match recv(&mut reader1) {
            ServerMessage::State(state) => {
                assert_eq!(state.board[12], None);
                assert_eq!(state.board[28].as_deref(), Some("wP"));
                assert_eq!(state.turn, Color::Black);
            }
            other => panic!("expected State, got {other:?}"),
        }
    }

    #[test]
    fn reset_requires_an_active_seat() {
        let (client1, server1) = tcp_pair();
        let (_client2, server2) = tcp_pair();
        let (_client3, server3) = tcp_pair();
        let mut room = Room::new(RoomId::new("t"), 3);

        room.add_member(conn(0), server1);
        room.add_member(conn(1), server2);
        room.add_member(conn(2), server3);

        let mut reader1 = BufReader::new(client1);
        drain(&mut reader1, 2);

        room.handle_place(conn(0), 4);
        drain(&mut reader1, 1);

        // Observer reset is discarded; the emote proves no broadcast
        // happened in between.
        room.handle_reset(conn(2));
        room.handle_emote(conn(0), "🙂".into());
        assert!(matches!(recv(&mut reader1), ServerMessage::Emote { .. }));

        // A player's reset clears the board for everyone.
        room.handle_reset(conn(1));
        match recv(&mut reader1) {
            ServerMessage::State(state) => {
                assert!(state.board.iter().all(|cell| cell.is_none()));
            }
            other => panic!("expected State, got {other:?}"),
        }
    }

    #[test]
    fn departure_notice_names_the_freed_seat() {
        let (client1, server1) = tcp_pair();
        let (_client2, server2) = tcp_pair();
        let mut room = Room::new(RoomId::new("t"), 3);

        room.add_member(conn(0), server1);
        room.add_member(conn(1), server2);

        let mut reader1 = BufReader::new(client1);
        drain(&mut reader1, 2);

        room.remove_member(conn(1));
        match recv(&mut reader1) {
            ServerMessage::PlayerLeft { role, message } => {
                assert_eq!(role, Role::PlayerTwo);
                assert_eq!(message, "player two left the room");
            }
            other => panic!("expected PlayerLeft, got {other:?}"),
        }
        assert_eq!(room.member_count(), 1);
    }
}
