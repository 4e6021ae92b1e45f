// Integration smoke test for the room server.
//
// Starts a server on localhost and drives it with plain TCP sockets using
// the protocol crate's framing and message types — no client helper
// involved. Exercises the full tic-tac-toe lifecycle: handshake, seat
// assignment, move broadcasting, win detection, emote relay, departure
// notices, and room teardown.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use parlor_games::board::Mark;
use parlor_protocol::framing::{read_message, write_message};
use parlor_protocol::message::{ClientMessage, ServerMessage, StateSnapshot, Winner};
use parlor_protocol::types::{Role, RoomId};
use parlor_server::server::{ServerConfig, start_server};

/// Helper: send a ClientMessage over a framed TCP stream.
fn send(writer: &mut BufWriter<TcpStream>, msg: &ClientMessage) {
    let json = serde_json::to_vec(msg).unwrap();
    write_message(writer, &json).unwrap();
}

/// Helper: receive a ServerMessage from a framed TCP stream.
fn recv(reader: &mut BufReader<TcpStream>) -> ServerMessage {
    let bytes = read_message(reader).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Connect to the server and perform the Hello handshake. Returns the
/// reader/writer pair and the assigned seat.
fn connect_and_hello(
    addr: std::net::SocketAddr,
    room: &str,
    size: u32,
) -> (BufReader<TcpStream>, BufWriter<TcpStream>, Role) {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let reader_stream = stream.try_clone().unwrap();
    let mut writer = BufWriter::new(stream);
    let mut reader = BufReader::new(reader_stream);

    send(
        &mut writer,
        &ClientMessage::Hello {
            protocol_version: 1,
            room: RoomId::new(room),
            size,
        },
    );

    let msg = recv(&mut reader);
    let role = match msg {
        ServerMessage::AssignRole { role, .. } => role,
        other => panic!("expected AssignRole, got {other:?}"),
    };

    (reader, writer, role)
}

/// Expect the next message to be a State and return it.
fn recv_state(reader: &mut BufReader<TcpStream>) -> StateSnapshot {
    match recv(reader) {
        ServerMessage::State(state) => state,
        other => panic!("expected State, got {other:?}"),
    }
}

/// Play X at 0, O at 1, X at 4, O at 2, X at 8 — a main-diagonal win for
/// player one. Returns the final snapshot.
fn play_diagonal_win(
    writer_a: &mut BufWriter<TcpStream>,
    reader_a: &mut BufReader<TcpStream>,
    writer_b: &mut BufWriter<TcpStream>,
    reader_b: &mut BufReader<TcpStream>,
) -> StateSnapshot {
    let mut last_state = None;
    for (first_player, index) in [(true, 0u32), (false, 1), (true, 4), (false, 2), (true, 8)] {
        let writer = if first_player { &mut *writer_a } else { &mut *writer_b };
        send(writer, &ClientMessage::Place { index });
        let state_a = recv_state(reader_a);
        let state_b = recv_state(reader_b);
        assert_eq!(state_a, state_b, "both members see the same snapshot");
        last_state = Some(state_a);
    }
    last_state.expect("at least one snapshot")
}

#[test]
fn tictactoe_room_lifecycle() {
    let (handle, addr) = start_server(ServerConfig { port: 0 }).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    // 1. Two clients join room "r1" with dimension 3 and take the seats.
    let (mut reader_a, mut writer_a, role_a) = connect_and_hello(addr, "r1", 3);
    assert_eq!(role_a, Role::PlayerOne);
    let state = recv_state(&mut reader_a);
    assert_eq!(state.board.len(), 9);
    assert!(state.board.iter().all(|cell| cell.is_none()));

    let (mut reader_b, mut writer_b, role_b) = connect_and_hello(addr, "r1", 3);
    assert_eq!(role_b, Role::PlayerTwo);
    let _ = recv_state(&mut reader_b);

    // 2. Alternating placements ending in a main-diagonal win for X.
    let final_state =
        play_diagonal_win(&mut writer_a, &mut reader_a, &mut writer_b, &mut reader_b);
    assert_eq!(final_state.winner, Some(Winner::Mark(Mark::X)));

    // 3. The game is over: further placements are silently discarded. The
    //    emote right after must be the next message anyone sees.
    send(&mut writer_b, &ClientMessage::Place { index: 3 });
    send(&mut writer_b, &ClientMessage::Emote { emoji: "🤷".into() });
    match recv(&mut reader_a) {
        ServerMessage::Emote { emoji, from } => {
            assert_eq!(emoji, "🤷");
            assert_eq!(from, Role::PlayerTwo);
        }
        other => panic!("expected Emote (placement must be discarded), got {other:?}"),
    }

    // 4. Player one leaves; player two is told which seat was freed.
    send(&mut writer_a, &ClientMessage::Goodbye);
    let mut saw_player_left = false;
    for _ in 0..3 {
        match recv(&mut reader_b) {
            ServerMessage::PlayerLeft { role, .. } => {
                assert_eq!(role, Role::PlayerOne);
                saw_player_left = true;
                break;
            }
            _ => continue,
        }
    }
    assert!(saw_player_left, "expected a PlayerLeft notice");

    // 5. Last member leaves; the room is destroyed. A rejoin under the
    //    same id starts from a fresh board, not the finished game.
    drop(writer_b);
    drop(reader_b);
    std::thread::sleep(Duration::from_millis(150));

    let (mut reader_c, _writer_c, role_c) = connect_and_hello(addr, "r1", 3);
    assert_eq!(role_c, Role::PlayerOne);
    let state = recv_state(&mut reader_c);
    assert!(
        state.board.iter().all(|cell| cell.is_none()),
        "rejoined room must start fresh, got {:?}",
        state.board
    );
    assert_eq!(state.winner, None);

    handle.stop();
}

#[test]
fn diagonal_win_is_reported_to_both_members() {
    let (handle, addr) = start_server(ServerConfig { port: 0 }).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let (mut reader_a, mut writer_a, _) = connect_and_hello(addr, "d1", 3);
    let _ = recv_state(&mut reader_a);
    let (mut reader_b, mut writer_b, _) = connect_and_hello(addr, "d1", 3);
    let _ = recv_state(&mut reader_b);

    let state = play_diagonal_win(&mut writer_a, &mut reader_a, &mut writer_b, &mut reader_b);
    assert_eq!(state.winner, Some(Winner::Mark(Mark::X)));
    assert!(!state.is_draw);
    assert_eq!(state.board[0].as_deref(), Some("X"));
    assert_eq!(state.board[4].as_deref(), Some("X"));
    assert_eq!(state.board[8].as_deref(), Some("X"));

    handle.stop();
}

#[test]
fn invalid_board_size_is_rejected() {
    let (handle, addr) = start_server(ServerConfig { port: 0 }).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let reader_stream = stream.try_clone().unwrap();
    let mut writer = BufWriter::new(stream);
    let mut reader = BufReader::new(reader_stream);

    send(
        &mut writer,
        &ClientMessage::Hello {
            protocol_version: 1,
            room: RoomId::new("zero"),
            size: 0,
        },
    );

    match recv(&mut reader) {
        ServerMessage::Rejected { reason } => {
            assert_eq!(reason, "board size must be at least 1");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    handle.stop();
}

#[test]
fn malformed_frames_are_discarded_without_dropping_the_connection() {
    let (handle, addr) = start_server(ServerConfig { port: 0 }).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let (mut reader_a, mut writer_a, _) = connect_and_hello(addr, "m1", 3);
    let _ = recv_state(&mut reader_a);

    // Garbage that parses as neither JSON nor any ClientMessage variant.
    write_message(&mut writer_a, b"not even json").unwrap();
    write_message(&mut writer_a, br#"{"Unknown":{}}"#).unwrap();

    // The connection must still be alive and the board untouched.
    send(&mut writer_a, &ClientMessage::Place { index: 4 });
    let state = recv_state(&mut reader_a);
    assert_eq!(state.board[4].as_deref(), Some("X"));
    assert_eq!(
        state.board.iter().filter(|cell| cell.is_some()).count(),
        1,
        "garbage frames must not have mutated the board"
    );

    handle.stop();
}
