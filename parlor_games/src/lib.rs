// parlor_games — pure Rust game-rules library.
//
// This crate contains all game logic for the parlor room server: the shared
// board model, the N×N tic-tac-toe evaluator, and the chess rules engine
// with check detection and draw rules. It has zero transport dependencies
// and can be tested headless.
//
// Module overview:
// - `board.rs`:     Flat-indexed board shared by both games, cell/piece
//                   types, and the pure "apply move" operation used for
//                   speculative legality checks.
// - `tictactoe.rs`: Win/draw detection for arbitrary side length N, plus
//                   the mutable game wrapper the session layer drives.
// - `chess.rs`:     Per-piece legality, path clearing, check detection,
//                   castling / en passant / auto-queen promotion,
//                   checkmate / stalemate enumeration, repetition and
//                   fifty-move draw detection.
//
// The companion crate `parlor_server` owns rooms and membership and calls
// into this crate one inbound message at a time. That boundary is enforced
// at the compiler level — this crate cannot depend on sockets, threads, or
// message framing.
//
// **Critical constraint: the server is authoritative.** Every mutation goes
// through a legality check first; an illegal move is rejected whole and
// leaves the game state untouched. All checks are pure, bounded
// computations over a fixed-size board and complete synchronously.

pub mod board;
pub mod chess;
pub mod tictactoe;
