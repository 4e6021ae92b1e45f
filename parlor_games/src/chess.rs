// Chess rules engine: per-piece legality, check detection, and the
// per-game state machine (turn, castling rights, en passant, draw rules).
//
// The engine is split into two layers:
//
// - **Structural layer** — `attacks_square()` answers "does the piece on
//   `from` reach `target` by its movement pattern alone?" with no
//   self-check filtering and no castling. `is_in_check()` is built on it:
//   a color is in check iff any enemy piece attacks its king's square.
//   Keeping this layer non-recursive removes the classic recursion hazard
//   of probing "is the king attacked?" from inside the legality check.
// - **Legality layer** — `is_legal_move()` adds ownership and destination
//   rules, castling, en passant, and the self-check filter: the move is
//   simulated on a scratch board (`Board::with_move`) and rejected if the
//   mover's own king would be attacked afterward.
//
// `ChessGame` owns the mutable state. `try_move()` either applies a move
// fully — board update, castling-rights bookkeeping, en-passant window,
// half-move clock, position history, turn flip, terminal evaluation — or
// rejects it leaving every field untouched. Out-of-turn input never
// reaches this type; the session layer filters it by sender color.
//
// Draw rules: stalemate; threefold repetition over raw board snapshots
// (side-to-move, castling rights, and en-passant availability are ignored
// in the comparison — a documented simplification); and the fifty-move
// rule at 100 half-moves without a pawn move or capture.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, Color, Piece, PieceKind};

/// Draw at 100 half-moves (50 full moves) without a pawn move or capture.
pub const HALF_MOVE_LIMIT: u32 = 100;

/// Why a finished game is a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
}

/// Terminal status of a game. `Checkmate` names the winning color — the
/// side that delivered the mate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ongoing,
    Checkmate { winner: Color },
    Draw(DrawReason),
}

/// The castling/en-passant context `is_legal_move` needs beyond the board:
/// which squares a piece has ever departed from, and the at-most-one
/// square currently capturable en passant.
pub struct MoveContext<'a> {
    pub moved: &'a FxHashSet<usize>,
    pub en_passant_target: Option<usize>,
}

/// One chess game. All mutation goes through `try_move` and `reset`.
#[derive(Clone, Debug)]
pub struct ChessGame {
    board: Board,
    turn: Color,
    /// Board indices a piece has ever departed from; consulted only for
    /// castling eligibility.
    moved: FxHashSet<usize>,
    en_passant_target: Option<usize>,
    half_move_clock: u32,
    /// One full-board snapshot per completed ply, for repetition detection.
    history: Vec<Vec<Cell>>,
    status: Status,
    in_check: Option<Color>,
}

impl ChessGame {
    pub fn new() -> Self {
        Self {
            board: Board::chess_start(),
            turn: Color::White,
            moved: FxHashSet::default(),
            en_passant_target: None,
            half_move_clock: 0,
            history: Vec::new(),
            status: Status::Ongoing,
            in_check: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The color currently in check, for UI feedback only. `None` once the
    /// game has ended.
    pub fn in_check(&self) -> Option<Color> {
        self.in_check
    }

    pub fn en_passant_target(&self) -> Option<usize> {
        self.en_passant_target
    }

    pub fn half_move_clock(&self) -> u32 {
        self.half_move_clock
    }

    /// Back to the start-of-game state. Membership and roles live in the
    /// session layer and are unaffected.
    pub fn reset(&mut self) {
        *self = ChessGame::new();
    }

    /// Validate and apply one move for the side to move. Returns `false`
    /// — with every field untouched — when the game is over or the move
    /// is illegal.
    pub fn try_move(&mut self, from: usize, to: usize) -> bool {
        if self.status != Status::Ongoing {
            return false;
        }
        let ctx = MoveContext {
            moved: &self.moved,
            en_passant_target: self.en_passant_target,
        };
        if !is_legal_move(&self.board, from, to, self.turn, &ctx) {
            return false;
        }
        self.apply(from, to);
        true
    }

    /// Apply an already-validated move.
    fn apply(&mut self, from: usize, to: usize) {
        let mover = self.turn;
        let Cell::Piece(piece) = self.board.get(from) else {
            return;
        };
        let (from_row, from_col) = self.board.coords(from);
        let (to_row, to_col) = self.board.coords(to);
        let is_pawn = piece.kind == PieceKind::Pawn;
        let is_en_passant = is_pawn
            && from_col != to_col
            && self.board.get(to).is_empty()
            && self.en_passant_target == Some(to);
        let is_capture = !self.board.get(to).is_empty() || is_en_passant;

        // Castling drags the rook; its origin square counts as departed.
        if piece.kind == PieceKind::King && from_col.abs_diff(to_col) == 2 {
            let corner_col = if to_col > from_col {
                self.board.size() - 1
            } else {
                0
            };
            self.moved.insert(self.board.index(from_row, corner_col));
        }

        self.board = self.board.with_move(from, to, self.en_passant_target);
        self.moved.insert(from);

        // A double pawn push opens the skipped square to en passant for
        // exactly one reply; any other move closes the window.
        self.en_passant_target = if is_pawn && from_row.abs_diff(to_row) == 2 {
            Some(self.board.index((from_row + to_row) / 2, from_col))
        } else {
            None
        };

        if is_pawn || is_capture {
            self.half_move_clock = 0;
        } else {
            self.half_move_clock += 1;
        }
        self.history.push(self.board.cells().to_vec());
        self.turn = mover.opponent();

        self.status = self.evaluate_status(mover);
        self.in_check = match self.status {
            Status::Ongoing if is_in_check(&self.board, self.turn) => Some(self.turn),
            _ => None,
        };
    }

    /// Terminal evaluation for the side now to move: no legal reply means
    /// checkmate (in check) or stalemate; otherwise the draw rules run.
    fn evaluate_status(&self, mover: Color) -> Status {
        let defender = self.turn;
        let ctx = MoveContext {
            moved: &self.moved,
            en_passant_target: self.en_passant_target,
        };
        if !has_any_legal_move(&self.board, defender, &ctx) {
            return if is_in_check(&self.board, defender) {
                Status::Checkmate { winner: mover }
            } else {
                Status::Draw(DrawReason::Stalemate)
            };
        }
        let repetitions = self
            .history
            .iter()
            .filter(|snapshot| snapshot.as_slice() == self.board.cells())
            .count();
        if repetitions >= 3 {
            return Status::Draw(DrawReason::ThreefoldRepetition);
        }
        if self.half_move_clock >= HALF_MOVE_LIMIT {
            return Status::Draw(DrawReason::FiftyMoveRule);
        }
        Status::Ongoing
    }
}

impl Default for ChessGame {
    fn default() -> Self {
        Self::new()
    }
}

/// Full legality: ownership and destination rules, the piece's movement
/// pattern (including castling and en passant), and the self-check filter.
pub fn is_legal_move(
    board: &Board,
    from: usize,
    to: usize,
    color: Color,
    ctx: &MoveContext<'_>,
) -> bool {
    let len = board.cells().len();
    if from >= len || to >= len || from == to {
        return false;
    }
    let Cell::Piece(piece) = board.get(from) else {
        return false;
    };
    if piece.color != color {
        return false;
    }
    match board.get(to) {
        Cell::Piece(target) if target.color == color => return false,
        // A king is never a capture target: applying such a move would
        // break the one-king-per-color invariant, so it is rejected here
        // rather than ever reaching the board.
        Cell::Piece(target) if target.kind == PieceKind::King => return false,
        Cell::Mark(_) => return false,
        _ => {}
    }
    if !structurally_legal(board, piece, from, to, ctx) {
        return false;
    }
    // No move may leave or place the mover's own king in check.
    let scratch = board.with_move(from, to, ctx.en_passant_target);
    !is_in_check(&scratch, color)
}

/// Movement-pattern check for a piece already known to sit on `from` with
/// a capturable (or empty) destination.
fn structurally_legal(
    board: &Board,
    piece: Piece,
    from: usize,
    to: usize,
    ctx: &MoveContext<'_>,
) -> bool {
    let (from_row, from_col) = board.coords(from);
    let (to_row, to_col) = board.coords(to);
    let dr = to_row as isize - from_row as isize;
    let dc = to_col as isize - from_col as isize;
    match piece.kind {
        PieceKind::Pawn => pawn_move_legal(board, piece.color, from, to, ctx),
        PieceKind::Knight => {
            (dr.abs() == 2 && dc.abs() == 1) || (dr.abs() == 1 && dc.abs() == 2)
        }
        PieceKind::Bishop => dr.abs() == dc.abs() && path_clear(board, from, to),
        PieceKind::Rook => (dr == 0 || dc == 0) && path_clear(board, from, to),
        PieceKind::Queen => {
            (dr == 0 || dc == 0 || dr.abs() == dc.abs()) && path_clear(board, from, to)
        }
        PieceKind::King => {
            if dr.abs() <= 1 && dc.abs() <= 1 {
                true
            } else if dr == 0 && dc.abs() == 2 {
                castling_legal(board, piece.color, from, to, ctx)
            } else {
                false
            }
        }
    }
}

/// Pawn movement: single push into an empty square, double push from the
/// starting rank over two empty squares, or a diagonal capture — onto an
/// enemy piece, or onto the vacant en-passant target.
fn pawn_move_legal(
    board: &Board,
    color: Color,
    from: usize,
    to: usize,
    ctx: &MoveContext<'_>,
) -> bool {
    let (from_row, from_col) = board.coords(from);
    let (to_row, to_col) = board.coords(to);
    let dr = to_row as isize - from_row as isize;
    let dc = to_col as isize - from_col as isize;
    let dir = color.forward();

    if dc == 0 {
        if dr == dir {
            return board.get(to).is_empty();
        }
        if dr == 2 * dir && from_row == pawn_start_row(color, board.size()) {
            let skipped = board.index((from_row as isize + dir) as usize, from_col);
            return board.get(skipped).is_empty() && board.get(to).is_empty();
        }
        return false;
    }
    if dc.abs() == 1 && dr == dir {
        return match board.get(to) {
            Cell::Piece(target) => target.color != color,
            Cell::Empty => ctx.en_passant_target == Some(to),
            Cell::Mark(_) => false,
        };
    }
    false
}

/// The rank a pawn of this color double-pushes from.
fn pawn_start_row(color: Color, size: usize) -> usize {
    match color {
        Color::White => 1,
        Color::Black => size - 2,
    }
}

/// Castling: the king slides two columns toward an unmoved corner rook.
/// Every square strictly between them must be empty, the king must not
/// currently be in check, and the square it crosses must not be attacked.
/// (The destination square is covered by the self-check simulation.)
fn castling_legal(
    board: &Board,
    color: Color,
    from: usize,
    to: usize,
    ctx: &MoveContext<'_>,
) -> bool {
    let size = board.size();
    let home_row = match color {
        Color::White => 0,
        Color::Black => size - 1,
    };
    let king_home = board.index(home_row, 4);
    if from != king_home || ctx.moved.contains(&from) {
        return false;
    }
    let (_, from_col) = board.coords(from);
    let (_, to_col) = board.coords(to);
    let kingside = to_col > from_col;
    let corner = board.index(home_row, if kingside { size - 1 } else { 0 });
    match board.get(corner) {
        Cell::Piece(rook) if rook.kind == PieceKind::Rook && rook.color == color => {}
        _ => return false,
    }
    if ctx.moved.contains(&corner) {
        return false;
    }
    let (lo, hi) = if kingside {
        (from + 1, corner)
    } else {
        (corner + 1, from)
    };
    if (lo..hi).any(|idx| !board.get(idx).is_empty()) {
        return false;
    }
    if square_attacked(board, from, color.opponent()) {
        return false;
    }
    let crossed = if kingside { from + 1 } else { from - 1 };
    !square_attacked(board, crossed, color.opponent())
}

/// Structural attack test: does the piece on `from` reach `target` by its
/// movement pattern alone? Pawns attack their forward diagonals only, and
/// the king's attack set is its one-square step set (castling can never
/// land on an occupied square, so it contributes no attacks). No
/// self-check filtering — this is the non-recursive primitive that check
/// detection is built on.
pub fn attacks_square(board: &Board, from: usize, target: usize) -> bool {
    if from == target {
        return false;
    }
    let Cell::Piece(piece) = board.get(from) else {
        return false;
    };
    let (from_row, from_col) = board.coords(from);
    let (to_row, to_col) = board.coords(target);
    let dr = to_row as isize - from_row as isize;
    let dc = to_col as isize - from_col as isize;
    match piece.kind {
        PieceKind::Pawn => dr == piece.color.forward() && dc.abs() == 1,
        PieceKind::Knight => {
            (dr.abs() == 2 && dc.abs() == 1) || (dr.abs() == 1 && dc.abs() == 2)
        }
        PieceKind::Bishop => dr.abs() == dc.abs() && path_clear(board, from, target),
        PieceKind::Rook => (dr == 0 || dc == 0) && path_clear(board, from, target),
        PieceKind::Queen => {
            (dr == 0 || dc == 0 || dr.abs() == dc.abs()) && path_clear(board, from, target)
        }
        PieceKind::King => dr.abs() <= 1 && dc.abs() <= 1,
    }
}

/// True if any piece of `by` attacks `target`.
pub fn square_attacked(board: &Board, target: usize, by: Color) -> bool {
    (0..board.cells().len()).any(|from| {
        matches!(board.get(from), Cell::Piece(piece) if piece.color == by)
            && attacks_square(board, from, target)
    })
}

/// Locate the king of `color`.
pub fn find_king(board: &Board, color: Color) -> Option<usize> {
    (0..board.cells().len()).find(|&idx| {
        matches!(
            board.get(idx),
            Cell::Piece(piece) if piece.color == color && piece.kind == PieceKind::King
        )
    })
}

/// A color is in check iff any enemy piece attacks its king's square.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    find_king(board, color)
        .is_some_and(|king| square_attacked(board, king, color.opponent()))
}

/// True iff some (from, to) pair passes the full legality check for
/// `color` — the mate/stalemate enumeration.
pub fn has_any_legal_move(board: &Board, color: Color, ctx: &MoveContext<'_>) -> bool {
    let len = board.cells().len();
    (0..len).any(|from| {
        matches!(board.get(from), Cell::Piece(piece) if piece.color == color)
            && (0..len).any(|to| is_legal_move(board, from, to, color, ctx))
    })
}

/// Every intermediate square on the straight or diagonal line from `from`
/// to `to` (exclusive on both ends) is empty.
fn path_clear(board: &Board, from: usize, to: usize) -> bool {
    let (from_row, from_col) = board.coords(from);
    let (to_row, to_col) = board.coords(to);
    let dr = (to_row as isize - from_row as isize).signum();
    let dc = (to_col as isize - from_col as isize).signum();
    let mut row = from_row as isize + dr;
    let mut col = from_col as isize + dc;
    while (row, col) != (to_row as isize, to_col as isize) {
        if !board.get(board.index(row as usize, col as usize)).is_empty() {
            return false;
        }
        row += dr;
        col += dc;
    }
    true
}
