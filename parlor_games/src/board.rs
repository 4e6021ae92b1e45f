// Flat-indexed game board shared by tic-tac-toe and chess.
//
// The board is stored as a flat `Vec<Cell>` indexed by
// `idx = row * size + col`, giving O(1) read/write access. Out-of-bounds
// reads return `Empty`; out-of-bounds writes are no-ops.
//
// Chess orientation: White's back rank is row 0 (indices 0..8) and White
// advances toward higher rows, so White's king starts on index 4 and the
// double push from index 12 lands on 28, skipping 20. Black mirrors this
// from row 7 downward.
//
// `with_move()` is the pure "apply move" operation: it produces a new board
// without mutating the source, which lets the chess engine simulate a move
// on a scratch board when filtering out self-check. It carries the three
// side effects a relocation can have — en-passant pawn removal, the
// castling rook shift, and auto-queen promotion — so speculative and real
// application share one code path.

use serde::{Deserialize, Serialize};

/// The two chess sides. Also doubles as the seat order for role
/// assignment (first seat plays White).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a forward pawn step: White advances toward higher
    /// rows, Black toward lower ones.
    pub fn forward(self) -> isize {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

/// Chess piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// A colored chess piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }
}

/// Tic-tac-toe symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

/// One board square: empty, a tic-tac-toe mark, or a chess piece.
/// Two-character wire codes like `"wP"` exist only at the protocol
/// boundary — inside the engine a cell is always this tagged variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Mark(Mark),
    Piece(Piece),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    pub fn piece(self) -> Option<Piece> {
        match self {
            Cell::Piece(piece) => Some(piece),
            _ => None,
        }
    }

    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Mark(mark) => Some(mark),
            _ => None,
        }
    }
}

/// Square game board with flat storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    /// Flat storage: index = row * size + col.
    cells: Vec<Cell>,
    size: usize,
}

impl Board {
    /// Create an all-empty board of the given side length.
    pub fn empty(size: usize) -> Self {
        Self {
            cells: vec![Cell::Empty; size * size],
            size,
        }
    }

    /// The standard chess opening position. White occupies rows 0 and 1.
    pub fn chess_start() -> Self {
        use PieceKind::{Bishop, King, Knight, Pawn, Queen, Rook};
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut board = Board::empty(8);
        for (col, &kind) in back_rank.iter().enumerate() {
            board.set(col, Cell::Piece(Piece::new(Color::White, kind)));
            board.set(8 + col, Cell::Piece(Piece::new(Color::White, Pawn)));
            board.set(6 * 8 + col, Cell::Piece(Piece::new(Color::Black, Pawn)));
            board.set(7 * 8 + col, Cell::Piece(Piece::new(Color::Black, kind)));
        }
        board
    }

    /// Side length of the board.
    pub fn size(&self) -> usize {
        self.size
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Convert (row, col) to a flat index.
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    /// Convert a flat index to (row, col).
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx / self.size, idx % self.size)
    }

    /// Read a cell. Returns `Empty` for out-of-bounds indices.
    pub fn get(&self, idx: usize) -> Cell {
        self.cells.get(idx).copied().unwrap_or(Cell::Empty)
    }

    /// Write a cell. No-op for out-of-bounds indices.
    pub fn set(&mut self, idx: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(idx) {
            *slot = cell;
        }
    }

    /// Pure move application: returns a new board with the piece on `from`
    /// relocated to `to`, leaving `self` untouched. Handles the en-passant
    /// pawn removal (when `to` is the vacant en-passant target), the
    /// castling rook shift (when a king moves two columns), and auto-queen
    /// promotion on the farthest rank. Non-piece sources yield a plain copy.
    pub fn with_move(&self, from: usize, to: usize, en_passant_target: Option<usize>) -> Board {
        let mut next = self.clone();
        let Cell::Piece(mut piece) = self.get(from) else {
            return next;
        };
        let (from_row, from_col) = self.coords(from);
        let (to_row, to_col) = self.coords(to);
        next.set(from, Cell::Empty);

        // En passant: a pawn landing diagonally on the vacant target square
        // also removes the enemy pawn one rank behind the destination.
        if piece.kind == PieceKind::Pawn
            && from_col != to_col
            && self.get(to).is_empty()
            && en_passant_target == Some(to)
        {
            let behind_row = (to_row as isize - piece.color.forward()) as usize;
            next.set(self.index(behind_row, to_col), Cell::Empty);
        }

        // Castling: a king moving two columns drags the corner rook onto
        // the square the king crossed.
        if piece.kind == PieceKind::King && from_col.abs_diff(to_col) == 2 {
            let (corner_col, rook_col) = if to_col > from_col {
                (self.size - 1, to_col - 1)
            } else {
                (0, to_col + 1)
            };
            let corner = self.index(from_row, corner_col);
            let rook = self.get(corner);
            next.set(corner, Cell::Empty);
            next.set(self.index(from_row, rook_col), rook);
        }

        // Auto-queen promotion; no underpromotion choice is offered.
        if piece.kind == PieceKind::Pawn && to_row == promotion_row(piece.color, self.size) {
            piece.kind = PieceKind::Queen;
        }

        next.set(to, Cell::Piece(piece));
        next
    }
}

/// The farthest rank for a pawn of the given color.
fn promotion_row(color: Color, size: usize) -> usize {
    match color {
        Color::White => size - 1,
        Color::Black => 0,
    }
}
