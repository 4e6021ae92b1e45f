// Cell and board codec for the wire format.
//
// On the wire a board is an array of nullable short strings in row-major
// order: `null` for an empty square, `"X"`/`"O"` for tic-tac-toe marks,
// and a two-character code for chess pieces — color letter (`w`/`b`)
// followed by kind letter (`P N B R Q K`). The typed `Cell` variant exists
// only inside the engine; encoding and decoding happen exclusively at this
// boundary.

use parlor_games::board::{Board, Cell, Color, Mark, Piece, PieceKind};

/// Encode one cell as its wire code. `None` for an empty square.
pub fn encode_cell(cell: Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Mark(Mark::X) => Some("X".into()),
        Cell::Mark(Mark::O) => Some("O".into()),
        Cell::Piece(piece) => {
            let color = match piece.color {
                Color::White => 'w',
                Color::Black => 'b',
            };
            let kind = match piece.kind {
                PieceKind::Pawn => 'P',
                PieceKind::Knight => 'N',
                PieceKind::Bishop => 'B',
                PieceKind::Rook => 'R',
                PieceKind::Queen => 'Q',
                PieceKind::King => 'K',
            };
            Some(format!("{color}{kind}"))
        }
    }
}

/// Decode one wire code. `None` for anything that is not a valid code.
pub fn decode_cell(code: &str) -> Option<Cell> {
    match code {
        "X" => return Some(Cell::Mark(Mark::X)),
        "O" => return Some(Cell::Mark(Mark::O)),
        _ => {}
    }
    let mut chars = code.chars();
    let color = match chars.next()? {
        'w' => Color::White,
        'b' => Color::Black,
        _ => return None,
    };
    let kind = match chars.next()? {
        'P' => PieceKind::Pawn,
        'N' => PieceKind::Knight,
        'B' => PieceKind::Bishop,
        'R' => PieceKind::Rook,
        'Q' => PieceKind::Queen,
        'K' => PieceKind::King,
        _ => return None,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(Cell::Piece(Piece::new(color, kind)))
}

/// Encode a whole board in row-major order.
pub fn encode_board(board: &Board) -> Vec<Option<String>> {
    board.cells().iter().map(|&cell| encode_cell(cell)).collect()
}

/// Decode a board of the given side length. `None` if the cell count does
/// not match `size²` or any code is invalid.
pub fn decode_board(size: usize, cells: &[Option<String>]) -> Option<Board> {
    if cells.len() != size * size {
        return None;
    }
    let mut board = Board::empty(size);
    for (idx, code) in cells.iter().enumerate() {
        if let Some(code) = code {
            board.set(idx, decode_cell(code)?);
        }
    }
    Some(board)
}
