// Tic-tac-toe win/draw detection for arbitrary side length N.
//
// `evaluate()` scans the n rows, n columns, and two diagonals in that
// order; the first uniform non-empty line wins. A board has at most one
// winner under alternating play, but the evaluator itself does not enforce
// alternation — binding each connection to one symbol is the session
// layer's job (see `parlor_server::room`).
//
// `TicTacToe` is the mutable wrapper the session layer drives: placements
// into occupied cells, and placements after the game reached a winner or
// draw, are rejected whole (the board is untouched).

use crate::board::{Board, Cell, Mark};

/// Outcome of scanning a board: at most one winner, or a draw when no
/// empty cell remains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub winner: Option<Mark>,
    pub is_draw: bool,
}

/// Scan rows, columns, then the two diagonals for a uniform non-empty
/// line. Draw ⇔ the board is full and no line won.
pub fn evaluate(board: &Board) -> Evaluation {
    let n = board.size();
    let won = |mark| Evaluation {
        winner: Some(mark),
        is_draw: false,
    };
    for row in 0..n {
        if let Some(mark) = line_winner(board, (0..n).map(|col| row * n + col)) {
            return won(mark);
        }
    }
    for col in 0..n {
        if let Some(mark) = line_winner(board, (0..n).map(|row| row * n + col)) {
            return won(mark);
        }
    }
    if let Some(mark) = line_winner(board, (0..n).map(|i| i * n + i)) {
        return won(mark);
    }
    if let Some(mark) = line_winner(board, (0..n).map(|i| i * n + (n - 1 - i))) {
        return won(mark);
    }
    Evaluation {
        winner: None,
        is_draw: board.cells().iter().all(|cell| !cell.is_empty()),
    }
}

/// The mark winning a single line, if its first cell is a mark and every
/// other cell matches it.
fn line_winner<I: Iterator<Item = usize>>(board: &Board, mut line: I) -> Option<Mark> {
    let first = board.get(line.next()?).mark()?;
    line.all(|idx| board.get(idx).mark() == Some(first))
        .then_some(first)
}

/// One tic-tac-toe game on an N×N board.
#[derive(Clone, Debug)]
pub struct TicTacToe {
    board: Board,
}

impl TicTacToe {
    pub fn new(size: usize) -> Self {
        Self {
            board: Board::empty(size),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn evaluation(&self) -> Evaluation {
        evaluate(&self.board)
    }

    /// Place `mark` on `index`. Rejected (returning `false`, board
    /// untouched) when the index is out of bounds, the cell is occupied,
    /// or the game already ended.
    pub fn place(&mut self, index: usize, mark: Mark) -> bool {
        if index >= self.board.cells().len() || !self.board.get(index).is_empty() {
            return false;
        }
        let eval = self.evaluation();
        if eval.winner.is_some() || eval.is_draw {
            return false;
        }
        self.board.set(index, Cell::Mark(mark));
        true
    }

    /// Clear the board back to the start-of-game state.
    pub fn reset(&mut self) {
        self.board = Board::empty(self.board.size());
    }
}
