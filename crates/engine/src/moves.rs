use crate::core::matcher::{collect_matches_at, swap_creates_match, MatchSet, SwappedView, ValueView};
use crate::core::Board;
use crate::types::{Direction, TilePos};

/// A swap that would create at least one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub a: TilePos,
    pub b: TilePos,
    /// Cells the first clear would remove
    pub cleared: usize,
    /// Goldens among them
    pub golden: usize,
}

fn evaluate(board: &Board, a: TilePos, b: TilePos) -> Move {
    let view = SwappedView::new(board, a, b);
    let mut matches = MatchSet::new();
    collect_matches_at(&view, a, &mut matches);
    collect_matches_at(&view, b, &mut matches);
    let golden = matches
        .iter()
        .filter(|&&p| view.value_at(p).is_golden())
        .count();
    Move {
        a,
        b,
        cleared: matches.len(),
        golden,
    }
}

/// Every productive swap, each pair listed once, in row-major order
pub fn find_moves(board: &Board) -> Vec<Move> {
    let mut out = Vec::new();
    for a in board.positions() {
        for dir in [Direction::Right, Direction::Down] {
            let Some(b) = a.step(dir, board.width(), board.height()) else {
                continue;
            };
            if swap_creates_match(board, a, b) {
                out.push(evaluate(board, a, b));
            }
        }
    }
    out
}

/// The move clearing the most cells, goldens breaking ties; earliest wins a full tie
pub fn best_move(board: &Board) -> Option<Move> {
    find_moves(board).into_iter().fold(None, |best, m| match best {
        Some(b) if (b.cleared, b.golden) >= (m.cleared, m.golden) => Some(b),
        _ => Some(m),
    })
}
