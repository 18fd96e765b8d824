//! Run detection
//!
//! A run is three or more equal values contiguous along one row or column.
//! Everything here is read-only: detection works over a [`ValueView`], so the
//! same code answers "what matches now" on the [`Board`] and "what would match
//! after this swap" on a [`SwappedView`] without touching board state.

use std::collections::BTreeSet;

use crate::board::Board;
use crate::types::{Direction, TilePos, TileValue, MIN_RUN};

/// Deduplicated, position-ordered set of matched cells
pub type MatchSet = BTreeSet<TilePos>;

/// Read-only access to grid values
pub trait ValueView {
    fn width(&self) -> u8;
    fn height(&self) -> u8;
    fn value_at(&self, pos: TilePos) -> TileValue;
}

impl ValueView for Board {
    fn width(&self) -> u8 {
        Board::width(self)
    }

    fn height(&self) -> u8 {
        Board::height(self)
    }

    fn value_at(&self, pos: TilePos) -> TileValue {
        self.value(pos)
    }
}

/// The board as it would look with the values at `a` and `b` exchanged
#[derive(Debug, Clone, Copy)]
pub struct SwappedView<'a> {
    board: &'a Board,
    a: TilePos,
    b: TilePos,
}

impl<'a> SwappedView<'a> {
    pub fn new(board: &'a Board, a: TilePos, b: TilePos) -> Self {
        Self { board, a, b }
    }
}

impl ValueView for SwappedView<'_> {
    fn width(&self) -> u8 {
        self.board.width()
    }

    fn height(&self) -> u8 {
        self.board.height()
    }

    fn value_at(&self, pos: TilePos) -> TileValue {
        if pos == self.a {
            self.board.value(self.b)
        } else if pos == self.b {
            self.board.value(self.a)
        } else {
            self.board.value(pos)
        }
    }
}

/// Cells beyond `origin` in `dir` that hold a value matching `value`
fn run_length<V: ValueView>(view: &V, origin: TilePos, dir: Direction, value: TileValue) -> u8 {
    let (w, h) = (view.width(), view.height());
    let mut len = 0u8;
    let mut cur = origin;
    while let Some(next) = cur.step(dir, w, h) {
        if !view.value_at(next).matches(value) {
            break;
        }
        len += 1;
        cur = next;
    }
    len
}

/// Add the runs through `pos` to `out`; returns true when any run was found
pub fn collect_matches_at<V: ValueView>(view: &V, pos: TilePos, out: &mut MatchSet) -> bool {
    let value = view.value_at(pos);
    if value.is_empty() {
        return false;
    }

    let mut found = false;
    for (back, fwd) in [
        (Direction::Left, Direction::Right),
        (Direction::Up, Direction::Down),
    ] {
        let before = run_length(view, pos, back, value);
        let after = run_length(view, pos, fwd, value);
        if before as usize + after as usize + 1 < MIN_RUN {
            continue;
        }
        found = true;
        for i in 1..=before {
            out.insert(offset_by(pos, back, i));
        }
        for i in 1..=after {
            out.insert(offset_by(pos, fwd, i));
        }
    }
    if found {
        out.insert(pos);
    }
    found
}

#[inline]
fn offset_by(pos: TilePos, dir: Direction, steps: u8) -> TilePos {
    let x = pos.x as i16 + dir.dx() as i16 * steps as i16;
    let y = pos.y as i16 + dir.dy() as i16 * steps as i16;
    TilePos::new(x as u8, y as u8)
}

/// Every cell in a run through `pos`, including `pos` itself; empty when none
pub fn matches_at<V: ValueView>(view: &V, pos: TilePos) -> MatchSet {
    let mut out = MatchSet::new();
    collect_matches_at(view, pos, &mut out);
    out
}

/// Union of the runs on the whole board
///
/// Positions already covered by an earlier run are not rescanned.
pub fn scan_all<V: ValueView>(view: &V) -> MatchSet {
    let mut out = MatchSet::new();
    for y in 0..view.height() {
        for x in 0..view.width() {
            let pos = TilePos::new(x, y);
            if out.contains(&pos) {
                continue;
            }
            collect_matches_at(view, pos, &mut out);
        }
    }
    out
}

/// True when any run exists, stopping at the first one
pub fn has_any_match<V: ValueView>(view: &V) -> bool {
    let mut scratch = MatchSet::new();
    for y in 0..view.height() {
        for x in 0..view.width() {
            if collect_matches_at(view, TilePos::new(x, y), &mut scratch) {
                return true;
            }
        }
    }
    false
}

/// Would exchanging `a` and `b` create a run at either anchor?
pub fn swap_creates_match(board: &Board, a: TilePos, b: TilePos) -> bool {
    let view = SwappedView::new(board, a, b);
    let mut scratch = MatchSet::new();
    collect_matches_at(&view, a, &mut scratch) || collect_matches_at(&view, b, &mut scratch)
}

/// First swap (in row-major, right/down/left/up probe order) that would create a run
pub fn first_possible_move(board: &Board) -> Option<(TilePos, TilePos)> {
    for pos in board.positions() {
        for dir in Direction::ALL {
            let Some(other) = pos.step(dir, board.width(), board.height()) else {
                continue;
            };
            if swap_creates_match(board, pos, other) {
                return Some((pos, other));
            }
        }
    }
    None
}

/// True unless the board is deadlocked
pub fn has_any_possible_move(board: &Board) -> bool {
    first_possible_move(board).is_some()
}
