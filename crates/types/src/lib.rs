//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, rendering collaborators, the JSON adapter).
//!
//! # Board Geometry
//!
//! - Coordinates are `(x, y)` with `x` growing to the right and `y` growing downward.
//! - Row `0` is the top of the board; gravity pulls values toward `height - 1`.
//! - The default level board is 7 columns by 10 rows.
//!
//! # Tuning Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MIN_RUN` | 3 | Shortest run that clears |
//! | `TICK_MS` | 1000 | Session timer step |
//! | `RESHUFFLE_LIMIT` | 100 | Reshuffles tried before accepting a board |
//! | `CASCADE_LIMIT` | 1000 | Safety net on chain reactions per swap |
//! | `GOLDEN_NEIGHBOR_CAP` | 2 | Goldens allowed around a new golden (exclusive) |
//!
//! # Examples
//!
//! ```
//! use tile_match_types::{Direction, TilePos, TileValue};
//!
//! let pos = TilePos::new(2, 3);
//! assert_eq!(pos.step(Direction::Left, 7, 10), Some(TilePos::new(1, 3)));
//! assert_eq!(TilePos::new(0, 0).step(Direction::Up, 7, 10), None);
//!
//! assert!(TileValue::Normal(2).matches(TileValue::Normal(2)));
//! assert!(!TileValue::Empty.matches(TileValue::Empty));
//! assert_eq!(TileValue::from_code(9), Some(TileValue::Golden));
//! ```

/// Default board width in cells (7 columns)
pub const DEFAULT_BOARD_WIDTH: u8 = 7;

/// Default board height in cells (10 rows)
pub const DEFAULT_BOARD_HEIGHT: u8 = 10;

/// Smallest board side that can hold a run
pub const MIN_BOARD_SIDE: u8 = 3;

/// Largest supported board side
pub const MAX_BOARD_SIDE: u8 = 16;

/// Shortest run of identical values that clears
pub const MIN_RUN: usize = 3;

/// Fewest ordinary tile types a level may use
pub const MIN_TILE_TYPES: u8 = 3;

/// Most ordinary tile types a level may use (codes stay below `GOLDEN_CODE`)
pub const MAX_TILE_TYPES: u8 = 8;

/// Ordinary tile types used when a level does not say otherwise
pub const DEFAULT_TILE_TYPES: u8 = 5;

/// Golden density cap as a fraction of the board: 1/5 (20%)
pub const GOLDEN_DENSITY_NUMERATOR: usize = 1;
pub const GOLDEN_DENSITY_DENOMINATOR: usize = 5;

/// A golden tile is not placed once this many goldens surround the slot
pub const GOLDEN_NEIGHBOR_CAP: usize = 2;

/// Golden placement tries per board cell
pub const GOLDEN_ATTEMPTS_PER_CELL: usize = 2;

/// Reshuffle attempts before a board is accepted as-is
pub const RESHUFFLE_LIMIT: u32 = 100;

/// Chain-reaction iterations before the cascade is cut off
pub const CASCADE_LIMIT: u32 = 1000;

/// Session timer step in milliseconds (one elapsed second per step)
pub const TICK_MS: u32 = 1000;

/// Integer code of the empty sentinel in snapshots and the adapter protocol
pub const EMPTY_CODE: i8 = -1;

/// Integer code of the golden tile in snapshots and the adapter protocol
pub const GOLDEN_CODE: i8 = 9;

/// Golden cap for a `width x height` board: `floor(0.2 * width * height)`
pub fn golden_cap(width: u8, height: u8) -> usize {
    (width as usize * height as usize) * GOLDEN_DENSITY_NUMERATOR / GOLDEN_DENSITY_DENOMINATOR
}


/// Cell coordinate on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePos {
    pub x: u8,
    pub y: u8,
}

impl TilePos {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Step one cell in `dir`, or `None` when that leaves a `width x height` board
    pub fn step(self, dir: Direction, width: u8, height: u8) -> Option<Self> {
        self.offset(dir.dx(), dir.dy(), width, height)
    }

    /// Offset by `(dx, dy)`, or `None` when that leaves a `width x height` board
    pub fn offset(self, dx: i8, dy: i8, width: u8, height: u8) -> Option<Self> {
        let x = self.x as i16 + dx as i16;
        let y = self.y as i16 + dy as i16;
        if x < 0 || y < 0 || x >= width as i16 || y >= height as i16 {
            return None;
        }
        Some(Self::new(x as u8, y as u8))
    }

    /// Manhattan distance between two cells
    pub fn manhattan(self, other: TilePos) -> u16 {
        (self.x as i16 - other.x as i16).unsigned_abs()
            + (self.y as i16 - other.y as i16).unsigned_abs()
    }

    /// True when the two cells share an edge
    pub fn is_adjacent(self, other: TilePos) -> bool {
        self.manhattan(other) == 1
    }
}

/// The four swap directions
///
/// Declaration order is the probe order used by move searches:
/// right, down, left, up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    pub fn dx(self) -> i8 {
        match self {
            Direction::Right => 1,
            Direction::Left => -1,
            Direction::Down | Direction::Up => 0,
        }
    }

    pub fn dy(self) -> i8 {
        match self {
            Direction::Down => 1,
            Direction::Up => -1,
            Direction::Right | Direction::Left => 0,
        }
    }

    /// Parse direction from string (case-insensitive)
    ///
    /// ```
    /// use tile_match_types::Direction;
    ///
    /// assert_eq!(Direction::from_str("LEFT"), Some(Direction::Left));
    /// assert_eq!(Direction::from_str("sideways"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "right" => Some(Direction::Right),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "up" => Some(Direction::Up),
            _ => None,
        }
    }
}

/// Value held by a board slot
///
/// `Empty` only exists between a clear and the refill that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileValue {
    #[default]
    Empty,
    /// Ordinary tile of type `0..tile_type_count`
    Normal(u8),
    /// Rare premium tile; matches other goldens like an ordinary type
    Golden,
}

impl TileValue {
    pub fn is_empty(self) -> bool {
        matches!(self, TileValue::Empty)
    }

    pub fn is_golden(self) -> bool {
        matches!(self, TileValue::Golden)
    }

    pub fn is_normal(self) -> bool {
        matches!(self, TileValue::Normal(_))
    }

    /// Two values form part of the same run. `Empty` never matches anything.
    pub fn matches(self, other: TileValue) -> bool {
        !self.is_empty() && self == other
    }

    /// Stable integer code: `-1` empty, `k` ordinary, `9` golden
    pub fn code(self) -> i8 {
        match self {
            TileValue::Empty => EMPTY_CODE,
            TileValue::Normal(k) => k as i8,
            TileValue::Golden => GOLDEN_CODE,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            EMPTY_CODE => Some(TileValue::Empty),
            GOLDEN_CODE => Some(TileValue::Golden),
            k if (0..MAX_TILE_TYPES as i8).contains(&k) => Some(TileValue::Normal(k as u8)),
            _ => None,
        }
    }
}

/// A board slot: fixed position plus current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub pos: TilePos,
    pub value: TileValue,
}

impl Tile {
    pub const fn new(pos: TilePos, value: TileValue) -> Self {
        Self { pos, value }
    }
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    /// Constructed, `init()` not called yet (or torn down)
    #[default]
    Stopped,
    /// Accepting swaps
    Playing,
    /// Resolving a swap; swaps are ignored
    Matching,
    /// Terminal; the session must be restarted to play again
    Over,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Stopped => "stopped",
            SessionStatus::Playing => "playing",
            SessionStatus::Matching => "matching",
            SessionStatus::Over => "over",
        }
    }
}

/// Outbound notifications pushed to every session subscriber
///
/// Each event is a data-only payload; subscribers never block the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The board has been built and is ready to draw
    BoardCreated { tiles: Vec<Tile> },
    /// A swap was committed; values are already exchanged
    Swapped { a: Tile, b: Tile },
    /// A swap produced no run and was reverted
    SwapRejected { a: Tile, b: Tile },
    /// A batch of tiles was cleared. `tiles` carry their values from before the clear.
    Matched {
        tiles: Vec<Tile>,
        golden: u32,
        ordinary: u32,
        chain: u32,
    },
    /// Gravity moved `value` from `from` down to `to`
    TileFell {
        from: TilePos,
        to: TilePos,
        value: TileValue,
    },
    /// An empty slot received a fresh value from above the board
    TileMaterialized { tile: Tile, fall_distance: u8 },
    /// Normal values were redistributed to escape a deadlock or leftover run
    Reshuffled { tiles: Vec<Tile> },
    ScoreChanged { score: u32, delta: u32 },
    StatusChanged { status: SessionStatus },
    TimeTick { elapsed: u32, is_over: bool },
    SessionOver { is_win: bool },
}

impl GameEvent {
    /// Short machine name, also used as the adapter's `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::BoardCreated { .. } => "board_created",
            GameEvent::Swapped { .. } => "swapped",
            GameEvent::SwapRejected { .. } => "swap_rejected",
            GameEvent::Matched { .. } => "matched",
            GameEvent::TileFell { .. } => "tile_fell",
            GameEvent::TileMaterialized { .. } => "tile_materialized",
            GameEvent::Reshuffled { .. } => "reshuffled",
            GameEvent::ScoreChanged { .. } => "score_changed",
            GameEvent::StatusChanged { .. } => "status_changed",
            GameEvent::TimeTick { .. } => "time_tick",
            GameEvent::SessionOver { .. } => "session_over",
        }
    }
}

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn step_respects_bounds() {
        let corner = TilePos::new(6, 9);
        assert_eq!(corner.step(Direction::Right, 7, 10), None);
        assert_eq!(corner.step(Direction::Down, 7, 10), None);
        assert_eq!(corner.step(Direction::Left, 7, 10), Some(TilePos::new(5, 9)));
        assert_eq!(corner.step(Direction::Up, 7, 10), Some(TilePos::new(6, 8)));
    }

    #[test]
    fn adjacency_is_manhattan_one() {
        let p = TilePos::new(3, 3);
        assert!(p.is_adjacent(TilePos::new(3, 4)));
        assert!(p.is_adjacent(TilePos::new(2, 3)));
        assert!(!p.is_adjacent(TilePos::new(4, 4)));
        assert!(!p.is_adjacent(p));
        assert!(!p.is_adjacent(TilePos::new(5, 3)));
    }

    #[test]
    fn golden_matches_golden_only() {
        assert!(TileValue::Golden.matches(TileValue::Golden));
        assert!(!TileValue::Golden.matches(TileValue::Normal(0)));
        assert!(!TileValue::Normal(1).matches(TileValue::Normal(2)));
    }

    #[test]
    fn codes_are_stable() {
        for value in [
            TileValue::Empty,
            TileValue::Normal(0),
            TileValue::Normal(7),
            TileValue::Golden,
        ] {
            assert_eq!(TileValue::from_code(value.code()), Some(value));
        }
        assert_eq!(TileValue::from_code(8), None);
        assert_eq!(TileValue::from_code(-2), None);
    }

    #[test]
    fn directions_are_unit_steps() {
        for dir in Direction::ALL {
            assert_eq!(dir.dx().abs() + dir.dy().abs(), 1);
        }
    }
}
