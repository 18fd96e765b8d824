//! Match engine - the only mutator of the board
//!
//! Builds boards, validates and executes swaps, clears matches, applies gravity,
//! refills, detects deadlocks and reshuffles. Every visible mutation is recorded
//! as a [`GameEvent`] in an outbox the owner drains with [`MatchEngine::take_events`].
//!
//! The engine knows nothing about animation pacing. Multi-step resolution is
//! driven through [`Cascade`](crate::cascade::Cascade); [`MatchEngine::resolve`]
//! runs one to completion for headless callers.

use crate::board::{Board, Fall};
use crate::cascade::{Cascade, Step};
use crate::config::{ConfigError, GameConfig, InitPolicy};
use crate::matcher::{self, MatchSet};
use crate::rng::SimpleRng;
use crate::types::{
    golden_cap, GameEvent, Tile, TilePos, TileValue, GOLDEN_ATTEMPTS_PER_CELL,
    GOLDEN_NEIGHBOR_CAP, RESHUFFLE_LIMIT,
};

/// Result of a swap request at the engine level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The two cells do not share an edge; nothing changed
    NotAdjacent,
    /// The swap formed no run and was reverted
    Rejected,
    /// The swap is committed; these cells must be resolved
    Matched(MatchSet),
}

/// Tiles removed by one clear, with their values from before the clear
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub tiles: Vec<Tile>,
    pub golden: u32,
    pub ordinary: u32,
    pub chain: u32,
}

impl ClearReport {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// A refilled slot and how far its new value drops in from above the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub tile: Tile,
    pub fall_distance: u8,
}

/// Totals for one fully resolved cascade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub batches: Vec<ClearReport>,
    pub refilled: usize,
    pub reshuffled: bool,
}

impl CascadeReport {
    pub fn cleared(&self) -> usize {
        self.batches.iter().map(ClearReport::len).sum()
    }
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    config: GameConfig,
    board: Board,
    rng: SimpleRng,
    outbox: Vec<GameEvent>,
}

impl MatchEngine {
    /// Validate `config` and build a fresh board from its seed
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Build from a config the caller has already validated
    pub(crate) fn from_validated(config: GameConfig) -> Self {
        let mut engine = Self {
            board: Board::new(config.width(), config.height()),
            rng: SimpleRng::new(config.seed),
            config,
            outbox: Vec::new(),
        };
        engine.create_board();
        engine
    }

    /// Wrap an existing board (fixtures, restored games)
    ///
    /// The board is used as-is: no runs are removed and no deadlock is fixed.
    /// `config.size` is overwritten with the board's dimensions.
    pub fn with_board(mut config: GameConfig, board: Board) -> Result<Self, ConfigError> {
        config.size.width = board.width();
        config.size.height = board.height();
        config.validate()?;
        Ok(Self {
            rng: SimpleRng::new(config.seed),
            config,
            board,
            outbox: Vec::new(),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current RNG state, used to seed the next episode
    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    /// Drain recorded events in emission order
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ============== Construction ==============

    /// (Re)build the whole board
    ///
    /// Even type distribution, shuffled; then goldens; then accidental runs are
    /// removed according to the configured [`InitPolicy`]. Intermediate events
    /// are dropped: observers only see the final `BoardCreated`.
    pub fn create_board(&mut self) {
        self.fill_even_distribution();
        let placed = self.place_golden_tiles();

        match self.config.init_policy {
            InitPolicy::RejectAndReshuffle => {
                if !self.reshuffle_until_settled(RESHUFFLE_LIMIT) {
                    log::warn!(
                        "no clean board after {} reshuffles, resolving leftover runs",
                        RESHUFFLE_LIMIT
                    );
                    self.auto_resolve();
                }
            }
            InitPolicy::AutoResolve => self.auto_resolve(),
        }

        self.outbox.clear();
        log::info!(
            "board created: {}x{}, {} types, {} golden, level {}",
            self.board.width(),
            self.board.height(),
            self.config.tile_type_count,
            placed,
            self.config.difficulty_level
        );
        self.outbox.push(GameEvent::BoardCreated {
            tiles: self.board.tiles().to_vec(),
        });
    }

    /// Each type appears `total / types` times, the first `total % types` types once more
    fn fill_even_distribution(&mut self) {
        let total = self.board.len();
        let types = self.config.tile_type_count as usize;
        let mut values: Vec<TileValue> = (0..total)
            .map(|i| {
                let per_type = total / types;
                let remainder = total % types;
                // First `remainder` types get `per_type + 1` slots each.
                let boundary = remainder * (per_type + 1);
                let k = if i < boundary {
                    i / (per_type + 1)
                } else {
                    remainder + (i - boundary) / per_type.max(1)
                };
                TileValue::Normal(k as u8)
            })
            .collect();
        self.rng.shuffle(&mut values);
        self.board = Board::from_values(self.board.width(), self.board.height(), &values);
    }

    /// Scatter goldens; returns how many were placed
    fn place_golden_tiles(&mut self) -> usize {
        let (w, h) = (self.board.width(), self.board.height());
        let target = (self.config.max_golden as usize).min(golden_cap(w, h));
        if target == 0 {
            return 0;
        }

        let max_attempts = self.board.len() * GOLDEN_ATTEMPTS_PER_CELL;
        let mut placed = 0;
        let mut attempts = 0;
        while attempts < max_attempts && placed < target {
            attempts += 1;
            let pos = TilePos::new(
                self.rng.next_range(w as u32) as u8,
                self.rng.next_range(h as u32) as u8,
            );
            if self.board.value(pos).is_golden() || !self.can_place_golden_at(pos) {
                continue;
            }
            let previous = self.board.set(pos, TileValue::Golden);
            if !matcher::matches_at(&self.board, pos).is_empty() {
                self.board.set(pos, previous);
                continue;
            }
            placed += 1;
        }

        if placed < target {
            log::info!(
                "placed {} of {} golden tiles after {} attempts",
                placed,
                target,
                attempts
            );
        }
        placed
    }

    /// Fewer than `GOLDEN_NEIGHBOR_CAP` goldens in the 8-neighbourhood
    fn can_place_golden_at(&self, pos: TilePos) -> bool {
        self.board
            .neighbors8(pos)
            .iter()
            .filter(|&&n| self.board.value(n).is_golden())
            .count()
            < GOLDEN_NEIGHBOR_CAP
    }

    /// Run one cascade over whatever runs exist, with no scoring
    fn auto_resolve(&mut self) {
        let report = self.resolve(MatchSet::new());
        if !report.batches.is_empty() {
            log::debug!(
                "auto-resolved {} tiles in {} batches",
                report.cleared(),
                report.batches.len()
            );
        }
    }

    // ============== Queries ==============

    pub fn matches_at(&self, pos: TilePos) -> MatchSet {
        assert!(self.board.contains(pos), "position {:?} outside board", pos);
        matcher::matches_at(&self.board, pos)
    }

    pub fn scan_all(&self) -> MatchSet {
        matcher::scan_all(&self.board)
    }

    pub fn has_any_possible_move(&self) -> bool {
        matcher::has_any_possible_move(&self.board)
    }

    /// First swap that would create a run, in row-major probe order
    pub fn find_move(&self) -> Option<(TilePos, TilePos)> {
        matcher::first_possible_move(&self.board)
    }

    /// No runs on the board and at least one move available
    pub fn is_settled(&self) -> bool {
        !matcher::has_any_match(&self.board) && self.has_any_possible_move()
    }

    // ============== Swaps ==============

    /// Validate and execute a swap without resolving it
    ///
    /// Out-of-bounds positions are a contract violation and panic.
    pub fn swap(&mut self, a: TilePos, b: TilePos) -> SwapOutcome {
        assert!(
            self.board.contains(a) && self.board.contains(b),
            "swap {:?} <-> {:?} outside board",
            a,
            b
        );
        if !a.is_adjacent(b) {
            return SwapOutcome::NotAdjacent;
        }

        self.board.swap_values(a, b);
        let mut matches = MatchSet::new();
        matcher::collect_matches_at(&self.board, a, &mut matches);
        matcher::collect_matches_at(&self.board, b, &mut matches);

        if matches.is_empty() {
            self.board.swap_values(a, b);
            self.outbox.push(GameEvent::SwapRejected {
                a: *self.board.tile(a),
                b: *self.board.tile(b),
            });
            return SwapOutcome::Rejected;
        }

        self.outbox.push(GameEvent::Swapped {
            a: *self.board.tile(a),
            b: *self.board.tile(b),
        });
        SwapOutcome::Matched(matches)
    }

    /// Swap and, on success, resolve the full cascade immediately
    pub fn attempt_swap(&mut self, a: TilePos, b: TilePos) -> bool {
        match self.swap(a, b) {
            SwapOutcome::Matched(matches) => {
                self.resolve(matches);
                true
            }
            SwapOutcome::NotAdjacent | SwapOutcome::Rejected => false,
        }
    }

    /// Drive a cascade from `matches` to completion with no animation pacing
    ///
    /// An empty `matches` starts from a full-board rescan.
    pub fn resolve(&mut self, matches: MatchSet) -> CascadeReport {
        let mut cascade = Cascade::new(matches);
        let mut report = CascadeReport::default();
        loop {
            match cascade.advance(self) {
                Step::Cleared(clear) => report.batches.push(clear),
                Step::Fell(_) => {}
                Step::Refilled(spawns) => report.refilled += spawns.len(),
                Step::Reshuffled => report.reshuffled = true,
                Step::Settled(_) => return report,
            }
        }
    }

    // ============== Pipeline steps ==============

    /// Mark every cell in `matches` empty and report what was there
    pub fn clear(&mut self, matches: &MatchSet, chain: u32) -> ClearReport {
        let mut report = ClearReport {
            chain,
            ..ClearReport::default()
        };
        for &pos in matches {
            let value = self.board.value(pos);
            match value {
                TileValue::Empty => continue,
                TileValue::Golden => report.golden += 1,
                TileValue::Normal(_) => report.ordinary += 1,
            }
            report.tiles.push(Tile::new(pos, value));
            self.board.set(pos, TileValue::Empty);
        }

        self.outbox.push(GameEvent::Matched {
            tiles: report.tiles.clone(),
            golden: report.golden,
            ordinary: report.ordinary,
            chain,
        });
        report
    }

    /// Compact every column so empties rise to the top
    pub fn apply_gravity(&mut self) -> Vec<Fall> {
        let mut falls = Vec::new();
        for x in 0..self.board.width() {
            falls.extend(self.board.compact_column(x));
        }
        for fall in &falls {
            self.outbox.push(GameEvent::TileFell {
                from: fall.from,
                to: fall.to,
                value: fall.value,
            });
        }
        falls
    }

    /// Give every empty slot a fresh ordinary value; goldens are never spawned here
    ///
    /// Expects gravity to have run, so empties sit at the top of their column.
    pub fn refill(&mut self) -> Vec<Spawn> {
        let types = self.config.tile_type_count as u32;
        let mut spawns = Vec::new();
        for x in 0..self.board.width() {
            let fall_distance = self.board.empty_in_column(x);
            if fall_distance == 0 {
                continue;
            }
            for y in 0..self.board.height() {
                let pos = TilePos::new(x, y);
                if !self.board.value(pos).is_empty() {
                    continue;
                }
                let value = TileValue::Normal(self.rng.next_range(types) as u8);
                self.board.set(pos, value);
                spawns.push(Spawn {
                    tile: Tile::new(pos, value),
                    fall_distance,
                });
            }
        }
        for spawn in &spawns {
            self.outbox.push(GameEvent::TileMaterialized {
                tile: spawn.tile,
                fall_distance: spawn.fall_distance,
            });
        }
        spawns
    }

    // ============== Reshuffling ==============

    fn normal_slots(&self) -> Vec<TilePos> {
        self.board
            .tiles()
            .iter()
            .filter(|t| t.value.is_normal())
            .map(|t| t.pos)
            .collect()
    }

    /// Permute ordinary values in place; goldens and empties stay put
    fn shuffle_normals(&mut self) {
        let slots = self.normal_slots();
        let mut values: Vec<TileValue> = slots.iter().map(|&p| self.board.value(p)).collect();
        self.rng.shuffle(&mut values);
        for (pos, value) in slots.into_iter().zip(values) {
            self.board.set(pos, value);
        }
    }

    /// Draw brand new ordinary values for every ordinary slot
    fn reroll_normals(&mut self) {
        let types = self.config.tile_type_count as u32;
        for pos in self.normal_slots() {
            let value = TileValue::Normal(self.rng.next_range(types) as u8);
            self.board.set(pos, value);
        }
    }

    /// Break remaining runs by exchanging run cells with ordinary cells elsewhere
    ///
    /// An exchange is kept only when neither cell ends up in a run, so every
    /// accepted exchange strictly shrinks the set of matched cells. Value counts
    /// are preserved. Gives up when some run cell has no valid partner.
    fn break_runs(&mut self) {
        let slots = self.normal_slots();
        if slots.is_empty() {
            return;
        }
        for _ in 0..self.board.len() {
            let runs = matcher::scan_all(&self.board);
            let Some(&p) = runs.iter().find(|&&p| self.board.value(p).is_normal()) else {
                return;
            };
            let start = self.rng.next_range(slots.len() as u32) as usize;
            let mut fixed = false;
            for i in 0..slots.len() {
                let q = slots[(start + i) % slots.len()];
                if self.board.value(q) == self.board.value(p) {
                    continue;
                }
                self.board.swap_values(p, q);
                if matcher::matches_at(&self.board, p).is_empty()
                    && matcher::matches_at(&self.board, q).is_empty()
                {
                    fixed = true;
                    break;
                }
                self.board.swap_values(p, q);
            }
            if !fixed {
                log::debug!("no exchange breaks the run at {:?}", p);
                return;
            }
        }
    }

    /// Shuffle-and-repair until settled, at most `limit` times; true once settled
    fn reshuffle_until_settled(&mut self, limit: u32) -> bool {
        for attempt in 0..limit {
            if self.is_settled() {
                if attempt > 0 {
                    log::debug!("board settled after {} reshuffles", attempt);
                }
                return true;
            }
            self.shuffle_normals();
            self.break_runs();
        }
        self.is_settled()
    }

    /// Redistribute ordinary values until there is no run and a move exists
    ///
    /// Tries permutations first (tile counts are preserved), then fresh values.
    /// If both budgets run out the board is accepted as it stands.
    pub fn reshuffle(&mut self) -> bool {
        let mut settled = false;
        for _ in 0..RESHUFFLE_LIMIT {
            self.shuffle_normals();
            self.break_runs();
            if self.is_settled() {
                settled = true;
                break;
            }
        }
        if !settled {
            log::warn!(
                "no playable permutation in {} reshuffles, rerolling values",
                RESHUFFLE_LIMIT
            );
            for _ in 0..RESHUFFLE_LIMIT {
                self.reroll_normals();
                self.break_runs();
                if self.is_settled() {
                    settled = true;
                    break;
                }
            }
        }
        if !settled {
            log::warn!("reshuffle budget exhausted, accepting board as-is");
        }

        self.outbox.push(GameEvent::Reshuffled {
            tiles: self.board.tiles().to_vec(),
        });
        settled
    }
}
