//! Cascade state machine
//!
//! One accepted swap (or one auto-resolve pass) becomes a sequence of steps:
//!
//! ```text
//! Clear -> Gravity -> Refill -> Rescan --(runs)--> Clear ...
//!                                 \--(none)--> deadlock check -> Done
//! ```
//!
//! [`Cascade::advance`] performs exactly one visible step per call and hands it
//! back, so the session can wait for that step's animation before asking for
//! the next one. Steps with nothing to show (a gravity pass where nothing fell)
//! are skipped internally.

use crate::board::Fall;
use crate::engine::{ClearReport, MatchEngine, Spawn};
use crate::matcher::MatchSet;
use crate::types::CASCADE_LIMIT;

/// One visible step of a cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Tiles were removed and should be scored
    Cleared(ClearReport),
    /// Values migrated down
    Fell(Vec<Fall>),
    /// Empty slots got new values
    Refilled(Vec<Spawn>),
    /// The settled board had no move and was redistributed
    Reshuffled,
    /// Nothing left to do; further calls keep returning this
    Settled(CascadeSummary),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    /// Number of clear batches (1 = the swap's own match only)
    pub chains: u32,
    pub cleared: usize,
    pub golden: u32,
    pub refilled: usize,
    pub reshuffled: bool,
    /// The iteration cap stopped the loop with runs still on the board
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Clear(MatchSet),
    Gravity,
    Refill,
    Rescan,
    Done,
}

#[derive(Debug, Clone)]
pub struct Cascade {
    phase: Phase,
    summary: CascadeSummary,
}

impl Cascade {
    /// Start from the cells a swap matched; an empty set starts from a rescan
    pub fn new(matches: MatchSet) -> Self {
        let phase = if matches.is_empty() {
            Phase::Rescan
        } else {
            Phase::Clear(matches)
        };
        Self {
            phase,
            summary: CascadeSummary::default(),
        }
    }

    /// Current chain number (0 before the first clear)
    pub fn chain(&self) -> u32 {
        self.summary.chains
    }

    pub fn summary(&self) -> CascadeSummary {
        self.summary
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Run engine work until the next visible step
    pub fn advance(&mut self, engine: &mut MatchEngine) -> Step {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Clear(matches) => {
                    self.summary.chains += 1;
                    let report = engine.clear(&matches, self.summary.chains);
                    self.summary.cleared += report.len();
                    self.summary.golden += report.golden;
                    self.phase = Phase::Gravity;
                    return Step::Cleared(report);
                }
                Phase::Gravity => {
                    self.phase = Phase::Refill;
                    let falls = engine.apply_gravity();
                    if !falls.is_empty() {
                        return Step::Fell(falls);
                    }
                }
                Phase::Refill => {
                    self.phase = Phase::Rescan;
                    let spawns = engine.refill();
                    if !spawns.is_empty() {
                        self.summary.refilled += spawns.len();
                        return Step::Refilled(spawns);
                    }
                }
                Phase::Rescan => {
                    let matches = engine.scan_all();
                    if !matches.is_empty() {
                        if self.summary.chains < CASCADE_LIMIT {
                            self.phase = Phase::Clear(matches);
                            continue;
                        }
                        log::warn!(
                            "cascade stopped after {} chains with {} tiles still matched",
                            self.summary.chains,
                            matches.len()
                        );
                        self.summary.truncated = true;
                    }
                    if !engine.has_any_possible_move() {
                        log::debug!("board deadlocked after cascade, reshuffling");
                        engine.reshuffle();
                        self.summary.reshuffled = true;
                        return Step::Reshuffled;
                    }
                }
                Phase::Done => return Step::Settled(self.summary),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::GameConfig;
    use crate::types::{TilePos, TileValue};

    fn engine(rows: &[&[i8]]) -> MatchEngine {
        let board = Board::from_codes(rows).unwrap();
        let config = GameConfig {
            tile_type_count: 4,
            seed: 5,
            ..GameConfig::default()
        };
        MatchEngine::with_board(config, board).unwrap()
    }

    #[test]
    fn steps_follow_clear_gravity_refill() {
        let mut engine = engine(&[
            &[2, 3, 0, 1],
            &[1, 1, 1, 2],
            &[0, 3, 2, 3],
            &[2, 0, 3, 0],
        ]);
        let matches = engine.scan_all();
        let mut cascade = Cascade::new(matches);

        assert!(matches!(cascade.advance(&mut engine), Step::Cleared(r) if r.len() == 3));
        assert_eq!(cascade.chain(), 1);
        match cascade.advance(&mut engine) {
            Step::Fell(falls) => {
                assert_eq!(falls.len(), 3);
                assert!(falls.iter().all(|f| f.from.y == 0 && f.to.y == 1));
            }
            other => panic!("expected falls, got {:?}", other),
        }
        match cascade.advance(&mut engine) {
            Step::Refilled(spawns) => {
                assert_eq!(spawns.len(), 3);
                assert!(spawns.iter().all(|s| s.tile.pos.y == 0 && s.fall_distance == 1));
            }
            other => panic!("expected refill, got {:?}", other),
        }

        let mut last = cascade.advance(&mut engine);
        while !matches!(last, Step::Settled(_)) {
            last = cascade.advance(&mut engine);
        }
        assert!(cascade.is_done());
        assert_eq!(engine.board().empty_count(), 0);
        assert!(engine.scan_all().is_empty());
    }

    #[test]
    fn bottom_row_clear_drops_whole_column() {
        let mut engine = engine(&[&[0, 1, 2], &[3, 2, 0], &[1, 1, 1]]);
        let mut cascade = Cascade::new(engine.scan_all());
        cascade.advance(&mut engine);

        match cascade.advance(&mut engine) {
            Step::Fell(falls) => assert_eq!(falls.len(), 6),
            other => panic!("expected falls, got {:?}", other),
        }
        assert_eq!(engine.board().value(TilePos::new(0, 2)), TileValue::Normal(3));
        assert_eq!(engine.board().value(TilePos::new(0, 1)), TileValue::Normal(0));
        assert_eq!(engine.board().value(TilePos::new(0, 0)), TileValue::Empty);
    }

    #[test]
    fn empty_start_on_clean_board_settles_immediately() {
        let mut engine = engine(&[&[0, 0, 1], &[1, 2, 0], &[2, 1, 2]]);
        let before = engine.board().clone();
        let mut cascade = Cascade::new(MatchSet::new());

        assert!(matches!(cascade.advance(&mut engine), Step::Settled(s) if s.chains == 0));
        assert_eq!(engine.board(), &before);
    }

    #[test]
    fn deadlocked_board_is_reshuffled() {
        let mut engine = engine(&[
            &[0, 1, 2, 3],
            &[2, 3, 0, 1],
            &[0, 1, 2, 3],
            &[2, 3, 0, 1],
        ]);
        let mut cascade = Cascade::new(MatchSet::new());

        assert_eq!(cascade.advance(&mut engine), Step::Reshuffled);
        assert!(cascade.summary().reshuffled);
        assert!(matches!(cascade.advance(&mut engine), Step::Settled(_)));
    }
}
