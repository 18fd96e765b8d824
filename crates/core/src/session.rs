//! Game session - lifecycle, score, timer and turn sequencing
//!
//! ```text
//! STOPPED --init--> PLAYING --accepted swap--> MATCHING --cascade settled--> PLAYING
//!                      |   \--rejected swap--> MATCHING --revert done-----> PLAYING
//!                      \--timer expired / target reached---------------------> OVER
//! ```
//!
//! While MATCHING, swap requests are ignored. A win or loss detected mid-cascade
//! is latched and applied once the cascade has settled, so the final board is
//! always stable when `SessionOver` is published.
//!
//! Pacing is driven from outside: the session asks its [`Animator`] to play each
//! step and only continues after [`GameSession::animation_finished`] has been
//! called for that batch. Timer advancement comes from [`GameSession::tick`].

use crate::animation::{AnimationJoin, AnimationKind, AnimationRequest, Animator, Headless, JoinState};
use crate::cascade::{Cascade, Step};
use crate::config::{ConfigError, GameConfig};
use crate::engine::{ClearReport, MatchEngine, SwapOutcome};
use crate::events::{EventBus, SubscriptionId};
use crate::snapshot::GameSnapshot;
use crate::types::{Direction, GameEvent, SessionStatus, TilePos, TICK_MS};
use crate::Board;

/// Work in flight while the session is MATCHING
#[derive(Debug)]
enum Turn {
    /// Rejected swap; finishes when its revert animation does
    Revert,
    Cascade(Cascade),
}

pub struct GameSession {
    config: GameConfig,
    /// Seed for the current episode's board
    seed: u32,
    engine: Option<MatchEngine>,
    animator: Box<dyn Animator>,
    bus: EventBus,
    status: SessionStatus,
    score: u32,
    /// Whole seconds elapsed
    elapsed: u32,
    /// Sub-second remainder carried between ticks
    tick_accum_ms: u32,
    timer_running: bool,
    /// Latched result: `Some(true)` win, `Some(false)` loss
    outcome: Option<bool>,
    turn: Option<Turn>,
    join: Option<AnimationJoin>,
    next_batch: u64,
    episode_id: u32,
    destroyed: bool,
}

impl GameSession {
    /// Validate `config` and create a STOPPED session
    pub fn new<A>(config: GameConfig, animator: A) -> Result<Self, ConfigError>
    where
        A: Animator + 'static,
    {
        config.validate()?;
        Ok(Self::build(config, None, Box::new(animator)))
    }

    /// Session whose animations complete instantly
    pub fn headless(config: GameConfig) -> Result<Self, ConfigError> {
        Self::new(config, Headless)
    }

    /// Session around a prepared engine (fixture boards, restored games)
    pub fn from_engine<A>(engine: MatchEngine, animator: A) -> Self
    where
        A: Animator + 'static,
    {
        let config = engine.config().clone();
        Self::build(config, Some(engine), Box::new(animator))
    }

    fn build(config: GameConfig, engine: Option<MatchEngine>, animator: Box<dyn Animator>) -> Self {
        Self {
            seed: config.seed,
            config,
            engine,
            animator,
            bus: EventBus::new(),
            status: SessionStatus::Stopped,
            score: 0,
            elapsed: 0,
            tick_accum_ms: 0,
            timer_running: false,
            outcome: None,
            turn: None,
            join: None,
            next_batch: 0,
            episode_id: 1,
            destroyed: false,
        }
    }

    // ============== Subscriptions ==============

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn publish(&mut self, event: GameEvent) {
        self.bus.publish(&event);
    }

    fn flush_engine_events(&mut self) {
        let events = match self.engine.as_mut() {
            Some(engine) => engine.take_events(),
            None => return,
        };
        for event in &events {
            self.bus.publish(event);
        }
    }

    // ============== Lifecycle ==============

    /// STOPPED -> PLAYING: build the board and start the timer
    ///
    /// Returns false (and does nothing) in any other state or after `destroy`.
    pub fn init(&mut self) -> bool {
        if self.destroyed || self.status != SessionStatus::Stopped {
            log::warn!("init ignored in status {}", self.status.as_str());
            return false;
        }

        let seed = self.seed;
        let engine = self.engine.get_or_insert_with(|| {
            MatchEngine::from_validated(GameConfig {
                seed,
                ..self.config.clone()
            })
        });
        engine.take_events();
        let tiles = engine.board().tiles().to_vec();

        log::info!(
            "session {} started: level {}, seed {}, target {}, time {}s",
            self.episode_id,
            self.config.difficulty_level,
            self.seed,
            self.config.target_score,
            self.config.total_time
        );
        self.publish(GameEvent::BoardCreated { tiles });
        self.timer_running = true;
        self.set_status(SessionStatus::Playing);
        true
    }

    /// Stop the timer and detach every subscriber; safe to call repeatedly
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.timer_running = false;
        self.turn = None;
        self.join = None;
        self.bus.clear();
        if self.status != SessionStatus::Over {
            self.status = SessionStatus::Stopped;
        }
        log::info!("session {} destroyed", self.episode_id);
    }

    /// Throw the current game away and start a new episode with the same config
    ///
    /// Subscribers are kept. The new board is seeded from the old RNG state.
    pub fn restart(&mut self) -> bool {
        if let Some(engine) = self.engine.take() {
            self.seed = engine.rng_state();
        }
        self.episode_id += 1;
        self.destroyed = false;
        self.score = 0;
        self.elapsed = 0;
        self.tick_accum_ms = 0;
        self.timer_running = false;
        self.outcome = None;
        self.turn = None;
        self.join = None;
        self.set_status(SessionStatus::Stopped);
        self.init()
    }

    fn set_status(&mut self, status: SessionStatus) {
        if self.status == status {
            return;
        }
        log::debug!("status {} -> {}", self.status.as_str(), status.as_str());
        self.status = status;
        self.publish(GameEvent::StatusChanged { status });
    }

    fn enter_over(&mut self, is_win: bool) {
        self.timer_running = false;
        self.set_status(SessionStatus::Over);
        log::info!(
            "session {} over: {} with score {} after {}s",
            self.episode_id,
            if is_win { "win" } else { "loss" },
            self.score,
            self.elapsed
        );
        self.publish(GameEvent::SessionOver { is_win });
    }

    /// Apply a latched outcome unless a turn is still resolving
    fn conclude_if_idle(&mut self) {
        if self.status != SessionStatus::Playing {
            return;
        }
        if let Some(is_win) = self.outcome {
            self.enter_over(is_win);
        }
    }

    // ============== Swaps ==============

    /// Forward a swap request to the engine
    ///
    /// Returns true when the swap was accepted and a cascade started. Requests
    /// outside PLAYING and non-adjacent pairs are ignored. Positions must be on
    /// the board.
    pub fn request_swap(&mut self, a: TilePos, b: TilePos) -> bool {
        if self.status != SessionStatus::Playing {
            log::debug!("swap ignored in status {}", self.status.as_str());
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };

        match engine.swap(a, b) {
            SwapOutcome::NotAdjacent => false,
            SwapOutcome::Rejected => {
                self.flush_engine_events();
                self.begin_turn(Turn::Revert, AnimationKind::Revert, vec![a, b]);
                false
            }
            SwapOutcome::Matched(matches) => {
                self.flush_engine_events();
                let cascade = Cascade::new(matches);
                self.begin_turn(Turn::Cascade(cascade), AnimationKind::Swap, vec![a, b]);
                true
            }
        }
    }

    /// Swap `pos` with its neighbour in `dir`; off-board neighbours are ignored
    pub fn swap_toward(&mut self, pos: TilePos, dir: Direction) -> bool {
        let Some(board) = self.board() else {
            return false;
        };
        if !board.contains(pos) {
            return false;
        }
        match pos.step(dir, board.width(), board.height()) {
            Some(other) => self.request_swap(pos, other),
            None => false,
        }
    }

    fn begin_turn(&mut self, turn: Turn, kind: AnimationKind, tiles: Vec<TilePos>) {
        self.set_status(SessionStatus::Matching);
        self.turn = Some(turn);
        self.start_animation(kind, tiles);
        self.pump();
    }

    fn finish_turn(&mut self) {
        self.turn = None;
        match self.outcome {
            Some(is_win) => self.enter_over(is_win),
            None => self.set_status(SessionStatus::Playing),
        }
    }

    fn start_animation(&mut self, kind: AnimationKind, tiles: Vec<TilePos>) {
        self.next_batch += 1;
        let request = AnimationRequest {
            batch: self.next_batch,
            kind,
            tiles,
        };
        let pending = self.animator.start(&request);
        if pending > 0 {
            self.join = Some(AnimationJoin::new(request.batch, pending));
        }
    }

    /// Completion signal from the animator for `batch`
    ///
    /// Signals for batches other than the one being waited on are ignored.
    pub fn animation_finished(&mut self, batch: u64) {
        let Some(join) = self.join.as_mut() else {
            log::debug!("completion for batch {} with nothing pending", batch);
            return;
        };
        if join.signal(batch) == JoinState::Complete {
            self.join = None;
            self.pump();
        }
    }

    /// Run the current turn until it needs to wait on an animation or is done
    fn pump(&mut self) {
        while self.join.is_none() {
            let Some(turn) = self.turn.take() else {
                return;
            };
            let mut cascade = match turn {
                Turn::Revert => {
                    self.finish_turn();
                    return;
                }
                Turn::Cascade(cascade) => cascade,
            };
            let Some(engine) = self.engine.as_mut() else {
                return;
            };

            let step = cascade.advance(engine);
            self.flush_engine_events();
            let (kind, tiles): (AnimationKind, Vec<TilePos>) = match step {
                Step::Cleared(report) => {
                    self.award(&report);
                    let tiles = report.tiles.iter().map(|t| t.pos).collect();
                    (AnimationKind::Clear, tiles)
                }
                Step::Fell(falls) => (AnimationKind::Fall, falls.iter().map(|f| f.to).collect()),
                Step::Refilled(spawns) => (
                    AnimationKind::Spawn,
                    spawns.iter().map(|s| s.tile.pos).collect(),
                ),
                Step::Reshuffled => {
                    let tiles = self.board().map(|b| b.positions().collect()).unwrap_or_default();
                    (AnimationKind::Reshuffle, tiles)
                }
                Step::Settled(summary) => {
                    log::debug!(
                        "cascade settled: {} chains, {} cleared, {} refilled",
                        summary.chains,
                        summary.cleared,
                        summary.refilled
                    );
                    self.finish_turn();
                    return;
                }
            };
            self.turn = Some(Turn::Cascade(cascade));
            self.start_animation(kind, tiles);
        }
    }

    // ============== Score and timer ==============

    fn award(&mut self, report: &ClearReport) {
        let delta = report.len() as u32 + report.golden * self.config.golden_bonus;
        self.set_score(self.score + delta);
    }

    /// Store a new score and check the target immediately
    fn set_score(&mut self, score: u32) {
        let delta = score.saturating_sub(self.score);
        self.score = score;
        self.publish(GameEvent::ScoreChanged { score, delta });
        if self.outcome.is_none() && self.score >= self.config.target_score {
            log::debug!("target {} reached", self.config.target_score);
            self.outcome = Some(true);
        }
        self.conclude_if_idle();
    }

    /// Advance the session clock by `elapsed_ms`
    ///
    /// Every full [`TICK_MS`] adds one second. With a non-zero `total_time` the
    /// session is lost once elapsed seconds exceed it.
    pub fn tick(&mut self, elapsed_ms: u32) {
        if !self.timer_running {
            return;
        }
        self.tick_accum_ms = self.tick_accum_ms.saturating_add(elapsed_ms);
        while self.tick_accum_ms >= TICK_MS {
            self.tick_accum_ms -= TICK_MS;
            self.elapsed += 1;
            let expired = self.config.total_time > 0 && self.elapsed > self.config.total_time;
            self.publish(GameEvent::TimeTick {
                elapsed: self.elapsed,
                is_over: expired,
            });
            if expired {
                self.timer_running = false;
                if self.outcome.is_none() {
                    self.outcome = Some(false);
                }
                self.conclude_if_idle();
                break;
            }
        }
    }

    // ============== Accessors ==============

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn is_over(&self) -> bool {
        self.status == SessionStatus::Over
    }

    /// `Some(true)` once won, `Some(false)` once lost
    pub fn is_win(&self) -> Option<bool> {
        if self.is_over() {
            self.outcome
        } else {
            None
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn engine(&self) -> Option<&MatchEngine> {
        self.engine.as_ref()
    }

    pub fn board(&self) -> Option<&Board> {
        self.engine.as_ref().map(MatchEngine::board)
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Batch the session is currently waiting on
    pub fn pending_batch(&self) -> Option<u64> {
        self.join.map(|j| j.batch())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut out = GameSnapshot::default();
        self.snapshot_into(&mut out);
        out
    }

    /// Fill `out` in place, reusing its board buffer
    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.clear();
        if let Some(board) = self.board() {
            out.width = board.width();
            out.height = board.height();
            board.write_codes(&mut out.board);
        }
        out.status = self.status;
        out.score = self.score;
        out.target_score = self.config.target_score;
        out.elapsed = self.elapsed;
        out.total_time = self.config.total_time;
        out.level = self.config.difficulty_level;
        out.episode_id = self.episode_id;
        out.seed = self.seed;
        out.pending_batch = self.pending_batch();
        out.is_over = self.is_over();
        out.is_win = self.is_win();
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("status", &self.status)
            .field("score", &self.score)
            .field("elapsed", &self.elapsed)
            .field("episode_id", &self.episode_id)
            .field("pending_batch", &self.pending_batch())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fixture(target_score: u32, total_time: u32) -> MatchEngine {
        let board = Board::from_codes(&[&[0, 1, 0, 3], &[3, 0, 2, 1], &[1, 2, 3, 2]]).unwrap();
        let config = GameConfig {
            tile_type_count: 4,
            target_score,
            total_time,
            seed: 21,
            ..GameConfig::default()
        };
        MatchEngine::with_board(config, board).unwrap()
    }

    #[test]
    fn init_moves_stopped_to_playing_once() {
        let mut session = GameSession::headless(GameConfig::default()).unwrap();
        assert_eq!(session.status(), SessionStatus::Stopped);
        assert!(session.board().is_none());

        assert!(session.init());
        assert_eq!(session.status(), SessionStatus::Playing);
        assert!(session.board().is_some());
        assert!(!session.init());
    }

    #[test]
    fn swaps_ignored_until_init() {
        let mut session = GameSession::from_engine(fixture(100, 0), Headless);
        assert!(!session.request_swap(TilePos::new(1, 0), TilePos::new(1, 1)));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn reaching_target_wins_after_cascade() {
        let mut session = GameSession::from_engine(fixture(3, 0), Headless);
        session.init();

        assert!(session.request_swap(TilePos::new(1, 0), TilePos::new(1, 1)));
        assert!(session.score() >= 3);
        assert_eq!(session.status(), SessionStatus::Over);
        assert_eq!(session.is_win(), Some(true));
    }

    #[test]
    fn rejected_swap_holds_matching_until_revert_finishes() {
        let requests = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&requests);
        let animator = move |req: &AnimationRequest| {
            seen.borrow_mut().push(req.clone());
            1
        };
        let mut session = GameSession::from_engine(fixture(100, 0), animator);
        session.init();
        let before = session.board().unwrap().clone();

        assert!(!session.request_swap(TilePos::new(0, 0), TilePos::new(0, 1)));
        assert_eq!(session.status(), SessionStatus::Matching);
        assert_eq!(session.board().unwrap(), &before);

        let batch = requests.borrow()[0].batch;
        assert_eq!(requests.borrow()[0].kind, AnimationKind::Revert);
        assert!(!session.request_swap(TilePos::new(1, 0), TilePos::new(1, 1)));

        session.animation_finished(batch + 7);
        assert_eq!(session.status(), SessionStatus::Matching);
        session.animation_finished(batch);
        assert_eq!(session.status(), SessionStatus::Playing);
    }

    #[test]
    fn timer_expiry_loses() {
        let mut session = GameSession::from_engine(fixture(100, 2), Headless);
        session.init();

        session.tick(999);
        assert_eq!(session.elapsed(), 0);
        session.tick(1001);
        assert_eq!(session.elapsed(), 2);
        assert!(!session.is_over());

        session.tick(1000);
        assert_eq!(session.elapsed(), 3);
        assert_eq!(session.is_win(), Some(false));

        session.tick(5000);
        assert_eq!(session.elapsed(), 3);
    }

    #[test]
    fn untimed_session_never_expires() {
        let mut session = GameSession::from_engine(fixture(100, 0), Headless);
        session.init();
        session.tick(3_600_000);
        assert_eq!(session.elapsed(), 3600);
        assert!(!session.is_over());
    }

    #[test]
    fn destroy_is_idempotent_and_detaches() {
        let hits = Rc::new(RefCell::new(0));
        let mut session = GameSession::from_engine(fixture(100, 0), Headless);
        let h = Rc::clone(&hits);
        session.subscribe(move |_| *h.borrow_mut() += 1);
        session.init();
        let after_init = *hits.borrow();
        assert!(after_init > 0);

        session.destroy();
        session.destroy();
        session.tick(10_000);
        assert!(!session.init());
        assert_eq!(*hits.borrow(), after_init);
        assert_eq!(session.elapsed(), 0);
    }

    #[test]
    fn restart_starts_next_episode() {
        let mut session = GameSession::headless(GameConfig::default()).unwrap();
        session.init();
        session.tick(4000);
        let first_seed = session.seed();

        assert!(session.restart());
        assert_eq!(session.episode_id(), 2);
        assert_eq!(session.elapsed(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.status(), SessionStatus::Playing);
        assert_ne!(session.seed(), first_seed);
    }

    #[test]
    fn snapshot_reflects_session() {
        let mut session = GameSession::from_engine(fixture(100, 60), Headless);
        session.init();
        session.tick(2000);
        let snap = session.snapshot();
        assert_eq!((snap.width, snap.height), (4, 3));
        assert_eq!(snap.board.len(), 12);
        assert_eq!(snap.remaining(), Some(58));
        assert!(snap.playable());
    }
}
