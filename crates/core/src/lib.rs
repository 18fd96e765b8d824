//! Core match-3 logic - pure, deterministic, and testable
//!
//! This crate contains the board, run detection, the cascade pipeline and the
//! session state machine. It has **no dependencies** on rendering, input devices
//! or networking:
//!
//! - **Deterministic**: the same seed and the same swaps produce the same game
//! - **Testable**: every rule is reachable through plain function calls
//! - **Headless**: animations are an injected collaborator; [`Headless`] completes them instantly
//!
//! # Module Structure
//!
//! - [`board`]: `width x height` grid of tiles, column compaction
//! - [`matcher`]: run detection and move search over read-only views
//! - [`engine`]: the only board mutator (build, swap, clear, gravity, refill, reshuffle)
//! - [`cascade`]: one resolution turn as a step-by-step state machine
//! - [`animation`]: batch-id handshake between the session and presentation
//! - [`events`]: publish/subscribe bus for [`GameEvent`](types::GameEvent)s
//! - [`session`]: lifecycle, score, timer, win/lose
//! - [`config`]: validated session config and the level table
//! - [`rng`]: seeded LCG used for every random choice
//!
//! # Rules
//!
//! | Rule | Behaviour |
//! |------|-----------|
//! | Run | 3+ equal values in a row or column; goldens match goldens |
//! | Swap | Edge-adjacent only; reverted unless it creates a run at either cell |
//! | Score | One point per cleared tile, plus `golden_bonus` per golden |
//! | Refill | Ordinary values only; goldens are never spawned mid-game |
//! | Deadlock | A settled board with no move is reshuffled |
//! | Win | Score reaches `target_score` |
//! | Lose | Elapsed seconds exceed `total_time` (0 = untimed) |
//!
//! # Example
//!
//! ```
//! use tile_match_core::{GameConfig, GameSession, SessionStatus};
//!
//! let mut session = GameSession::headless(GameConfig::default()).unwrap();
//! session.init();
//! assert_eq!(session.status(), SessionStatus::Playing);
//!
//! // Play the first move the board offers.
//! let (a, b) = session.engine().unwrap().find_move().unwrap();
//! assert!(session.request_swap(a, b));
//! assert!(session.score() >= 3);
//!
//! session.tick(1000);
//! assert_eq!(session.elapsed(), 1);
//! ```

pub mod animation;
pub mod board;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod events;
pub mod matcher;
pub mod rng;
pub mod session;
pub mod snapshot;

pub use tile_match_types as types;

// Re-export commonly used types for convenience
pub use animation::{AnimationJoin, AnimationKind, AnimationRequest, Animator, Headless, JoinState};
pub use board::{Board, Fall};
pub use cascade::{Cascade, CascadeSummary, Step};
pub use config::{AssetTable, BoardSize, ConfigError, GameConfig, InitPolicy, LevelSpec, LevelTable};
pub use engine::{CascadeReport, ClearReport, MatchEngine, Spawn, SwapOutcome};
pub use events::{EventBus, SubscriptionId};
pub use matcher::{MatchSet, SwappedView, ValueView};
pub use rng::SimpleRng;
pub use session::GameSession;
pub use snapshot::GameSnapshot;
pub use types::{Direction, GameEvent, SessionStatus, Tile, TilePos, TileValue};
