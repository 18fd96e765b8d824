//! Animation handshake
//!
//! The session never sleeps or polls a clock to pace a cascade. Each visible
//! step is handed to an [`Animator`] as an [`AnimationRequest`] tagged with a
//! batch id; the animator answers with how many completion signals it will send
//! for that batch. The session then parks until an [`AnimationJoin`] has
//! counted them all. Signals for any other batch are ignored.

use crate::types::TilePos;

/// What a batch of tiles is doing on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    Swap,
    /// Invalid swap sliding back
    Revert,
    Clear,
    Fall,
    Spawn,
    Reshuffle,
}

impl AnimationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationKind::Swap => "swap",
            AnimationKind::Revert => "revert",
            AnimationKind::Clear => "clear",
            AnimationKind::Fall => "fall",
            AnimationKind::Spawn => "spawn",
            AnimationKind::Reshuffle => "reshuffle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationRequest {
    pub batch: u64,
    pub kind: AnimationKind,
    pub tiles: Vec<TilePos>,
}

/// Presentation collaborator
pub trait Animator {
    /// Begin animating `request`; return the number of completion signals to expect
    ///
    /// Returning 0 means "already done" and the session continues immediately.
    fn start(&mut self, request: &AnimationRequest) -> u32;
}

/// Animator that completes everything instantly
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Animator for Headless {
    fn start(&mut self, _request: &AnimationRequest) -> u32 {
        0
    }
}

impl<F> Animator for F
where
    F: FnMut(&AnimationRequest) -> u32,
{
    fn start(&mut self, request: &AnimationRequest) -> u32 {
        self(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    /// Signal belonged to another batch
    Stale,
    Waiting(u32),
    Complete,
}

/// Fan-in counter for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationJoin {
    batch: u64,
    pending: u32,
}

impl AnimationJoin {
    pub fn new(batch: u64, pending: u32) -> Self {
        Self { batch, pending }
    }

    pub fn batch(&self) -> u64 {
        self.batch
    }

    /// Count one completion signal
    pub fn signal(&mut self, batch: u64) -> JoinState {
        if batch != self.batch || self.pending == 0 {
            log::debug!(
                "ignoring completion for batch {} while waiting on {}",
                batch,
                self.batch
            );
            return JoinState::Stale;
        }
        self.pending -= 1;
        if self.pending == 0 {
            JoinState::Complete
        } else {
            JoinState::Waiting(self.pending)
        }
    }
}
