use crate::types::{SessionStatus, GOLDEN_CODE};

/// Read-only copy of everything a renderer or remote client needs
///
/// `board` holds row-major integer codes: `-1` empty, `0..` ordinary, `9` golden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub width: u8,
    pub height: u8,
    pub board: Vec<i8>,
    pub status: SessionStatus,
    pub score: u32,
    pub target_score: u32,
    pub elapsed: u32,
    pub total_time: u32,
    pub level: u32,
    pub episode_id: u32,
    pub seed: u32,
    /// Batch the session is waiting on, if any
    pub pending_batch: Option<u64>,
    pub is_over: bool,
    pub is_win: Option<bool>,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.width = 0;
        self.height = 0;
        self.board.clear();
        self.status = SessionStatus::Stopped;
        self.score = 0;
        self.target_score = 0;
        self.elapsed = 0;
        self.total_time = 0;
        self.level = 0;
        self.episode_id = 0;
        self.seed = 0;
        self.pending_batch = None;
        self.is_over = false;
        self.is_win = None;
    }

    /// Accepting swaps right now
    pub fn playable(&self) -> bool {
        self.status == SessionStatus::Playing
    }

    /// Seconds left, or `None` when untimed
    pub fn remaining(&self) -> Option<u32> {
        (self.total_time > 0).then(|| self.total_time.saturating_sub(self.elapsed))
    }

    pub fn golden_count(&self) -> usize {
        self.board.iter().filter(|&&c| c == GOLDEN_CODE).count()
    }

    /// Board as rows of codes, top row first
    pub fn rows(&self) -> Vec<Vec<i8>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.board
            .chunks(self.width as usize)
            .map(|row| row.to_vec())
            .collect()
    }
}
