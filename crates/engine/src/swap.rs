use crate::core::GameSession;
use crate::types::{SessionStatus, TilePos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    NotPlayable,
    Busy,
    OutOfBounds,
    NotAdjacent,
    NoMatch,
}

impl MoveError {
    pub fn code(self) -> &'static str {
        match self {
            MoveError::NotPlayable => "not_playable",
            MoveError::Busy => "busy",
            MoveError::OutOfBounds | MoveError::NotAdjacent | MoveError::NoMatch => {
                "invalid_swap"
            }
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            MoveError::NotPlayable => "session is not running",
            MoveError::Busy => "a previous swap is still resolving",
            MoveError::OutOfBounds => "swap position outside the board",
            MoveError::NotAdjacent => "swap positions are not edge-adjacent",
            MoveError::NoMatch => "swap creates no run and was reverted",
        }
    }
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for MoveError {}

/// Forward a client swap to `session`, reporting why it did not happen
///
/// A swap that forms no run is still handed to the session so its revert plays;
/// the caller gets `NoMatch` back.
pub fn apply_move(session: &mut GameSession, a: TilePos, b: TilePos) -> Result<(), MoveError> {
    match session.status() {
        SessionStatus::Playing => {}
        SessionStatus::Matching => return Err(MoveError::Busy),
        SessionStatus::Stopped | SessionStatus::Over => return Err(MoveError::NotPlayable),
    }

    let Some(board) = session.board() else {
        return Err(MoveError::NotPlayable);
    };
    if !board.contains(a) || !board.contains(b) {
        return Err(MoveError::OutOfBounds);
    }
    if !a.is_adjacent(b) {
        return Err(MoveError::NotAdjacent);
    }

    if session.request_swap(a, b) {
        Ok(())
    } else {
        log::debug!("swap {:?} <-> {:?} rejected", a, b);
        Err(MoveError::NoMatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Board, GameConfig, Headless, MatchEngine};

    fn session() -> GameSession {
        let board = Board::from_codes(&[&[0, 1, 0, 3], &[3, 0, 2, 1], &[1, 2, 3, 2]]).unwrap();
        let config = GameConfig {
            tile_type_count: 4,
            target_score: 1000,
            ..GameConfig::default()
        };
        let engine = MatchEngine::with_board(config, board).unwrap();
        GameSession::from_engine(engine, Headless)
    }

    #[test]
    fn move_rejected_before_init() {
        let mut s = session();
        let err = apply_move(&mut s, TilePos::new(1, 0), TilePos::new(1, 1)).unwrap_err();
        assert_eq!(err, MoveError::NotPlayable);
        assert_eq!(err.code(), "not_playable");
    }

    #[test]
    fn move_rejected_when_out_of_bounds() {
        let mut s = session();
        s.init();
        let err = apply_move(&mut s, TilePos::new(3, 2), TilePos::new(4, 2)).unwrap_err();
        assert_eq!(err, MoveError::OutOfBounds);
    }

    #[test]
    fn move_rejected_when_not_adjacent() {
        let mut s = session();
        s.init();
        let err = apply_move(&mut s, TilePos::new(0, 0), TilePos::new(1, 1)).unwrap_err();
        assert_eq!(err, MoveError::NotAdjacent);
    }

    #[test]
    fn unproductive_move_reports_no_match() {
        let mut s = session();
        s.init();
        let before = s.board().unwrap().clone();
        let err = apply_move(&mut s, TilePos::new(0, 0), TilePos::new(0, 1)).unwrap_err();
        assert_eq!(err, MoveError::NoMatch);
        assert_eq!(s.board().unwrap(), &before);
        assert_eq!(s.status(), SessionStatus::Playing);
    }

    #[test]
    fn productive_move_scores() {
        let mut s = session();
        s.init();
        apply_move(&mut s, TilePos::new(1, 0), TilePos::new(1, 1)).unwrap();
        assert!(s.score() >= 3);
    }
}
