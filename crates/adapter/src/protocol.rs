//! Protocol module - JSON line messages for remote control
//!
//! One JSON object per line in both directions, discriminated by `type`.
//! Positions travel as `[x, y]`; tile values as integer codes
//! (`-1` empty, `0..` ordinary, `9` golden).

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::GameSnapshot;
use crate::types::{Direction, GameEvent, Tile, TilePos};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed command: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown command type {0:?}")]
    UnknownCommand(String),
}

impl ProtocolError {
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::Json(_) => "invalid_command",
            ProtocolError::UnknownCommand(_) => "unknown_command",
        }
    }
}

// ============== Client -> Game Messages ==============

/// Commands accepted from the controlling client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Swap two cells: `{"type":"swap","a":[x,y],"b":[x,y]}`
    Swap { a: [u8; 2], b: [u8; 2] },
    /// Swap a cell with its neighbour: `{"type":"move","at":[x,y],"dir":"left"}`
    Move {
        at: [u8; 2],
        #[serde(deserialize_with = "direction")]
        dir: Direction,
    },
    Hint,
    Snapshot,
    Restart,
    Quit,
}

const COMMAND_TYPES: [&str; 6] = ["swap", "move", "hint", "snapshot", "restart", "quit"];

fn direction<'de, D>(deserializer: D) -> Result<Direction, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Direction::from_str(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid direction {:?}", s)))
}

pub fn pos(xy: [u8; 2]) -> TilePos {
    TilePos::new(xy[0], xy[1])
}

/// Parse one command line
///
/// A well-formed object with an unrecognised `type` is reported as
/// [`ProtocolError::UnknownCommand`] rather than a JSON error.
pub fn parse_command(line: &str) -> Result<ClientCommand, ProtocolError> {
    match serde_json::from_str::<ClientCommand>(line) {
        Ok(cmd) => Ok(cmd),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct TypeOnly {
                #[serde(rename = "type")]
                msg_type: Option<String>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(line)?
                .msg_type
                .unwrap_or_else(|| "unknown".to_string());
            if !COMMAND_TYPES.contains(&msg_type.as_str()) {
                return Err(ProtocolError::UnknownCommand(msg_type));
            }
            Err(e.into())
        }
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileJson {
    pub x: u8,
    pub y: u8,
    pub value: i8,
}

impl From<&Tile> for TileJson {
    fn from(tile: &Tile) -> Self {
        Self {
            x: tile.pos.x,
            y: tile.pos.y,
            value: tile.value.code(),
        }
    }
}

fn tiles(tiles: &[Tile]) -> Vec<TileJson> {
    tiles.iter().map(TileJson::from).collect()
}

fn xy(pos: TilePos) -> [u8; 2] {
    [pos.x, pos.y]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotMessage {
    pub width: u8,
    pub height: u8,
    /// Rows of codes, top row first
    pub board: Vec<Vec<i8>>,
    pub status: &'static str,
    pub score: u32,
    pub target_score: u32,
    pub elapsed: u32,
    pub total_time: u32,
    pub level: u32,
    pub episode_id: u32,
    pub seed: u32,
    pub playable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_win: Option<bool>,
}

impl From<&GameSnapshot> for SnapshotMessage {
    fn from(snap: &GameSnapshot) -> Self {
        Self {
            width: snap.width,
            height: snap.height,
            board: snap.rows(),
            status: snap.status.as_str(),
            score: snap.score,
            target_score: snap.target_score,
            elapsed: snap.elapsed,
            total_time: snap.total_time,
            level: snap.level,
            episode_id: snap.episode_id,
            seed: snap.seed,
            playable: snap.playable(),
            is_win: snap.is_win,
        }
    }
}

/// Every line the runtime writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    BoardCreated {
        tiles: Vec<TileJson>,
    },
    Swapped {
        a: TileJson,
        b: TileJson,
    },
    SwapRejected {
        a: TileJson,
        b: TileJson,
    },
    Matched {
        tiles: Vec<TileJson>,
        golden: u32,
        ordinary: u32,
        chain: u32,
    },
    TileFell {
        from: [u8; 2],
        to: [u8; 2],
        value: i8,
    },
    TileMaterialized {
        tile: TileJson,
        fall_distance: u8,
    },
    Reshuffled {
        tiles: Vec<TileJson>,
    },
    ScoreChanged {
        score: u32,
        delta: u32,
    },
    StatusChanged {
        status: &'static str,
    },
    TimeTick {
        elapsed: u32,
        is_over: bool,
    },
    SessionOver {
        is_win: bool,
    },
    Hint {
        a: Option<[u8; 2]>,
        b: Option<[u8; 2]>,
        cleared: usize,
    },
    Snapshot(SnapshotMessage),
    Error {
        code: &'static str,
        message: String,
    },
}

impl From<&GameEvent> for ServerMessage {
    fn from(event: &GameEvent) -> Self {
        match event {
            GameEvent::BoardCreated { tiles: t } => ServerMessage::BoardCreated { tiles: tiles(t) },
            GameEvent::Swapped { a, b } => ServerMessage::Swapped {
                a: a.into(),
                b: b.into(),
            },
            GameEvent::SwapRejected { a, b } => ServerMessage::SwapRejected {
                a: a.into(),
                b: b.into(),
            },
            GameEvent::Matched {
                tiles: t,
                golden,
                ordinary,
                chain,
            } => ServerMessage::Matched {
                tiles: tiles(t),
                golden: *golden,
                ordinary: *ordinary,
                chain: *chain,
            },
            GameEvent::TileFell { from, to, value } => ServerMessage::TileFell {
                from: xy(*from),
                to: xy(*to),
                value: value.code(),
            },
            GameEvent::TileMaterialized {
                tile,
                fall_distance,
            } => ServerMessage::TileMaterialized {
                tile: tile.into(),
                fall_distance: *fall_distance,
            },
            GameEvent::Reshuffled { tiles: t } => ServerMessage::Reshuffled { tiles: tiles(t) },
            GameEvent::ScoreChanged { score, delta } => ServerMessage::ScoreChanged {
                score: *score,
                delta: *delta,
            },
            GameEvent::StatusChanged { status } => ServerMessage::StatusChanged {
                status: status.as_str(),
            },
            GameEvent::TimeTick { elapsed, is_over } => ServerMessage::TimeTick {
                elapsed: *elapsed,
                is_over: *is_over,
            },
            GameEvent::SessionOver { is_win } => ServerMessage::SessionOver { is_win: *is_win },
        }
    }
}

impl ServerMessage {
    pub fn hint(mv: Option<(TilePos, TilePos, usize)>) -> Self {
        match mv {
            Some((a, b, cleared)) => ServerMessage::Hint {
                a: Some(xy(a)),
                b: Some(xy(b)),
                cleared,
            },
            None => ServerMessage::Hint {
                a: None,
                b: None,
                cleared: 0,
            },
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code,
            message: message.into(),
        }
    }

    /// Serialize as a single line (no trailing newline)
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("failed to encode {:?}: {}", self, e);
            r#"{"type":"error","code":"internal","message":"encode failed"}"#.to_string()
        })
    }
}

/// Encode an event as one protocol line
pub fn encode_event(event: &GameEvent) -> String {
    ServerMessage::from(event).to_line()
}
