//! Session configuration and the per-level table
//!
//! A [`GameConfig`] is read once when a session is built and never changes
//! afterwards. Levels come from a [`LevelTable`], either the built-in one or a
//! JSON file supplied by the composition root.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{
    TileValue, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH, DEFAULT_TILE_TYPES, MAX_BOARD_SIDE,
    MAX_TILE_TYPES, MIN_BOARD_SIDE, MIN_TILE_TYPES,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("board size {width}x{height} outside {min}..={max} per side")]
    BoardSize {
        width: u8,
        height: u8,
        min: u8,
        max: u8,
    },
    #[error("tile type count {count} outside {min}..={max}")]
    TileTypes { count: u8, min: u8, max: u8 },
    #[error("no asset key for tile type {0}")]
    MissingAsset(u8),
    #[error("unknown level {0}")]
    UnknownLevel(u32),
    #[error("level table is empty")]
    EmptyLevelTable,
    #[error("failed to read level table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How accidental runs on a freshly built board are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// Reshuffle ordinary values until no run remains
    #[default]
    RejectAndReshuffle,
    /// Let the cascade clear them once before the board is shown
    AutoResolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSize {
    pub width: u8,
    pub height: u8,
}

impl Default for BoardSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_WIDTH,
            height: DEFAULT_BOARD_HEIGHT,
        }
    }
}

/// Explicit `TileValue -> asset key` mapping for rendering collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTable {
    pub normal: Vec<String>,
    pub golden: String,
}

impl Default for AssetTable {
    fn default() -> Self {
        Self {
            normal: [
                "red", "blue", "yellow", "green", "purple", "orange", "white", "black",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            golden: "golden".to_string(),
        }
    }
}

impl AssetTable {
    pub fn key_for(&self, value: TileValue) -> Option<&str> {
        match value {
            TileValue::Empty => None,
            TileValue::Normal(k) => self.normal.get(k as usize).map(String::as_str),
            TileValue::Golden => Some(self.golden.as_str()),
        }
    }
}

/// Immutable settings for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub size: BoardSize,
    /// Requested goldens; clamped to 20% of the board
    pub max_golden: u32,
    /// Level index this config was built for (1-based)
    pub difficulty_level: u32,
    /// Seconds allowed; 0 means untimed
    pub total_time: u32,
    pub target_score: u32,
    pub tile_type_count: u8,
    /// Extra points per cleared golden, on top of one point per tile
    pub golden_bonus: u32,
    pub seed: u32,
    pub init_policy: InitPolicy,
    pub assets: AssetTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            size: BoardSize::default(),
            max_golden: 4,
            difficulty_level: 1,
            total_time: 120,
            target_score: 100,
            tile_type_count: DEFAULT_TILE_TYPES,
            golden_bonus: 0,
            seed: 1,
            init_policy: InitPolicy::default(),
            assets: AssetTable::default(),
        }
    }
}

impl GameConfig {
    pub fn width(&self) -> u8 {
        self.size.width
    }

    pub fn height(&self) -> u8 {
        self.size.height
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let BoardSize { width, height } = self.size;
        let side_ok = |s: u8| (MIN_BOARD_SIDE..=MAX_BOARD_SIDE).contains(&s);
        if !side_ok(width) || !side_ok(height) {
            return Err(ConfigError::BoardSize {
                width,
                height,
                min: MIN_BOARD_SIDE,
                max: MAX_BOARD_SIDE,
            });
        }
        if !(MIN_TILE_TYPES..=MAX_TILE_TYPES).contains(&self.tile_type_count) {
            return Err(ConfigError::TileTypes {
                count: self.tile_type_count,
                min: MIN_TILE_TYPES,
                max: MAX_TILE_TYPES,
            });
        }
        for k in 0..self.tile_type_count {
            if self.assets.key_for(TileValue::Normal(k)).is_none() {
                return Err(ConfigError::MissingAsset(k));
            }
        }
        Ok(())
    }
}

/// Per-level settings supplied by the level collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub level: u32,
    pub tile_type_count: u8,
    pub target_score: u32,
    pub total_time: u32,
    #[serde(default = "default_max_golden")]
    pub max_golden: u32,
}

fn default_max_golden() -> u32 {
    4
}

/// Ordered list of playable levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTable {
    pub levels: Vec<LevelSpec>,
}

impl Default for LevelTable {
    fn default() -> Self {
        let row = |level, tile_type_count, target_score, total_time, max_golden| LevelSpec {
            level,
            tile_type_count,
            target_score,
            total_time,
            max_golden,
        };
        Self {
            levels: vec![
                row(1, 4, 60, 120, 3),
                row(2, 5, 90, 120, 4),
                row(3, 5, 120, 150, 5),
                row(4, 6, 150, 150, 6),
                row(5, 6, 200, 180, 7),
            ],
        }
    }
}

impl LevelTable {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let table: LevelTable = serde_json::from_str(text)?;
        if table.levels.is_empty() {
            return Err(ConfigError::EmptyLevelTable);
        }
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn get(&self, level: u32) -> Option<&LevelSpec> {
        self.levels.iter().find(|l| l.level == level)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Build a validated session config for `level` on the default board size
    pub fn config_for(&self, level: u32, seed: u32) -> Result<GameConfig, ConfigError> {
        let spec = self.get(level).ok_or(ConfigError::UnknownLevel(level))?;
        let config = GameConfig {
            max_golden: spec.max_golden,
            difficulty_level: spec.level,
            total_time: spec.total_time,
            target_score: spec.target_score,
            tile_type_count: spec.tile_type_count,
            seed,
            ..GameConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}
