//! Tile match (workspace facade crate).
//!
//! Re-exports the workspace members under one name so binaries, integration tests
//! and benches can write `tile_match::{core,engine,adapter,types}`. The
//! implementation lives in dedicated crates under `crates/`.

pub use tile_match_adapter as adapter;
pub use tile_match_core as core;
pub use tile_match_engine as engine;
pub use tile_match_types as types;
