//! Move search and validated swap application
//!
//! Helpers shared by the adapter and the headless runner: enumerate the swaps a
//! board offers, pick a hint, and apply a client-requested swap with a typed
//! error instead of a silent no-op.

pub mod moves;
pub mod swap;

pub use tile_match_core as core;
pub use tile_match_types as types;

pub use moves::{best_move, find_moves, Move};
pub use swap::{apply_move, MoveError};
