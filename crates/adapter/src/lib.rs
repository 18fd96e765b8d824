//! Adapter module - drive a session over JSON lines
//!
//! This crate lets an external client (a script, a bot, a UI in another
//! process) play a session through line-delimited JSON. The transport is left
//! to the caller: the runtime only sees two channels of `String` lines, so the
//! same loop serves stdin/stdout, a socket, or an in-process test.
//!
//! # Message Types
//!
//! ## Client → Game
//!
//! - **swap**: `{"type":"swap","a":[x,y],"b":[x,y]}`
//! - **move**: `{"type":"move","at":[x,y],"dir":"left"}` (swap with a neighbour)
//! - **hint**: ask for the best available swap
//! - **snapshot**: ask for the full board and session state
//! - **restart**: start the next episode with the same config
//! - **quit**: stop the runtime
//!
//! ## Game → Client
//!
//! - one line per session event, `type` being the event name
//!   (`board_created`, `matched`, `tile_fell`, `time_tick`, `session_over`, ...)
//! - **hint**, **snapshot** replies
//! - **error**: `{"type":"error","code":...,"message":...}` for rejected input
//!
//! # Environment Variables
//!
//! - `TILE_MATCH_TICK_MS`: clock interval in milliseconds (default: 1000)
//! - `TILE_MATCH_AUTOPLAY`: `1`/`true` plays the hinted move every tick
//! - `TILE_MATCH_MAX_PENDING`: inbound command queue size (default: 64)
//!
//! # Example Protocol Flow
//!
//! ```text
//! Game -> Client: {"type":"board_created","tiles":[{"x":0,"y":0,"value":3},...]}
//! Game -> Client: {"type":"status_changed","status":"playing"}
//! Client -> Game: {"type":"swap","a":[2,4],"b":[3,4]}
//! Game -> Client: {"type":"swapped","a":{"x":2,"y":4,"value":2},"b":{"x":3,"y":4,"value":1}}
//! Game -> Client: {"type":"matched","tiles":[...],"golden":0,"ordinary":3,"chain":1}
//! Game -> Client: {"type":"score_changed","score":3,"delta":3}
//! ```

pub mod protocol;
pub mod runtime;

pub use tile_match_core as core;
pub use tile_match_engine as engine;
pub use tile_match_types as types;

pub use protocol::{encode_event, parse_command, ClientCommand, ProtocolError, ServerMessage};
pub use runtime::{channels, run_session, Channels, RunExit, RuntimeConfig, SessionChannels};
