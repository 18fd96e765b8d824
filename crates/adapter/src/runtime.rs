//! Adapter runtime integration.
//!
//! Drives a synchronous [`GameSession`] from async inputs: a tokio interval feeds
//! the session clock and a channel delivers raw command lines. Every session
//! event and every reply is pushed to an unbounded channel as one JSON line.
//!
//! The session is not `Send`, so [`run_session`] is meant to be awaited on a
//! current-thread runtime rather than spawned.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::core::GameSession;
use crate::engine::{apply_move, best_move, MoveError};
use crate::protocol::{encode_event, parse_command, pos, ClientCommand, ServerMessage, SnapshotMessage};
use crate::types::SessionStatus;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Interval between clock ticks; each tick advances the session by this much
    pub tick_ms: u64,
    /// Play the best available move on every tick
    pub autoplay: bool,
    /// Capacity of the inbound command channel
    pub max_pending_commands: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            autoplay: false,
            max_pending_commands: 64,
        }
    }
}

impl RuntimeConfig {
    /// Read `TILE_MATCH_TICK_MS`, `TILE_MATCH_AUTOPLAY` and `TILE_MATCH_MAX_PENDING`
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let tick_ms = env::var("TILE_MATCH_TICK_MS")
            .ok()
            .and_then(|s| parse_tick_ms(&s))
            .unwrap_or(defaults.tick_ms);

        let autoplay = env::var("TILE_MATCH_AUTOPLAY")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let max_pending_commands = env::var("TILE_MATCH_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        Self {
            tick_ms,
            autoplay,
            max_pending_commands,
        }
    }
}

/// Tick interval in milliseconds; must be non-zero and fit the session clock's `u32`
fn parse_tick_ms(value: &str) -> Option<u64> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|&ms| ms > 0 && ms <= u32::MAX as u64)
}

/// Why [`run_session`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    Over { is_win: bool, score: u32 },
    Quit,
    /// The command channel closed
    Disconnected,
}

enum Flow {
    Continue,
    Quit,
}

/// Channel ends handed to the transport side
pub struct Channels {
    pub cmd_tx: mpsc::Sender<String>,
    pub out_rx: mpsc::UnboundedReceiver<String>,
}

/// Channel ends consumed by [`run_session`]
pub struct SessionChannels {
    pub cmd_rx: mpsc::Receiver<String>,
    pub out_tx: mpsc::UnboundedSender<String>,
}

pub fn channels(config: &RuntimeConfig) -> (Channels, SessionChannels) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<String>(config.max_pending_commands.max(1));
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    (
        Channels { cmd_tx, out_rx },
        SessionChannels { cmd_rx, out_tx },
    )
}

/// Run `session` until it ends, the client quits, or the command channel closes
///
/// A STOPPED session is initialised first. Session events are streamed from
/// the moment this is called. With autoplay on, a closed command channel does
/// not stop the game.
pub async fn run_session(
    mut session: GameSession,
    config: RuntimeConfig,
    chans: SessionChannels,
) -> RunExit {
    let SessionChannels { mut cmd_rx, out_tx } = chans;

    let events_tx = out_tx.clone();
    let subscription = session.subscribe(move |event| {
        let _ = events_tx.send(encode_event(event));
    });

    if session.status() == SessionStatus::Stopped {
        session.init();
    }

    let tick_ms = config.tick_ms.clamp(1, u32::MAX as u64);
    let mut interval = time::interval(Duration::from_millis(tick_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    let mut inputs_open = true;
    let exit = loop {
        if session.is_over() {
            break RunExit::Over {
                is_win: session.is_win().unwrap_or(false),
                score: session.score(),
            };
        }

        tokio::select! {
            _ = interval.tick() => {
                session.tick(tick_ms as u32);
                if config.autoplay {
                    autoplay_step(&mut session);
                }
            }
            line = cmd_rx.recv(), if inputs_open => {
                let Some(line) = line else {
                    if !config.autoplay {
                        break RunExit::Disconnected;
                    }
                    log::debug!("command channel closed, autoplay continues");
                    inputs_open = false;
                    continue;
                };
                if let Flow::Quit = handle_line(&mut session, &line, &out_tx) {
                    break RunExit::Quit;
                }
            }
        }
    };

    log::info!("session runtime finished: {:?}", exit);
    session.unsubscribe(subscription);
    session.destroy();
    exit
}

fn send(out: &mpsc::UnboundedSender<String>, msg: ServerMessage) {
    let _ = out.send(msg.to_line());
}

fn autoplay_step(session: &mut GameSession) {
    if session.status() != SessionStatus::Playing {
        return;
    }
    let Some(mv) = session.board().and_then(best_move) else {
        return;
    };
    if let Err(e) = apply_move(session, mv.a, mv.b) {
        log::warn!("autoplay move {:?} failed: {}", mv, e);
    }
}

fn report(out: &mpsc::UnboundedSender<String>, err: MoveError) {
    send(out, ServerMessage::error(err.code(), err.message()));
}

fn handle_line(session: &mut GameSession, line: &str, out: &mpsc::UnboundedSender<String>) -> Flow {
    let line = line.trim();
    if line.is_empty() {
        return Flow::Continue;
    }

    let cmd = match parse_command(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            log::warn!("rejected command line: {}", e);
            send(out, ServerMessage::error(e.code(), e.to_string()));
            return Flow::Continue;
        }
    };

    match cmd {
        ClientCommand::Swap { a, b } => {
            if let Err(e) = apply_move(session, pos(a), pos(b)) {
                report(out, e);
            }
        }
        ClientCommand::Move { at, dir } => {
            let at = pos(at);
            let target = session
                .board()
                .and_then(|board| at.step(dir, board.width(), board.height()));
            match target {
                Some(other) => {
                    if let Err(e) = apply_move(session, at, other) {
                        report(out, e);
                    }
                }
                None => report(out, MoveError::OutOfBounds),
            }
        }
        ClientCommand::Hint => {
            let hint = session
                .board()
                .and_then(best_move)
                .map(|m| (m.a, m.b, m.cleared));
            send(out, ServerMessage::hint(hint));
        }
        ClientCommand::Snapshot => {
            let snap = session.snapshot();
            send(out, ServerMessage::Snapshot(SnapshotMessage::from(&snap)));
        }
        ClientCommand::Restart => {
            session.restart();
        }
        ClientCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_ms_must_fit_session_clock() {
        assert_eq!(parse_tick_ms("250"), Some(250));
        assert_eq!(parse_tick_ms(" 1000 "), Some(1000));
        assert_eq!(parse_tick_ms("4294967295"), Some(u32::MAX as u64));
        assert_eq!(parse_tick_ms("4294967296"), None);
        assert_eq!(parse_tick_ms("0"), None);
        assert_eq!(parse_tick_ms("fast"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_tick_interval_still_advances_clock() {
        let config = RuntimeConfig {
            tick_ms: u64::MAX,
            ..RuntimeConfig::default()
        };
        let (transport, chans) = channels(&config);
        let session = GameSession::headless(crate::core::GameConfig {
            total_time: 1,
            ..Default::default()
        })
        .unwrap();

        let _cmd_tx = transport.cmd_tx.clone();
        let exit = run_session(session, config, chans).await;
        assert_eq!(
            exit,
            RunExit::Over {
                is_win: false,
                score: 0
            }
        );
    }
}
