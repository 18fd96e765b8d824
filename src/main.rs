//! Headless match-3 runner (default binary).
//!
//! Reads JSON command lines on stdin and writes one JSON line per session event
//! or reply on stdout. Logging goes to stderr (`RUST_LOG=debug` for cascade detail).
//!
//! Environment:
//! - `TILE_MATCH_LEVEL`: level index from the level table (default: 1)
//! - `TILE_MATCH_SEED`: board seed (default: 1)
//! - `TILE_MATCH_LEVELS`: path to a JSON level table (default: built-in table)
//! - `TILE_MATCH_TICK_MS`, `TILE_MATCH_AUTOPLAY`, `TILE_MATCH_MAX_PENDING`: see the adapter

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tile_match::adapter::{channels, run_session, RunExit, RuntimeConfig};
use tile_match::core::{GameSession, Headless, LevelTable};

fn env_u32(name: &str, default: u32) -> Result<u32> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer, got {:?}", name, v)),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let levels = match env::var("TILE_MATCH_LEVELS") {
        Ok(path) => LevelTable::load(&path)
            .with_context(|| format!("failed to load level table from {}", path))?,
        Err(_) => LevelTable::default(),
    };
    let level = env_u32("TILE_MATCH_LEVEL", 1)?;
    let seed = env_u32("TILE_MATCH_SEED", 1)?;
    let config = levels.config_for(level, seed)?;
    let runtime_config = RuntimeConfig::from_env();

    log::info!(
        "level {} of {}: {} types, target {}, {}s, seed {}",
        level,
        levels.len(),
        config.tile_type_count,
        config.target_score,
        config.total_time,
        seed
    );

    let session = GameSession::new(config, Headless)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let exit = rt.block_on(async move {
        let (transport, chans) = channels(&runtime_config);

        let cmd_tx = transport.cmd_tx;
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if cmd_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        let mut out_rx = transport.out_rx;
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(mut line) = out_rx.recv().await {
                line.push('\n');
                if stdout.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
            }
            let _ = stdout.flush().await;
        });

        let exit = run_session(session, runtime_config, chans).await;
        reader.abort();
        let _ = writer.await;
        exit
    });
    // The stdin reader parks a blocking thread that only returns on the next line
    // or EOF; do not wait for it.
    rt.shutdown_timeout(Duration::from_millis(100));

    match exit {
        RunExit::Over { is_win, score } => {
            log::info!("game over: {} with {} points", if is_win { "won" } else { "lost" }, score)
        }
        RunExit::Quit => log::info!("quit by client"),
        RunExit::Disconnected => log::info!("input closed"),
    }
    Ok(())
}
