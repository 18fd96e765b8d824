use serde_json::Value;

use tile_match::adapter::{channels, run_session, RunExit, RuntimeConfig};
use tile_match::core::{Board, GameConfig, GameSession, Headless, MatchEngine};

fn fixture_session(target_score: u32) -> GameSession {
    let board = Board::from_codes(&[&[0, 1, 0, 3], &[3, 0, 2, 1], &[1, 2, 3, 2]]).unwrap();
    let config = GameConfig {
        tile_type_count: 4,
        target_score,
        total_time: 0,
        ..GameConfig::default()
    };
    GameSession::from_engine(MatchEngine::with_board(config, board).unwrap(), Headless)
}

fn drain_lines(rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(line) = rx.try_recv() {
        out.push(serde_json::from_str(&line).expect("runtime wrote invalid JSON"));
    }
    out
}

fn types(lines: &[Value]) -> Vec<&str> {
    lines.iter().map(|v| v["type"].as_str().unwrap()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_commands_are_answered_until_quit() {
    let config = RuntimeConfig::default();
    let (mut transport, chans) = channels(&config);

    for line in [
        r#"{"type":"snapshot"}"#,
        "not json",
        r#"{"type":"dance"}"#,
        r#"{"type":"hint"}"#,
        r#"{"type":"swap","a":[0,0],"b":[2,0]}"#,
        r#"{"type":"quit"}"#,
    ] {
        transport.cmd_tx.send(line.to_string()).await.unwrap();
    }

    let exit = run_session(fixture_session(1000), config, chans).await;
    assert_eq!(exit, RunExit::Quit);

    let lines = drain_lines(&mut transport.out_rx);
    assert_eq!(
        types(&lines),
        vec!["board_created", "status_changed", "snapshot", "error", "error", "hint", "error"]
    );

    let snapshot = &lines[2];
    assert_eq!(snapshot["width"], 4);
    assert_eq!(snapshot["board"][0], serde_json::json!([0, 1, 0, 3]));
    assert_eq!(snapshot["status"], "playing");

    assert_eq!(lines[3]["code"], "invalid_command");
    assert_eq!(lines[4]["code"], "unknown_command");
    assert_eq!(lines[6]["code"], "invalid_swap");

    let hint = &lines[5];
    assert!(hint["a"].is_array());
    assert!(hint["cleared"].as_u64().unwrap() >= 3);
}

#[tokio::test(start_paused = true)]
async fn test_swap_streams_cascade_events() {
    let config = RuntimeConfig::default();
    let (mut transport, chans) = channels(&config);

    transport
        .cmd_tx
        .send(r#"{"type":"move","at":[1,0],"dir":"down"}"#.to_string())
        .await
        .unwrap();
    transport.cmd_tx.send(r#"{"type":"quit"}"#.to_string()).await.unwrap();

    let exit = run_session(fixture_session(1000), config, chans).await;
    assert_eq!(exit, RunExit::Quit);

    let lines = drain_lines(&mut transport.out_rx);
    let kinds = types(&lines);
    let swapped = kinds.iter().position(|t| *t == "swapped").unwrap();
    let matched = kinds.iter().position(|t| *t == "matched").unwrap();
    let scored = kinds.iter().position(|t| *t == "score_changed").unwrap();
    assert!(swapped < matched && matched < scored);
    assert!(kinds.contains(&"tile_materialized"));
    assert_eq!(lines[scored]["delta"], 3);
    assert_eq!(lines[matched]["chain"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_timer_expiry_ends_runtime() {
    let config = RuntimeConfig::default();
    let (mut transport, chans) = channels(&config);
    let session = GameSession::headless(GameConfig {
        total_time: 2,
        ..GameConfig::default()
    })
    .unwrap();

    // Keep the sender alive so only the clock can end the run.
    let _cmd_tx = transport.cmd_tx.clone();
    let exit = run_session(session, config, chans).await;
    assert_eq!(
        exit,
        RunExit::Over {
            is_win: false,
            score: 0
        }
    );

    let lines = drain_lines(&mut transport.out_rx);
    let ticks: Vec<&Value> = lines.iter().filter(|v| v["type"] == "time_tick").collect();
    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks[2]["is_over"], true);
    assert_eq!(lines.last().unwrap()["type"], "session_over");
    assert_eq!(lines.last().unwrap()["is_win"], false);
}

#[tokio::test(start_paused = true)]
async fn test_closed_input_disconnects() {
    let config = RuntimeConfig::default();
    let (transport, chans) = channels(&config);
    drop(transport.cmd_tx);

    let exit = run_session(fixture_session(1000), config, chans).await;
    assert_eq!(exit, RunExit::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_autoplay_keeps_playing_after_input_closes() {
    let config = RuntimeConfig {
        autoplay: true,
        ..RuntimeConfig::default()
    };
    let (mut transport, chans) = channels(&config);
    drop(transport.cmd_tx);

    let session = GameSession::headless(GameConfig {
        target_score: 10,
        total_time: 0,
        ..GameConfig::default()
    })
    .unwrap();

    let exit = run_session(session, config, chans).await;
    match exit {
        RunExit::Over { is_win, score } => {
            assert!(is_win);
            assert!(score >= 10);
        }
        other => panic!("expected a finished game, got {:?}", other),
    }

    let lines = drain_lines(&mut transport.out_rx);
    assert!(lines.iter().any(|v| v["type"] == "matched"));
    assert_eq!(lines.last().unwrap()["type"], "session_over");
}
