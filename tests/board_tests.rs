//! Board and run detection through the public API

use tile_match::core::matcher::{first_possible_move, has_any_match, scan_all, swap_creates_match};
use tile_match::core::{Board, GameConfig, GameEvent, MatchEngine, MatchSet, SwappedView};
use tile_match::types::{TilePos, TileValue};

fn board(rows: &[&[i8]]) -> Board {
    Board::from_codes(rows).expect("valid fixture")
}

fn set(cells: &[(u8, u8)]) -> MatchSet {
    cells.iter().map(|&(x, y)| TilePos::new(x, y)).collect()
}

/// 3x4 with a single run on row 2
fn gravity_fixture() -> Board {
    board(&[&[0, 1, 2], &[1, 2, 0], &[2, 2, 2], &[0, 1, 0]])
}

fn engine_for(board: Board) -> MatchEngine {
    let config = GameConfig {
        tile_type_count: 3,
        max_golden: 0,
        ..GameConfig::default()
    };
    MatchEngine::with_board(config, board).unwrap()
}

#[test]
fn test_from_codes_round_trips_values() {
    let b = board(&[&[0, -1, 9], &[3, 4, 5], &[7, 6, 1]]);
    assert_eq!(b.width(), 3);
    assert_eq!(b.height(), 3);
    assert_eq!(b.value(TilePos::new(1, 0)), TileValue::Empty);
    assert_eq!(b.value(TilePos::new(2, 0)), TileValue::Golden);
    assert_eq!(b.value(TilePos::new(0, 2)), TileValue::Normal(7));
    assert_eq!(b.golden_count(), 1);
    assert_eq!(b.empty_count(), 1);

    let mut codes = Vec::new();
    b.write_codes(&mut codes);
    assert_eq!(codes, vec![0, -1, 9, 3, 4, 5, 7, 6, 1]);
}

#[test]
fn test_from_codes_rejects_bad_input() {
    assert!(Board::from_codes(&[&[0, 1], &[0]]).is_none());
    assert!(Board::from_codes(&[&[0, 42, 1]]).is_none());
    assert!(Board::from_codes(&[]).is_none());
}

#[test]
fn test_tiles_keep_their_positions() {
    let b = gravity_fixture();
    for (i, tile) in b.tiles().iter().enumerate() {
        assert_eq!(tile.pos.x as usize, i % 3);
        assert_eq!(tile.pos.y as usize, i / 3);
    }
    assert!(b.get(TilePos::new(3, 0)).is_none());
    assert!(!b.contains(TilePos::new(0, 4)));
}

#[test]
fn test_neighbourhoods_clip_at_edges() {
    let b = gravity_fixture();
    assert_eq!(b.neighbors8(TilePos::new(0, 0)).len(), 3);
    assert_eq!(b.neighbors8(TilePos::new(1, 1)).len(), 8);
}

#[test]
fn test_scan_all_unions_crossing_runs() {
    // Row 1 and column 1 both run through (1, 1).
    let b = board(&[&[0, 1, 2, 0], &[1, 1, 1, 2], &[2, 1, 0, 0], &[0, 2, 2, 1]]);
    let expected = set(&[(0, 1), (1, 1), (2, 1), (1, 0), (1, 2)]);
    assert_eq!(scan_all(&b), expected);
    assert!(has_any_match(&b));
}

#[test]
fn test_golden_runs_match_but_empties_never_do() {
    let b = board(&[&[9, 9, 9], &[-1, 0, 1], &[-1, 1, 0], &[-1, 0, 1]]);
    assert_eq!(scan_all(&b), set(&[(0, 0), (1, 0), (2, 0)]));
}

#[test]
fn test_longer_runs_are_taken_whole() {
    let b = board(&[&[2, 2, 2, 2, 2], &[0, 1, 0, 1, 0], &[1, 0, 1, 0, 1]]);
    assert_eq!(scan_all(&b).len(), 5);
}

#[test]
fn test_swapped_view_does_not_touch_board() {
    let b = board(&[&[0, 1, 0, 3], &[3, 0, 2, 1], &[1, 2, 3, 2]]);
    let before = b.clone();

    let view = SwappedView::new(&b, TilePos::new(1, 0), TilePos::new(1, 1));
    assert_eq!(scan_all(&view), set(&[(0, 0), (1, 0), (2, 0)]));
    assert!(swap_creates_match(&b, TilePos::new(1, 0), TilePos::new(1, 1)));
    assert!(!swap_creates_match(&b, TilePos::new(0, 0), TilePos::new(0, 1)));
    assert_eq!(b, before);
}

#[test]
fn test_first_possible_move_on_deadlock() {
    let b = board(&[&[0, 1, 2], &[1, 2, 0], &[2, 0, 1]]);
    assert!(!has_any_match(&b));
    assert!(first_possible_move(&b).is_none());
}

#[test]
fn test_clear_gravity_refill_pipeline() {
    let mut engine = engine_for(gravity_fixture());
    let matches = engine.scan_all();
    assert_eq!(matches, set(&[(0, 2), (1, 2), (2, 2)]));

    let report = engine.clear(&matches, 1);
    assert_eq!(report.len(), 3);
    assert_eq!(report.ordinary, 3);
    assert_eq!(report.golden, 0);
    assert_eq!(engine.board().empty_count(), 3);

    let falls = engine.apply_gravity();
    assert_eq!(falls.len(), 6);
    assert!(falls.iter().all(|f| f.to.y == f.from.y + 1));
    let col0: Vec<TilePos> = falls
        .iter()
        .filter(|f| f.from.x == 0)
        .map(|f| f.from)
        .collect();
    assert_eq!(col0, vec![TilePos::new(0, 1), TilePos::new(0, 0)]);
    for x in 0..3 {
        assert_eq!(engine.board().empty_in_column(x), 1);
        assert!(engine.board().value(TilePos::new(x, 0)).is_empty());
    }
    assert_eq!(engine.board().value(TilePos::new(1, 2)), TileValue::Normal(2));

    let spawns = engine.refill();
    assert_eq!(spawns.len(), 3);
    assert!(spawns.iter().all(|s| s.fall_distance == 1 && s.tile.pos.y == 0));
    assert!(spawns
        .iter()
        .all(|s| matches!(s.tile.value, TileValue::Normal(k) if k < 3)));
    assert_eq!(engine.board().empty_count(), 0);

    let events = engine.take_events();
    let kinds: Vec<&str> = events.iter().map(GameEvent::name).collect();
    assert_eq!(kinds.first(), Some(&"matched"));
    assert_eq!(kinds.iter().filter(|k| **k == "tile_fell").count(), 6);
    assert_eq!(kinds.iter().filter(|k| **k == "tile_materialized").count(), 3);
}

#[test]
fn test_gravity_on_full_board_is_noop() {
    let mut engine = engine_for(board(&[&[0, 1, 2], &[1, 2, 0], &[2, 0, 1]]));
    assert!(engine.apply_gravity().is_empty());
    assert!(engine.refill().is_empty());
    assert!(engine.take_events().is_empty());
}
