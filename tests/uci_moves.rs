use cozy_chess::Color;
use kestrel::board::cozy::Position;
use kestrel::uci::UciEngine;
use kestrel::EngineError;
use std::io::Cursor;

fn feed(engine: &mut UciEngine, script: &str) -> String {
    let mut out = Vec::new();
    engine.run_loop(Cursor::new(script.to_owned()), &mut out).expect("in-memory io");
    String::from_utf8(out).expect("utf8 output")
}

#[test]
fn apply_startpos_moves_sequence() {
    let moves = vec!["e2e4".to_string(), "e7e5".to_string(), "g1f3".to_string()];
    let pos = Position::set_from_start_and_moves(&moves).expect("legal move sequence");
    assert_eq!(pos.side_to_move(), Color::Black, "expected black to move after 3 plies");
    assert_eq!(pos.plies_from_start(), 3);
}

#[test]
fn take_back_stops_at_irreversible_move() {
    let mut pos = Position::startpos();
    pos.make_moves(["g1f3", "g8f6"]).unwrap();
    assert_eq!(pos.history_len(), 2);
    pos.make_move_uci("e2e4").unwrap();
    assert_eq!(pos.history_len(), 0, "pawn move must truncate history");
    pos.make_moves(["b8c6", "f1c4"]).unwrap();

    pos.take_back().expect("f1c4 can be taken back");
    pos.take_back().expect("b8c6 can be taken back");
    assert!(matches!(pos.take_back(), Err(EngineError::NothingToTakeBack)));
    assert_eq!(pos.side_to_move(), Color::Black, "position stays right after e2e4");
}

#[test]
fn capture_truncates_history() {
    let mut pos = Position::startpos();
    pos.make_moves(["e2e4", "d7d5", "g1f3", "b8c6"]).unwrap();
    assert_eq!(pos.history_len(), 2);
    pos.make_move_uci("e4d5").unwrap();
    assert_eq!(pos.history_len(), 0);
    assert!(pos.take_back().is_err());
}

#[test]
fn illegal_move_is_rejected() {
    let mut pos = Position::startpos();
    assert!(matches!(pos.make_move_uci("e2e5"), Err(EngineError::IllegalMove(_))));
    assert!(pos.make_move_uci("zz").is_err());
    assert_eq!(pos.plies_from_start(), 0);
}

#[test]
fn position_command_replays_moves() {
    let mut e = UciEngine::default();
    feed(&mut e, "position startpos moves e2e4 e7e5 e1e2\n");
    assert_eq!(e.position().plies_from_start(), 3);
    assert_eq!(e.position().side_to_move(), Color::Black);

    feed(&mut e, "position fen r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1 moves e1g1 e8c8\n");
    assert_eq!(e.position().side_to_move(), Color::White);
    assert_eq!(e.position().plies_from_start(), 2);
}

#[test]
fn replay_stops_at_first_bad_move() {
    let mut e = UciEngine::default();
    feed(&mut e, "position startpos moves e2e4 e2e4 d2d4\n");
    assert_eq!(e.position().plies_from_start(), 1);
}

#[test]
fn malformed_fen_falls_back_to_startpos() {
    let mut e = UciEngine::default();
    feed(&mut e, "position fen not/a/fen w - - 0 1 moves e2e4\n");
    assert_eq!(e.position().plies_from_start(), 1);
    assert_eq!(e.position().side_to_move(), Color::Black);
}

#[test]
fn step_and_undo_work_on_the_session() {
    let mut e = UciEngine::default();
    feed(&mut e, "position startpos\nstep g1f3 g8f6\nundo\n");
    assert_eq!(e.position().plies_from_start(), 1);
    assert_eq!(e.position().side_to_move(), Color::Black);
}

#[test]
fn ucinewgame_resets_ply_counter() {
    let mut e = UciEngine::default();
    feed(&mut e, "position startpos moves d2d4 d7d5\nucinewgame\n");
    assert_eq!(e.position().plies_from_start(), 0);
}
