use cozy_chess::Board;
use std::sync::Arc;

#[test]
fn eval_startpos_is_zeroish() {
    use kestrel::search::eval::eval_cp;
    let cp = eval_cp(&Board::default());
    assert!(cp.abs() < 5, "startpos eval not near zero: {cp}");
}

#[test]
fn search_returns_legal_move_startpos() {
    use kestrel::search::{CancellationToken, SearchWorker};
    use kestrel::search::tt::Tt;
    let b = Board::default();
    let mut w = SearchWorker::new(0, Arc::new(Tt::with_capacity_mb(1)));
    let r = w.think(&b, 1, &CancellationToken::unbounded(), false);
    assert_eq!(r.completed_depth, 1);
    let bm = r.best_move().expect("no move found at depth 1");
    assert!(kestrel::board::cozy::parse_move_text(&b, bm).is_ok(), "illegal best move {bm}");
}

#[test]
fn search_prefers_winning_queen_capture() {
    use kestrel::search::{CancellationToken, SearchWorker};
    use kestrel::search::tt::Tt;
    // Qe2xd2 wins a queen
    let b = Board::from_fen("k7/8/8/8/8/8/3qQ3/7K w - - 0 1", false).expect("valid fen");
    let mut w = SearchWorker::new(0, Arc::new(Tt::with_capacity_mb(1)));
    let r = w.think(&b, 1, &CancellationToken::unbounded(), false);
    assert_eq!(r.best_move(), Some("e2d2"));
}

#[test]
fn search_finds_back_rank_mate() {
    use kestrel::search::eval::MATE_BOUND;
    use kestrel::search::{CancellationToken, SearchWorker};
    use kestrel::search::tt::Tt;
    let b = Board::from_fen("6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1", false).expect("valid fen");
    let mut w = SearchWorker::new(0, Arc::new(Tt::with_capacity_mb(1)));
    let r = w.think(&b, 3, &CancellationToken::unbounded(), false);
    assert_eq!(r.best_move(), Some("d1d8"));
    assert!(r.score_cp >= MATE_BOUND, "expected a mate score, got {}", r.score_cp);
}

#[test]
fn checkmated_side_has_no_move() {
    use kestrel::search::{CancellationToken, SearchWorker};
    use kestrel::search::tt::Tt;
    let b = Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3", false).expect("valid fen");
    let mut w = SearchWorker::new(0, Arc::new(Tt::with_capacity_mb(1)));
    let r = w.think(&b, 2, &CancellationToken::unbounded(), false);
    assert!(r.best_move().is_none());
}
