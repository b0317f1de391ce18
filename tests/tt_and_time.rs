use cozy_chess::Board;
use kestrel::options::EngineOptions;
use kestrel::search::tt::{Bound, Entry, Tt};
use kestrel::search::{CancellationToken, SearchCoordinator, SearchWorker};
use kestrel::time::TimeBudget;
use kestrel::uci::UciEngine;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn no_book() -> EngineOptions {
    EngineOptions { use_book: false, ..EngineOptions::default() }
}

#[test]
fn tt_reduces_nodes_on_second_run() {
    let b = Board::default();
    let tt = Arc::new(Tt::with_capacity_mb(8));
    let mut w = SearchWorker::new(0, tt.clone());

    let first = CancellationToken::unbounded();
    w.think(&b, 4, &first, false);
    let second = CancellationToken::unbounded();
    w.think(&b, 4, &second, false);
    assert!(second.nodes() < first.nodes(), "TT did not reduce nodes: {} vs {}", second.nodes(), first.nodes());
}

#[test]
fn single_worker_honors_movetime() {
    let b = Board::default();
    let mut c = SearchCoordinator::new(1, Arc::new(Tt::with_capacity_mb(4)));
    let started = Instant::now();
    let out = c.run(&b, &TimeBudget { move_time_ms: Some(10), ..TimeBudget::default() });
    assert!(out.nodes > 0, "expected nodes>0 when only movetime is set");
    assert!(started.elapsed() < Duration::from_secs(3), "movetime overrun: {:?}", started.elapsed());
    assert!(out.result.best_move().is_some());
}

#[test]
fn node_limit_stops_single_worker() {
    let b = Board::default();
    let mut c = SearchCoordinator::new(1, Arc::new(Tt::with_capacity_mb(1)));
    let out = c.run(&b, &TimeBudget { move_time_ms: Some(99_999_999), node_limit: Some(5_000), depth: 64 });
    assert!(out.nodes <= 5_000, "node limit exceeded: {}", out.nodes);
    assert!(out.result.best_move().is_some());
}

#[test]
fn ucinewgame_clears_the_table() {
    let mut e = UciEngine::new(no_book());
    let mut out = Vec::new();
    e.run_loop("position startpos\ngo depth 3\n".as_bytes(), &mut out).unwrap();
    assert!(!e.tt().is_empty(), "search should populate the table");
    e.run_loop("ucinewgame\n".as_bytes(), &mut out).unwrap();
    assert!(e.tt().is_empty());
}

#[test]
fn hash_option_replaces_the_shared_table() {
    let mut e = UciEngine::new(no_book());
    let mut out = Vec::new();
    e.run_loop("setoption name Hash value 1\n".as_bytes(), &mut out).unwrap();
    assert_eq!(e.tt().capacity(), Tt::with_capacity_mb(1).capacity());
    assert!(Arc::ptr_eq(e.tt(), e.coordinator().tt()));
}

#[test]
fn clear_hash_button_empties_table() {
    let mut e = UciEngine::new(no_book());
    e.tt().put(Entry { key: 7, depth: 1, score: 0, best: None, bound: Bound::Exact, gen: 0 });
    let mut out = Vec::new();
    e.run_loop("setoption name Clear Hash\n".as_bytes(), &mut out).unwrap();
    assert!(e.tt().is_empty());
}
