use cozy_chess::Board;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use crate::search::cancel::CancellationToken;
use crate::search::tt::Tt;
use crate::search::worker::{SearchWorker, WorkerResult};
use crate::time::TimeBudget;

pub const TIMER_POLL: Duration = Duration::from_millis(5);

#[derive(Clone, Debug, Default)]
pub struct SearchOutcome {
    /// Index of the worker whose result was selected.
    pub worker: usize,
    pub result: WorkerResult,
    /// Nodes counted by all workers together.
    pub nodes: u64,
    pub elapsed: Duration,
}

impl SearchOutcome {
    /// The `bestmove` line for this outcome.
    pub fn bestmove_line(&self) -> String {
        match (self.result.best_move(), self.result.ponder_move()) {
            (Some(b), Some(p)) => format!("bestmove {} ponder {}", b, p),
            (Some(b), None) => format!("bestmove {}", b),
            _ => "bestmove 0000".to_string(),
        }
    }
}

/// Runs a fixed set of workers against one position snapshot per episode.
pub struct SearchCoordinator {
    tt: Arc<Tt>,
    workers: Vec<SearchWorker>,
    tuning: bool,
    episodes: u64,
}

impl SearchCoordinator {
    pub fn new(threads: usize, tt: Arc<Tt>) -> Self {
        let mut c = Self { tt, workers: Vec::new(), tuning: false, episodes: 0 };
        c.set_threads(threads);
        c
    }

    pub fn threads(&self) -> usize { self.workers.len() }

    /// Resizes the worker set. Only called between episodes.
    pub fn set_threads(&mut self, threads: usize) {
        let n = threads.max(1);
        self.workers.truncate(n);
        while self.workers.len() < n {
            let id = self.workers.len();
            self.workers.push(SearchWorker::new(id, self.tt.clone()));
        }
    }

    pub fn tt(&self) -> &Arc<Tt> { &self.tt }

    pub fn set_tt(&mut self, tt: Arc<Tt>) {
        for w in &mut self.workers { w.set_tt(tt.clone()); }
        self.tt = tt;
    }

    /// In tuning mode nothing stops a search on time, neither the timer nor a
    /// lone worker's own clock checks. Library-only: no protocol command or
    /// option turns it on.
    pub fn set_tuning(&mut self, tuning: bool) { self.tuning = tuning; }

    pub fn is_tuning(&self) -> bool { self.tuning }

    /// Number of search episodes run so far.
    pub fn episodes(&self) -> u64 { self.episodes }

    pub fn workers(&self) -> &[SearchWorker] { &self.workers }

    pub fn run(&mut self, board: &Board, budget: &TimeBudget) -> SearchOutcome {
        let token = CancellationToken::new(budget);
        self.run_with_token(board, budget.depth, &token)
    }

    /// Runs one episode against a token the caller may cancel at any time,
    /// e.g. on `stop`. The token carries the episode's time and node limits.
    pub fn run_with_token(&mut self, board: &Board, depth: u32, token: &CancellationToken) -> SearchOutcome {
        self.episodes += 1;
        log::debug!(
            "episode {}: {} worker(s), depth {}, movetime {:?}, nodes {:?}",
            self.episodes, self.workers.len(), depth, token.move_time(), token.node_limit()
        );

        let tuning = self.tuning;
        if self.workers.len() == 1 {
            self.workers[0].think(board, depth, token, !tuning);
        } else {
            thread::scope(|s| {
                let handles: Vec<_> = self
                    .workers
                    .iter_mut()
                    .map(|w| s.spawn(move || { w.think(board, depth, token, false); }))
                    .collect();
                let timer = s.spawn(move || run_timer(token, tuning));
                for (i, h) in handles.into_iter().enumerate() {
                    if h.join().is_err() { log::error!("search worker {} panicked", i); }
                }
                // workers are done; make sure the timer loop ends
                token.cancel();
                if timer.join().is_err() { log::error!("search timer panicked"); }
            });
        }
        token.cancel();

        let results: Vec<WorkerResult> = self.workers.iter().map(|w| w.result().clone()).collect();
        let worker = select_best(&results).unwrap_or(0);
        let outcome = SearchOutcome {
            worker,
            result: results.get(worker).cloned().unwrap_or_default(),
            nodes: token.nodes(),
            elapsed: token.elapsed(),
        };
        log::debug!(
            "episode {}: worker {} selected at depth {}, {} nodes in {:?}",
            self.episodes, worker, outcome.result.completed_depth, outcome.nodes, outcome.elapsed
        );
        outcome
    }
}

/// Polls the clock until the token is set, setting it once time runs out.
fn run_timer(token: &CancellationToken, tuning: bool) {
    while !token.is_cancelled() {
        thread::sleep(TIMER_POLL);
        if !tuning && token.time_exceeded() { token.cancel(); }
    }
}

/// Index of the result with the strictly greatest completed depth; the
/// earliest worker wins ties.
pub fn select_best(results: &[WorkerResult]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, r) in results.iter().enumerate() {
        if best.map_or(true, |(_, d)| r.completed_depth > d) {
            best = Some((i, r.completed_depth));
        }
    }
    best.map(|(i, _)| i)
}
