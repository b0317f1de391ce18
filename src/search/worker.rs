use cozy_chess::Board;
use std::sync::Arc;
use crate::board::cozy::{format_line, format_move_text};
use crate::search::alphabeta::Searcher;
use crate::search::cancel::CancellationToken;
use crate::search::tt::Tt;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerResult {
    /// Deepest fully searched iteration; never decreases within an episode.
    pub completed_depth: u32,
    /// Principal variation in UCI text; first = best move, second = ponder move.
    pub pv: Vec<String>,
    pub score_cp: i32,
    pub nodes: u64,
}

impl WorkerResult {
    pub fn best_move(&self) -> Option<&str> { self.pv.first().map(String::as_str) }
    pub fn ponder_move(&self) -> Option<&str> { self.pv.get(1).map(String::as_str) }
}

/// One independent iterative-deepening search instance.
pub struct SearchWorker {
    id: usize,
    searcher: Searcher,
    result: WorkerResult,
}

impl SearchWorker {
    pub fn new(id: usize, tt: Arc<Tt>) -> Self {
        Self { id, searcher: Searcher::new(tt), result: WorkerResult::default() }
    }

    pub fn id(&self) -> usize { self.id }

    pub fn set_tt(&mut self, tt: Arc<Tt>) { self.searcher.set_tt(tt); }

    /// Runs iterative deepening up to `depth` until done or cancelled.
    ///
    /// Reaching `depth` cancels the token, which ends the episode for the
    /// other workers and the timer as well.
    pub fn think(&mut self, board: &Board, depth: u32, token: &CancellationToken, checks_clock: bool) -> &WorkerResult {
        self.result = WorkerResult::default();
        self.searcher.reset(checks_clock);
        // odd helpers skip depth 1 so the workers are not in lockstep
        let first = if self.id % 2 == 1 && depth > 1 { 2 } else { 1 };

        for d in first..=depth {
            if self.id == 0 { self.searcher.tt().bump_generation(); }
            let Some(r) = self.searcher.search_root(board, d, token) else { break };
            self.result.completed_depth = d;
            self.result.score_cp = r.score_cp;
            self.result.pv = format_line(board, &r.pv);
            log::trace!("worker {} depth {} score {} pv {}", self.id, d, r.score_cp, self.result.pv.join(" "));
            if token.is_cancelled() { break; }
        }
        if !token.is_cancelled() { token.cancel(); }

        if self.result.pv.is_empty() {
            let fallback = self.searcher.partial_best().or_else(|| first_legal_move(board));
            if let Some(m) = fallback { self.result.pv.push(format_move_text(board, m)); }
        }
        self.result.nodes = self.searcher.nodes();
        &self.result
    }

    pub fn completed_depth(&self) -> u32 { self.result.completed_depth }

    pub fn principal_variation(&self) -> &[String] { &self.result.pv }

    pub fn result(&self) -> &WorkerResult { &self.result }
}

fn first_legal_move(board: &Board) -> Option<cozy_chess::Move> {
    let mut found = None;
    board.generate_moves(|ml| {
        found = ml.into_iter().next();
        found.is_some()
    });
    found
}
