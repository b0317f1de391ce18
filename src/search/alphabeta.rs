use cozy_chess::{Board, Color, Move};
use std::sync::Arc;
use crate::search::cancel::CancellationToken;
use crate::search::eval::{eval_cp, piece_value, DRAW_SCORE, MATE_BOUND, MATE_SCORE};
use crate::search::tt::{Bound, Entry, Tt};

pub const MAX_PLY: usize = 128;

/// Outcome of one completed root iteration.
#[derive(Clone, Debug, Default)]
pub struct RootResult {
    pub score_cp: i32,
    pub pv: Vec<Move>,
}

/// Alpha-beta tree search over a position snapshot.
///
/// Every visited node is counted into the episode's token, so stopping on
/// cancellation or on the node ceiling happens at node granularity. With
/// `checks_clock` set the searcher also polls the deadline itself, which is
/// how a lone worker stops without a timer thread.
pub struct Searcher {
    tt: Arc<Tt>,
    nodes: u64,
    killers: Vec<[Option<Move>; 2]>,
    pv: Vec<Vec<Move>>,
    stopped: bool,
    checks_clock: bool,
    root_best: Option<Move>,
}

impl Searcher {
    pub fn new(tt: Arc<Tt>) -> Self {
        Self {
            tt,
            nodes: 0,
            killers: vec![[None, None]; MAX_PLY],
            pv: vec![Vec::new(); MAX_PLY],
            stopped: false,
            checks_clock: false,
            root_best: None,
        }
    }

    pub fn tt(&self) -> &Arc<Tt> { &self.tt }

    pub fn set_tt(&mut self, tt: Arc<Tt>) { self.tt = tt; }

    pub fn nodes(&self) -> u64 { self.nodes }

    /// Best root move seen so far in the current (possibly unfinished) iteration.
    pub fn partial_best(&self) -> Option<Move> { self.root_best }

    /// Prepares for a new episode.
    pub fn reset(&mut self, checks_clock: bool) {
        self.nodes = 0;
        self.stopped = false;
        self.checks_clock = checks_clock;
        self.root_best = None;
        for k in &mut self.killers { *k = [None, None]; }
    }

    /// Searches the root to `depth`. Returns `None` when the iteration was cut
    /// short by cancellation; its partial result must not be trusted.
    pub fn search_root(&mut self, board: &Board, depth: u32, token: &CancellationToken) -> Option<RootResult> {
        if self.stopped { return None; }
        let score = self.alphabeta(board, depth.max(1), -MATE_SCORE, MATE_SCORE, 0, token);
        if self.stopped { return None; }
        Some(RootResult { score_cp: score, pv: self.pv[0].clone() })
    }

    #[inline]
    fn visit(&mut self, token: &CancellationToken) -> bool {
        if self.stopped { return false; }
        if token.is_cancelled() || !token.count_node() {
            self.stopped = true;
            return false;
        }
        self.nodes += 1;
        if self.checks_clock && self.nodes & 1023 == 0 && token.time_exceeded() {
            token.cancel();
            self.stopped = true;
            return false;
        }
        true
    }

    fn alphabeta(&mut self, board: &Board, depth: u32, mut alpha: i32, beta: i32, ply: usize, token: &CancellationToken) -> i32 {
        if !self.visit(token) { return 0; }
        self.pv[ply].clear();
        if ply > 0 && board.halfmove_clock() >= 100 { return DRAW_SCORE; }
        if ply >= MAX_PLY - 1 { return eval_cp(board); }
        if depth == 0 { return self.qsearch(board, alpha, beta, ply, token); }

        let key = board.hash();
        let mut tt_move = None;
        if let Some(e) = self.tt.get(key) {
            tt_move = e.best;
            if ply > 0 && e.depth >= depth {
                let s = score_from_tt(e.score, ply);
                match e.bound {
                    Bound::Exact => return s,
                    Bound::Lower if s >= beta => return s,
                    Bound::Upper if s <= alpha => return s,
                    _ => {}
                }
            }
        }

        let moves = self.ordered_moves(board, tt_move, ply);
        if moves.is_empty() {
            return if board.checkers().is_empty() { DRAW_SCORE } else { -MATE_SCORE + ply as i32 };
        }

        let orig_alpha = alpha;
        let mut best = -MATE_SCORE;
        let mut best_move = None;
        for m in moves {
            let mut child = board.clone();
            child.play(m);
            let score = -self.alphabeta(&child, depth - 1, -beta, -alpha, ply + 1, token);
            if self.stopped { return 0; }
            if score > best {
                best = score;
                best_move = Some(m);
                if ply == 0 { self.root_best = Some(m); }
                if score > alpha {
                    alpha = score;
                    let (head, tail) = self.pv.split_at_mut(ply + 1);
                    head[ply].clear();
                    head[ply].push(m);
                    head[ply].extend_from_slice(&tail[0]);
                }
            }
            if alpha >= beta {
                if !is_tactical(board, m) { self.update_killers(ply, m); }
                break;
            }
        }

        let bound = if best <= orig_alpha { Bound::Upper } else if best >= beta { Bound::Lower } else { Bound::Exact };
        self.tt.put(Entry { key, depth, score: score_to_tt(best, ply), best: best_move, bound, gen: 0 });
        best
    }

    fn qsearch(&mut self, board: &Board, mut alpha: i32, beta: i32, ply: usize, token: &CancellationToken) -> i32 {
        if !self.visit(token) { return 0; }
        self.pv[ply].clear();
        let stand = eval_cp(board);
        if stand >= beta { return stand; }
        if stand > alpha { alpha = stand; }
        if ply >= MAX_PLY - 1 { return stand; }

        let mut caps: Vec<(i32, Move)> = Vec::new();
        board.generate_moves(|ml| {
            for m in ml {
                if is_tactical(board, m) { caps.push((mvv_lva(board, m), m)); }
            }
            false
        });
        caps.sort_by_key(|&(s, _)| -s);
        for (_, m) in caps {
            let mut child = board.clone();
            child.play(m);
            let score = -self.qsearch(&child, -beta, -alpha, ply + 1, token);
            if self.stopped { return 0; }
            if score >= beta { return score; }
            if score > alpha { alpha = score; }
        }
        alpha
    }

    fn ordered_moves(&self, board: &Board, tt_move: Option<Move>, ply: usize) -> Vec<Move> {
        let mut scored: Vec<(i32, Move)> = Vec::with_capacity(64);
        let killers = self.killers[ply];
        board.generate_moves(|ml| {
            for m in ml {
                let s = if Some(m) == tt_move {
                    1_000_000
                } else if is_tactical(board, m) {
                    100_000 + mvv_lva(board, m)
                } else if killers[0] == Some(m) {
                    50_000
                } else if killers[1] == Some(m) {
                    40_000
                } else {
                    0
                };
                scored.push((s, m));
            }
            false
        });
        // stable: equal scores keep generation order, keeping searches deterministic
        scored.sort_by_key(|&(s, _)| -s);
        scored.into_iter().map(|(_, m)| m).collect()
    }

    fn update_killers(&mut self, ply: usize, m: Move) {
        let slot = &mut self.killers[ply];
        if slot[0] == Some(m) { return; }
        slot[1] = slot[0];
        slot[0] = Some(m);
    }
}

fn opponent(c: Color) -> Color {
    if c == Color::White { Color::Black } else { Color::White }
}

fn is_tactical(board: &Board, m: Move) -> bool {
    m.promotion.is_some() || board.colors(opponent(board.side_to_move())).has(m.to)
}

fn mvv_lva(board: &Board, m: Move) -> i32 {
    let victim = board.piece_on(m.to).map(piece_value).unwrap_or(0);
    let attacker = board.piece_on(m.from).map(piece_value).unwrap_or(0);
    let promo = m.promotion.map(piece_value).unwrap_or(0);
    victim * 10 + promo - attacker / 10
}

fn score_to_tt(s: i32, ply: usize) -> i32 {
    if s > MATE_BOUND { s + ply as i32 } else if s < -MATE_BOUND { s - ply as i32 } else { s }
}

fn score_from_tt(s: i32, ply: usize) -> i32 {
    if s > MATE_BOUND { s - ply as i32 } else if s < -MATE_BOUND { s + ply as i32 } else { s }
}
