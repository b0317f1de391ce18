//! Per-move time budgeting.
//!
//! A `go` command either names a strict limit (`depth`, `movetime`, `nodes`)
//! or hands over the clock state, in which case [`plan_move_time`] turns the
//! remaining time of the side to move into a per-move allowance.

use cozy_chess::Color;

pub const MAX_DEPTH: u32 = 64;
pub const DEFAULT_MOVES_TO_GO: i64 = 40;
/// Time allowance used when a node ceiling is the active stop condition.
pub const UNBOUNDED_MOVE_TIME_MS: u64 = 99_999_999;
/// Subtracted from every clock-derived allowance to absorb GUI and pipe lag.
pub const LAG_MARGIN_MS: i64 = 10;

/// Parsed arguments of a `go` command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoParameters {
    pub ponder: bool,
    pub depth: Option<i64>,
    pub movetime: Option<i64>,
    pub nodes: Option<i64>,
    pub wtime: Option<i64>,
    pub btime: Option<i64>,
    pub winc: Option<i64>,
    pub binc: Option<i64>,
    pub movestogo: i64,
}

impl Default for GoParameters {
    fn default() -> Self {
        Self {
            ponder: false,
            depth: None,
            movetime: None,
            nodes: None,
            wtime: None,
            btime: None,
            winc: None,
            binc: None,
            movestogo: DEFAULT_MOVES_TO_GO,
        }
    }
}

impl GoParameters {
    /// Parses the tokens following `go`. Unknown words are skipped and
    /// numeric arguments parse leniently (garbage reads as zero).
    pub fn parse<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut p = Self::default();
        let mut it = tokens.into_iter();
        while let Some(tok) = it.next() {
            let mut num = || it.next().map(parse_int_lenient).unwrap_or(0);
            match tok {
                "ponder" => p.ponder = true,
                "depth" => p.depth = Some(num()),
                "movetime" => p.movetime = Some(num()),
                "nodes" => p.nodes = Some(num()),
                "wtime" => p.wtime = Some(num()),
                "btime" => p.btime = Some(num()),
                "winc" => p.winc = Some(num()),
                "binc" => p.binc = Some(num()),
                "movestogo" => p.movestogo = num(),
                _ => {}
            }
        }
        p
    }

    /// Depth, movetime or nodes bypass the clock arithmetic entirely.
    pub fn is_strict(&self) -> bool {
        self.depth.is_some() || self.movetime.is_some() || self.nodes.is_some()
    }
}

/// Reads an optional sign and leading digits, like C's `atoi`.
pub fn parse_int_lenient(s: &str) -> i64 {
    let s = s.trim();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut v: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        v = v.saturating_mul(10).saturating_add((b - b'0') as i64);
    }
    if neg { -v } else { v }
}

/// Limits for one search episode. `move_time_ms` and `node_limit` may both be
/// set, in which case whichever is hit first stops the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeBudget {
    pub move_time_ms: Option<u64>,
    pub node_limit: Option<u64>,
    pub depth: u32,
}

impl Default for TimeBudget {
    fn default() -> Self { Self { move_time_ms: None, node_limit: None, depth: MAX_DEPTH } }
}

impl TimeBudget {
    pub fn fixed_depth(depth: u32) -> Self {
        Self { depth: depth.clamp(1, MAX_DEPTH), ..Self::default() }
    }

    pub fn from_go(go: &GoParameters, side: Color, time_percentage: i64) -> Self {
        let mut budget = Self::default();
        if let Some(d) = go.depth {
            budget.depth = d.clamp(1, MAX_DEPTH as i64) as u32;
        }
        if let Some(n) = go.nodes {
            if n > 0 {
                budget.node_limit = Some(n as u64);
                budget.move_time_ms = Some(UNBOUNDED_MOVE_TIME_MS);
            }
        }
        if let Some(t) = go.movetime {
            budget.move_time_ms = Some(t.max(0) as u64);
        }
        if !go.is_strict() {
            let (base, inc) = match side {
                Color::White => (go.wtime, go.winc),
                Color::Black => (go.btime, go.binc),
            };
            if let Some(base) = base.filter(|&b| b >= 0) {
                let t = plan_move_time(base, inc.unwrap_or(0), go.movestogo, time_percentage);
                budget.move_time_ms = Some(t as u64);
            }
        }
        budget
    }
}

/// Turns clock state into a move-time allowance in milliseconds.
///
/// The steps run in a fixed order; reordering them changes results.
pub fn plan_move_time(base: i64, inc: i64, moves_to_go: i64, time_percentage: i64) -> i64 {
    let moves_to_go = moves_to_go.max(1);
    let mut base = base;
    if moves_to_go == 1 {
        base -= (base / 10).min(1000);
    }
    // clock fields are host input; saturate instead of overflowing
    let mut t = base.saturating_add(inc.saturating_mul(moves_to_go - 1)) / moves_to_go;

    // this move would eat more than half the clock
    if t.saturating_mul(2) > base {
        t = t.saturating_mul(time_percentage) / 100;
    }
    t = t.min(base);
    t = t.saturating_sub(LAG_MARGIN_MS);
    t = t.max(0);
    bullet_correction(t)
}

/// Stepwise shrink of very short allowances.
pub fn bullet_correction(t: i64) -> i64 {
    if t < 200 {
        t * 23 / 32
    } else if t < 400 {
        t * 26 / 32
    } else if t < 1200 {
        t * 29 / 32
    } else {
        t
    }
}
