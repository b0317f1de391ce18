use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use crate::bench::{run_bench, BENCH_POSITIONS, DEFAULT_BENCH_DEPTH};
use crate::board::cozy::Position;
use crate::book::{internal_book, LineBook, OpeningBookResolver, GUIDE_BOOK, MAIN_BOOK};
use crate::options::{parse_setoption, EngineOptions, OptionChange, UCI_OPTIONS};
use crate::search::cancel::CancellationToken;
use crate::search::coordinator::{SearchCoordinator, SearchOutcome};
use crate::search::tt::Tt;
use crate::time::{parse_int_lenient, GoParameters, TimeBudget};

pub const ENGINE_NAME: &str = "Kestrel 0.1";
pub const ENGINE_AUTHOR: &str = "Kestrel Team";
/// How often the command loop looks at its input while a search runs.
pub const INPUT_POLL: Duration = Duration::from_millis(5);

/// Whether the loop should keep reading after a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Protocol front end: owns the session position and every component a
/// `go` needs.
///
/// Input is read on its own thread. While a search runs the loop keeps
/// answering `isready` and honours `stop` and `quit`; any other command is
/// held back until `bestmove` is out, so the position never changes under a
/// running search.
pub struct UciEngine {
    pos: Position,
    options: EngineOptions,
    tt: Arc<Tt>,
    coordinator: SearchCoordinator,
    books: OpeningBookResolver,
    protocol_mode: bool,
    should_clear: bool,
    input: Option<Receiver<String>>,
    deferred: VecDeque<String>,
}

impl Default for UciEngine {
    fn default() -> Self { Self::new(EngineOptions::default()) }
}

impl UciEngine {
    /// Builds the engine with the standard book chain: guide and main books
    /// from the configured files (when present), then the internal book.
    pub fn new(options: EngineOptions) -> Self {
        let mut books = OpeningBookResolver::new();
        books.push(Box::new(internal_book(rand::random())));
        let mut engine = Self::with_books(options, books);
        if let Some(p) = engine.options.guide_book.clone() { engine.load_book(GUIDE_BOOK, Some(p)); }
        if let Some(p) = engine.options.main_book.clone() { engine.load_book(MAIN_BOOK, Some(p)); }
        engine
    }

    pub fn with_books(options: EngineOptions, books: OpeningBookResolver) -> Self {
        let tt = Arc::new(Tt::with_capacity_mb(options.hash_mb));
        let coordinator = SearchCoordinator::new(options.threads, tt.clone());
        Self {
            pos: Position::startpos(),
            options,
            tt,
            coordinator,
            books,
            protocol_mode: false,
            should_clear: false,
            input: None,
            deferred: VecDeque::new(),
        }
    }

    pub fn position(&self) -> &Position { &self.pos }

    pub fn options(&self) -> &EngineOptions { &self.options }

    pub fn coordinator(&self) -> &SearchCoordinator { &self.coordinator }

    pub fn tt(&self) -> &Arc<Tt> { &self.tt }

    pub fn books(&self) -> &OpeningBookResolver { &self.books }

    /// True once `uci` was received; before that the engine is in console mode.
    pub fn is_protocol_mode(&self) -> bool { self.protocol_mode }

    /// Reads commands until `quit` or end of input, writing replies to `out`.
    pub fn run_loop<R, W>(&mut self, input: R, mut out: W) -> io::Result<()>
    where
        R: BufRead + Send + 'static,
        W: Write,
    {
        let (tx, rx) = mpsc::channel();
        // detached: a blocked read must not keep `quit` from returning
        thread::spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() { break; }
            }
        });
        self.input = Some(rx);
        let result = self.drain_input(&mut out);
        self.input = None;
        self.deferred.clear();
        result
    }

    fn drain_input<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        loop {
            let line = match self.deferred.pop_front() {
                Some(line) => line,
                None => match self.input.as_ref().map(Receiver::recv) {
                    Some(Ok(line)) => line,
                    // end of input is an implicit quit
                    _ => return Ok(()),
                },
            };
            let flow = self.handle_line(&line, out)?;
            out.flush()?;
            if flow == Flow::Quit { return Ok(()); }
        }
    }

    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim_start()),
            None => (line, ""),
        };
        match cmd {
            "uci" => self.cmd_uci(out)?,
            "ucinewgame" => self.cmd_ucinewgame(),
            "isready" => writeln!(out, "readyok")?,
            "setoption" | "so" => self.cmd_setoption(rest),
            "position" => self.cmd_position(rest),
            "go" => return self.cmd_go(rest, out),
            // no search is running here
            "stop" | "ponderhit" => {}
            "print" => write!(out, "{}", self.pos.diagram())?,
            "step" => self.replay(rest.split_whitespace()),
            "undo" => {
                if let Err(e) = self.pos.take_back() { log::warn!("undo rejected: {}", e); }
            }
            "bench" => self.cmd_bench(rest, out)?,
            "quit" => return Ok(Flow::Quit),
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn cmd_uci<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        self.protocol_mode = true;
        writeln!(out, "id name {}", ENGINE_NAME)?;
        writeln!(out, "id author {}", ENGINE_AUTHOR)?;
        for opt in UCI_OPTIONS { writeln!(out, "{}", opt)?; }
        writeln!(out, "uciok")
    }

    fn cmd_ucinewgame(&mut self) {
        self.tt.clear();
        self.pos.reset_counters();
        self.should_clear = false;
    }

    fn cmd_setoption(&mut self, args: &str) {
        let Some((name, value)) = parse_setoption(args) else { return };
        match self.options.set(&name, &value) {
            Some(OptionChange::Hash(mb)) => {
                self.tt = Arc::new(Tt::with_capacity_mb(mb));
                self.coordinator.set_tt(self.tt.clone());
            }
            Some(OptionChange::Threads(n)) => self.coordinator.set_threads(n),
            Some(OptionChange::ClearHash) => self.tt.clear(),
            Some(OptionChange::GuideBook(p)) => self.load_book(GUIDE_BOOK, p),
            Some(OptionChange::MainBook(p)) => self.load_book(MAIN_BOOK, p),
            Some(OptionChange::Strength) => self.should_clear = true,
            Some(OptionChange::Other) => {}
            None => log::debug!("ignoring unknown option '{}'", name),
        }
    }

    fn load_book(&mut self, name: &str, path: Option<std::path::PathBuf>) {
        let Some(path) = path else {
            self.books.remove(name);
            return;
        };
        match LineBook::load(name, &path) {
            Ok(book) => self.books.replace(Box::new(book)),
            Err(e) => {
                log::warn!("{} book unavailable: {:#}", name, e);
                self.books.remove(name);
            }
        }
    }

    fn cmd_position(&mut self, args: &str) {
        let mut tokens = args.split_whitespace();
        let mut next = tokens.next();
        if next == Some("fen") {
            let mut fields = Vec::new();
            next = None;
            for tok in tokens.by_ref() {
                if tok == "moves" {
                    next = Some(tok);
                    break;
                }
                fields.push(tok);
            }
            let fen = fields.join(" ");
            self.pos = Position::from_fen(&fen).unwrap_or_else(|e| {
                log::warn!("{}; using the start position", e);
                Position::startpos()
            });
        } else {
            self.pos = Position::startpos();
            if next == Some("startpos") { next = tokens.next(); }
        }
        if next == Some("moves") { self.replay(tokens); }
    }

    fn replay<'a, I: Iterator<Item = &'a str>>(&mut self, moves: I) {
        if let Err(e) = self.pos.make_moves(moves) {
            log::warn!("move replay stopped: {}", e);
        }
    }

    /// Book chain first; only a miss starts the search workers.
    fn cmd_go<W: Write>(&mut self, args: &str, out: &mut W) -> io::Result<Flow> {
        let go = GoParameters::parse(args.split_whitespace());
        let mut budget = TimeBudget::from_go(&go, self.pos.side_to_move(), self.options.time_percentage);
        if let Some(cap) = self.options.strength_depth_cap() { budget.depth = budget.depth.min(cap); }
        if go.ponder { log::debug!("ponder search runs under the normal budget"); }

        if self.should_clear {
            // options changed since the last search; cached scores are stale
            self.tt.clear();
            self.should_clear = false;
        }

        let plies = self.pos.plies_from_start();
        if self.options.use_book && plies <= self.options.book_depth {
            writeln!(out, "info string bd {} mfs {}", self.options.book_depth, plies)?;
            log::debug!("consulting books {:?} at ply {}", self.books.names(), plies);
            if let Some(hit) = self.books.resolve(self.pos.board()) {
                log::info!("book move {} from {} book", hit.text, hit.source);
                writeln!(out, "bestmove {}", hit.text)?;
                return Ok(Flow::Continue);
            }
        }

        let token = CancellationToken::new(&budget);
        let (outcome, flow) = match self.input.as_ref() {
            Some(rx) => {
                let board = self.pos.board().clone();
                let coordinator = &mut self.coordinator;
                let deferred = &mut self.deferred;
                let token = &token;
                thread::scope(|s| {
                    let search = s.spawn(move || coordinator.run_with_token(&board, budget.depth, token));
                    let flow = serve_during_search(rx, out, token, deferred, || search.is_finished());
                    if flow.is_err() { token.cancel(); }
                    let outcome = search.join().unwrap_or_else(|_| {
                        log::error!("search thread panicked");
                        SearchOutcome::default()
                    });
                    flow.map(|f| (outcome, f))
                })?
            }
            // driven line by line without an input thread: search in place
            None => (self.coordinator.run_with_token(self.pos.board(), budget.depth, &token), Flow::Continue),
        };
        if flow == Flow::Quit { return Ok(Flow::Quit); }
        write_info(out, &outcome)?;
        writeln!(out, "{}", outcome.bestmove_line())?;
        Ok(Flow::Continue)
    }

    fn cmd_bench<W: Write>(&mut self, args: &str, out: &mut W) -> io::Result<()> {
        let depth = args.split_whitespace().next().map(parse_int_lenient).unwrap_or(0).max(0) as u32;
        let depth = if depth == 0 { DEFAULT_BENCH_DEPTH } else { depth };
        writeln!(out, "Bench test started (depth {}): ", depth)?;
        let mut write_err = None;
        let result = run_bench(BENCH_POSITIONS, depth, &self.tt, |_, fen| {
            if write_err.is_none() {
                write_err = writeln!(out, "{}", fen).err();
            }
        });
        if let Some(e) = write_err { return Err(e); }
        match result {
            Ok(report) => writeln!(out, "{}", report.summary_line())?,
            Err(e) => log::warn!("bench aborted: {}", e),
        }
        // the table now holds benchmark positions
        self.should_clear = true;
        Ok(())
    }
}

/// Handles input that arrives while a search runs, until `finished` reports
/// the search is over. `isready` is answered at once, `stop` and `quit`
/// cancel the episode, and everything else waits in `deferred`.
fn serve_during_search<W, F>(
    rx: &Receiver<String>,
    out: &mut W,
    token: &CancellationToken,
    deferred: &mut VecDeque<String>,
    finished: F,
) -> io::Result<Flow>
where
    W: Write,
    F: Fn() -> bool,
{
    while !finished() {
        let line = match rx.recv_timeout(INPUT_POLL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            // input closed: let the search run out, then the loop ends
            Err(RecvTimeoutError::Disconnected) => break,
        };
        match line.split_whitespace().next() {
            Some("isready") => {
                writeln!(out, "readyok")?;
                out.flush()?;
            }
            Some("stop") => {
                token.cancel();
            }
            Some("quit") => {
                token.cancel();
                return Ok(Flow::Quit);
            }
            Some("ponderhit") => log::debug!("ponderhit: search continues under its budget"),
            _ => deferred.push_back(line),
        }
    }
    Ok(Flow::Continue)
}

fn write_info<W: Write>(out: &mut W, o: &SearchOutcome) -> io::Result<()> {
    let ms = o.elapsed.as_millis() as u64;
    let nps = o.nodes * 1000 / (ms + 1);
    writeln!(
        out,
        "info depth {} score cp {} nodes {} time {} nps {} pv {}",
        o.result.completed_depth,
        o.result.score_cp,
        o.nodes,
        ms,
        nps,
        o.result.pv.join(" ")
    )
}
