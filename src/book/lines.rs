use anyhow::{Context, Result};
use cozy_chess::{Board, Move};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use crate::board::cozy::parse_move_text;
use crate::book::BookSource;
use crate::error::EngineError;

/// One opening line in UCI notation, played from the start position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookLine {
    #[serde(default)]
    pub name: String,
    pub moves: Vec<String>,
}

enum Pick {
    /// Always the most frequent continuation.
    Best,
    /// Random continuation, weighted by frequency.
    Weighted(SmallRng),
}

/// Book built by replaying opening lines and indexing every position reached.
///
/// Files are either JSON (`[{"name": ..., "moves": [...]}]`) or plain text
/// with one line of space-separated moves per row and `#` comments.
pub struct LineBook {
    name: String,
    entries: HashMap<u64, Vec<(Move, u32)>>,
    pick: Pick,
}

impl LineBook {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), entries: HashMap::new(), pick: Pick::Best }
    }

    pub fn weighted(name: &str, seed: u64) -> Self {
        Self { pick: Pick::Weighted(SmallRng::seed_from_u64(seed)), ..Self::new(name) }
    }

    /// Indexes a line. Moves up to the first illegal one are kept.
    pub fn add_line<'a, I>(&mut self, moves: I) -> std::result::Result<(), EngineError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut board = Board::default();
        for text in moves {
            let mv = parse_move_text(&board, text)?;
            let slot = self.entries.entry(board.hash()).or_default();
            match slot.iter_mut().find(|(m, _)| *m == mv) {
                Some((_, w)) => *w += 1,
                None => slot.push((mv, 1)),
            }
            board.play(mv);
        }
        Ok(())
    }

    pub fn add_lines(&mut self, lines: &[BookLine]) {
        for line in lines {
            if let Err(e) = self.add_line(line.moves.iter().map(String::as_str)) {
                log::warn!("book '{}': line '{}' truncated: {}", self.name, line.name, e);
            }
        }
    }

    pub fn parse_text(&mut self, text: &str) {
        for (i, row) in text.lines().enumerate() {
            let row = row.split('#').next().unwrap_or("").trim();
            if row.is_empty() { continue; }
            if let Err(e) = self.add_line(row.split_whitespace()) {
                log::warn!("book '{}': row {} truncated: {}", self.name, i + 1, e);
            }
        }
    }

    pub fn load<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read book file: {}", path.display()))?;
        let mut book = Self::new(name);
        if path.extension().map_or(false, |e| e.eq_ignore_ascii_case("json")) {
            let lines: Vec<BookLine> = serde_json::from_str(&text)
                .with_context(|| format!("parse JSON book: {}", path.display()))?;
            book.add_lines(&lines);
        } else {
            book.parse_text(&text);
        }
        log::info!("book '{}' loaded from {}: {} positions", name, path.display(), book.positions());
        Ok(book)
    }

    pub fn positions(&self) -> usize { self.entries.len() }
}

impl BookSource for LineBook {
    fn name(&self) -> &str { &self.name }

    fn lookup(&mut self, board: &Board) -> Option<Move> {
        let cands = self.entries.get(&board.hash())?;
        match &mut self.pick {
            Pick::Best => cands.iter().max_by_key(|(_, w)| *w).map(|(m, _)| *m),
            Pick::Weighted(rng) => {
                let total: u32 = cands.iter().map(|(_, w)| *w).sum();
                if total == 0 { return None; }
                let mut roll = rng.gen_range(0..total);
                for &(m, w) in cands {
                    if roll < w { return Some(m); }
                    roll -= w;
                }
                None
            }
        }
    }
}
