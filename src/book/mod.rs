//! Opening books consulted before any search is started.
//!
//! Sources are tried in order (guide, main, internal) and the first answer
//! wins; later sources are never asked.

pub mod internal;
pub mod lines;

use cozy_chess::{Board, Move};
use crate::board::cozy::format_move_text;

pub use internal::internal_book;
pub use lines::LineBook;

pub const GUIDE_BOOK: &str = "guide";
pub const MAIN_BOOK: &str = "main";
pub const INTERNAL_BOOK: &str = "internal";

/// Anything that can suggest a move for a position, or decline.
pub trait BookSource: Send {
    fn name(&self) -> &str;
    fn lookup(&mut self, board: &Board) -> Option<Move>;
}

/// A book answer together with the source that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookMove {
    pub mv: Move,
    pub text: String,
    pub source: String,
}

#[derive(Default)]
pub struct OpeningBookResolver {
    sources: Vec<Box<dyn BookSource>>,
}

impl OpeningBookResolver {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, source: Box<dyn BookSource>) { self.sources.push(source); }

    /// Swaps in a source with the same name, keeping its place in the chain.
    /// Sources not yet present are inserted ahead of the internal book.
    pub fn replace(&mut self, source: Box<dyn BookSource>) {
        if let Some(slot) = self.sources.iter_mut().find(|s| s.name() == source.name()) {
            *slot = source;
        } else if let Some(pos) = self.sources.iter().position(|s| s.name() == INTERNAL_BOOK) {
            self.sources.insert(pos, source);
        } else {
            self.sources.push(source);
        }
    }

    pub fn remove(&mut self, name: &str) { self.sources.retain(|s| s.name() != name); }

    pub fn names(&self) -> Vec<&str> { self.sources.iter().map(|s| s.name()).collect() }

    pub fn len(&self) -> usize { self.sources.len() }

    pub fn is_empty(&self) -> bool { self.sources.is_empty() }

    /// Asks each source in order and stops at the first legal answer.
    pub fn resolve(&mut self, board: &Board) -> Option<BookMove> {
        for source in &mut self.sources {
            let Some(mv) = source.lookup(board) else { continue };
            if !board.is_legal(mv) {
                log::warn!("book '{}' suggested illegal move {}", source.name(), mv);
                continue;
            }
            return Some(BookMove { mv, text: format_move_text(board, mv), source: source.name().to_string() });
        }
        None
    }
}
