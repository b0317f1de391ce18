use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use crate::time::{parse_int_lenient, MAX_DEPTH};

pub const MIN_ELO: u32 = 800;
pub const MAX_ELO: u32 = 2800;

/// Engine configuration, settable from a personality file, the command line
/// and `setoption`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub use_book: bool,
    /// Books are only consulted while at most this many plies were played.
    pub book_depth: u32,
    /// Scales allowances that would spend over half the clock; below 100 is safer.
    pub time_percentage: i64,
    pub limit_strength: bool,
    pub elo: u32,
    pub guide_book: Option<PathBuf>,
    pub main_book: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            hash_mb: 16,
            threads: 1,
            use_book: true,
            book_depth: 40,
            time_percentage: 100,
            limit_strength: false,
            elo: MAX_ELO,
            guide_book: None,
            main_book: None,
        }
    }
}

/// What a `setoption` changed, so the engine can react to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChange {
    Hash(usize),
    Threads(usize),
    ClearHash,
    GuideBook(Option<PathBuf>),
    MainBook(Option<PathBuf>),
    /// Cached search results no longer match the configuration.
    Strength,
    Other,
}

/// Declared options, printed in response to `uci`.
pub const UCI_OPTIONS: &[&str] = &[
    "option name Hash type spin default 16 min 1 max 4096",
    "option name Threads type spin default 1 min 1 max 64",
    "option name Clear Hash type button",
    "option name UseBook type check default true",
    "option name BookDepth type spin default 40 min 0 max 256",
    "option name GuideBookFile type string default <empty>",
    "option name MainBookFile type string default <empty>",
    "option name TimePercentage type spin default 100 min 10 max 200",
    "option name UCI_LimitStrength type check default false",
    "option name UCI_Elo type spin default 2800 min 800 max 2800",
];

fn spin(value: &str, min: i64, max: i64) -> i64 { parse_int_lenient(value).clamp(min, max) }

fn check(value: &str) -> bool { value.trim().eq_ignore_ascii_case("true") }

fn path(value: &str) -> Option<PathBuf> {
    let v = value.trim();
    if v.is_empty() || v == "<empty>" { None } else { Some(PathBuf::from(v)) }
}

impl EngineOptions {
    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self> {
        let p = p.as_ref();
        let text = fs::read_to_string(p).with_context(|| format!("read personality file: {}", p.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse personality file: {}", p.display()))
    }

    /// Applies one option. Names compare case-insensitively; unknown names
    /// return `None` and leave the configuration untouched.
    pub fn set(&mut self, name: &str, value: &str) -> Option<OptionChange> {
        let change = match name.trim().to_ascii_lowercase().as_str() {
            "hash" => {
                self.hash_mb = spin(value, 1, 4096) as usize;
                OptionChange::Hash(self.hash_mb)
            }
            "threads" => {
                self.threads = spin(value, 1, 64) as usize;
                OptionChange::Threads(self.threads)
            }
            "clear hash" => OptionChange::ClearHash,
            "usebook" => {
                self.use_book = check(value);
                OptionChange::Other
            }
            "bookdepth" => {
                self.book_depth = spin(value, 0, 256) as u32;
                OptionChange::Other
            }
            "guidebookfile" => {
                self.guide_book = path(value);
                OptionChange::GuideBook(self.guide_book.clone())
            }
            "mainbookfile" => {
                self.main_book = path(value);
                OptionChange::MainBook(self.main_book.clone())
            }
            "timepercentage" => {
                self.time_percentage = spin(value, 10, 200);
                OptionChange::Other
            }
            "uci_limitstrength" => {
                self.limit_strength = check(value);
                OptionChange::Strength
            }
            "uci_elo" => {
                self.elo = spin(value, MIN_ELO as i64, MAX_ELO as i64) as u32;
                OptionChange::Strength
            }
            _ => return None,
        };
        log::debug!("option '{}' set to '{}'", name.trim(), value.trim());
        Some(change)
    }

    /// Depth cap implied by strength limiting, if any.
    pub fn strength_depth_cap(&self) -> Option<u32> {
        if !self.limit_strength { return None; }
        let steps = self.elo.clamp(MIN_ELO, MAX_ELO).saturating_sub(MIN_ELO) / 200;
        Some((1 + steps).min(MAX_DEPTH))
    }
}

/// Splits `name <K...> value <V...>`; both parts may contain spaces.
pub fn parse_setoption(args: &str) -> Option<(String, String)> {
    let mut name = Vec::new();
    let mut value = Vec::new();
    let (mut in_name, mut in_value) = (false, false);
    for tok in args.split_whitespace() {
        if !in_name {
            in_name = tok == "name";
            continue;
        }
        if !in_value && tok == "value" {
            in_value = true;
            continue;
        }
        if in_value { value.push(tok) } else { name.push(tok) }
    }
    if name.is_empty() { return None; }
    Some((name.join(" "), value.join(" ")))
}
