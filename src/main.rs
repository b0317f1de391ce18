use anyhow::Result;
use clap::Parser;
use kestrel::options::EngineOptions;
use kestrel::uci::UciEngine;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Kestrel UCI chess engine", long_about = None)]
struct Args {
    /// JSON personality file with engine options
    #[arg(long)]
    personality: Option<PathBuf>,

    /// Number of search threads
    #[arg(long)]
    threads: Option<usize>,

    /// Transposition table size in MB
    #[arg(long)]
    hash: Option<usize>,

    /// Guide book file (consulted first)
    #[arg(long)]
    guide_book: Option<PathBuf>,

    /// Main book file (consulted after the guide book)
    #[arg(long)]
    main_book: Option<PathBuf>,

    /// Never play from opening books
    #[arg(long)]
    no_book: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut options = match args.personality.as_deref() {
        Some(p) => EngineOptions::load(p).unwrap_or_else(|e| {
            log::warn!("{:#}; using default options", e);
            EngineOptions::default()
        }),
        None => EngineOptions::default(),
    };
    if let Some(t) = args.threads { options.threads = t.max(1); }
    if let Some(h) = args.hash { options.hash_mb = h.max(1); }
    if args.guide_book.is_some() { options.guide_book = args.guide_book; }
    if args.main_book.is_some() { options.main_book = args.main_book; }
    if args.no_book { options.use_book = false; }

    let mut engine = UciEngine::new(options);
    let stdout = io::stdout();
    engine.run_loop(BufReader::new(io::stdin()), stdout.lock())?;
    Ok(())
}
