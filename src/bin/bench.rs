use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use kestrel::bench::{run_bench, BENCH_POSITIONS, DEFAULT_BENCH_DEPTH};
use kestrel::search::tt::Tt;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "kestrel-bench", version, about = "Run the fixed benchmark battery and report NPS")]
struct Args {
    /// Search depth for every position
    #[arg(long, default_value_t = DEFAULT_BENCH_DEPTH)]
    depth: u32,

    /// Transposition table size in MB (approximate)
    #[arg(long, default_value_t = 16)]
    hash_mb: usize,

    /// Only run the first N positions
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let n = args.limit.unwrap_or(BENCH_POSITIONS.len()).min(BENCH_POSITIONS.len());
    let positions = &BENCH_POSITIONS[..n];

    let tt = Arc::new(Tt::with_capacity_mb(args.hash_mb));
    let pb = ProgressBar::new(n as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);

    let report = run_bench(positions, args.depth, &tt, |i, fen| {
        pb.set_position(i as u64);
        pb.set_message(fen.to_string());
    })?;
    pb.finish_and_clear();

    println!("depth {} over {} positions", report.depth, report.positions);
    println!("{}", report.summary_line());
    Ok(())
}
