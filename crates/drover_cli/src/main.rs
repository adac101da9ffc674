use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use mimalloc::MiMalloc;

mod solve;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Matrix-backed vehicle routing solver.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Input problem file.
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output file; defaults to stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Number of worker threads.
    #[arg(short = 't', long, default_value_t = 4)]
    threads: usize,

    /// Exploration level, 0..=5.
    #[arg(short = 'x', long, default_value_t = 5)]
    explore: u32,

    /// Wall-clock limit in milliseconds.
    #[arg(short = 'l', long)]
    limit: Option<u64>,

    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    match solve::run(&solve::RunArgs {
        input: cli.input,
        output: cli.output,
        threads: cli.threads,
        explore: cli.explore,
        limit_ms: cli.limit,
    }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}
