use std::{fmt, fs, path::PathBuf, sync::Arc};

use jiff::SignedDuration;
use tracing::info;

use drover_solver::{
    io::{input::parse_problem, output::solution_output},
    solver::driver::{SolveOptions, solve},
};

pub struct RunArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub threads: usize,
    pub explore: u32,
    pub limit_ms: Option<u64>,
}

/// Failure modes mapped to process exit codes: 1 for anything wrong with
/// the input, 3 for solver-side failures. Code 2 stays reserved for
/// routing-engine errors, which this binary does not produce.
#[derive(Debug)]
pub enum RunError {
    Input(String),
    Solver(String),
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Input(_) => 1,
            RunError::Solver(_) => 3,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Input(message) => write!(f, "Input error: {message}"),
            RunError::Solver(message) => write!(f, "Solver error: {message}"),
        }
    }
}

pub fn run(args: &RunArgs) -> Result<(), RunError> {
    let input = fs::read_to_string(&args.input)
        .map_err(|e| RunError::Input(format!("{}: {e}", args.input.display())))?;

    let problem =
        Arc::new(parse_problem(&input).map_err(|e| RunError::Input(e.to_string()))?);
    info!(
        jobs = problem.jobs().len(),
        vehicles = problem.vehicles().len(),
        "problem loaded"
    );

    let options = SolveOptions {
        exploration_level: args.explore,
        threads: args.threads,
        timeout: args
            .limit_ms
            .map(|ms| SignedDuration::from_millis(ms as i64)),
    };

    let solved = solve(&problem, &options).map_err(|e| RunError::Solver(e.to_string()))?;
    let output = solution_output(&problem, &solved);
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| RunError::Solver(e.to_string()))?;

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .map_err(|e| RunError::Solver(format!("{}: {e}", path.display())))?,
        None => println!("{rendered}"),
    }

    Ok(())
}
