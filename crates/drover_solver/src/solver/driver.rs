use std::{sync::Arc, time::Instant};

use jiff::SignedDuration;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    constants::{DEFAULT_EXPLORATION_LEVEL, DEFAULT_THREADS, MAX_EXPLORATION_LEVEL},
    error::SolverError,
    problem::Problem,
    solver::{
        heuristics::{construct, parameter_tuples},
        ls::local_search::LocalSearch,
        solution::SolutionState,
    },
};

#[derive(Clone, Copy, Debug)]
pub struct SolveOptions {
    /// Exploration level 0..=5, controlling how many heuristic parameter
    /// tuples the driver tries.
    pub exploration_level: u32,
    pub threads: usize,
    /// Wall-clock budget. Expiry is not an error: workers return their
    /// best state so far.
    pub timeout: Option<SignedDuration>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            exploration_level: DEFAULT_EXPLORATION_LEVEL,
            threads: DEFAULT_THREADS,
            timeout: None,
        }
    }
}

/// Final outcome of a solve run.
#[derive(Debug)]
pub struct Solved {
    pub solution: SolutionState,
    pub timed_out: bool,
    pub computing_time: SignedDuration,
}

/// Runs construction and local search over the selected parameter tuples in
/// parallel workers and keeps the best outcome. Each worker owns its
/// solution copy; the shared problem is read-only.
pub fn solve(problem: &Arc<Problem>, options: &SolveOptions) -> Result<Solved, SolverError> {
    if options.exploration_level > MAX_EXPLORATION_LEVEL {
        return Err(SolverError::InvalidExplorationLevel {
            level: options.exploration_level,
            max: MAX_EXPLORATION_LEVEL,
        });
    }
    if options.threads == 0 {
        return Err(SolverError::NoThreads);
    }

    let started = Instant::now();
    let deadline = options
        .timeout
        .map(|timeout| started + timeout.unsigned_abs());

    let mut tuples = parameter_tuples(options.exploration_level);
    tuples.truncate(tuples.len().min(options.threads));
    info!(
        tuples = tuples.len(),
        threads = options.threads,
        "starting solve"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
        .map_err(|e| SolverError::ThreadPool(e.to_string()))?;

    let outcomes: Vec<(usize, SolutionState, bool)> = pool.install(|| {
        tuples
            .par_iter()
            .enumerate()
            .map(|(index, &params)| {
                let mut solution = construct(problem, params);
                let report = LocalSearch::new(deadline).run(problem, &mut solution);
                debug!(worker = index, ?params, "worker finished");
                (index, solution, report.timed_out)
            })
            .collect()
    });

    let timed_out = outcomes.iter().any(|(_, _, timed_out)| *timed_out);

    let best = outcomes
        .into_iter()
        .min_by_key(|(index, solution, _)| {
            (
                solution.total_cost(problem),
                solution.unassigned().len(),
                solution.total_duration(problem),
                *index,
            )
        })
        .map(|(_, solution, _)| solution)
        .expect("at least one parameter tuple runs");

    let computing_time = SignedDuration::try_from(started.elapsed())
        .unwrap_or(SignedDuration::MAX);

    info!(
        cost = best.total_cost(problem),
        unassigned = best.unassigned().len(),
        timed_out,
        "solve finished"
    );

    Ok(Solved {
        solution: best,
        timed_out,
        computing_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, ProblemConfig};

    #[test]
    fn test_solve_assigns_all_feasible_jobs() {
        let problem = Arc::new(test_utils::line_problem(ProblemConfig {
            jobs: 6,
            vehicles: 2,
            ..ProblemConfig::default()
        }));

        let solved = solve(
            &problem,
            &SolveOptions {
                exploration_level: 2,
                threads: 2,
                timeout: None,
            },
        )
        .unwrap();

        assert!(solved.solution.unassigned().is_empty());
        assert!(!solved.timed_out);
    }

    #[test]
    fn test_solve_is_deterministic_without_deadline() {
        let problem = Arc::new(test_utils::line_problem(ProblemConfig {
            jobs: 8,
            vehicles: 3,
            ..ProblemConfig::default()
        }));
        let options = SolveOptions {
            exploration_level: 3,
            threads: 4,
            timeout: None,
        };

        let a = solve(&problem, &options).unwrap();
        let b = solve(&problem, &options).unwrap();

        for (ra, rb) in a.solution.routes().iter().zip(b.solution.routes()) {
            assert_eq!(ra.steps(), rb.steps());
        }
    }

    #[test]
    fn test_random_instances_keep_invariants() {
        for seed in 0..4 {
            let problem = Arc::new(test_utils::random_problem(seed, 15, 3));
            let solved = solve(
                &problem,
                &SolveOptions {
                    exploration_level: 1,
                    threads: 2,
                    timeout: None,
                },
            )
            .unwrap();

            test_utils::assert_route_invariants(&problem, &solved.solution);
        }
    }

    #[test]
    fn test_invalid_exploration_level() {
        let problem = Arc::new(test_utils::line_problem(ProblemConfig::default()));
        let result = solve(
            &problem,
            &SolveOptions {
                exploration_level: 9,
                threads: 1,
                timeout: None,
            },
        );
        assert!(result.is_err());
    }
}
