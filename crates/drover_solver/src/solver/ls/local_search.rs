use std::time::Instant;

use tracing::{debug, trace};

use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        evaluator::best_insertion_any_route,
        ls::{
            cross_exchange::CrossExchange, intra_cross_exchange::IntraCrossExchange,
            intra_exchange::IntraExchange, intra_mixed_exchange::IntraMixedExchange,
            intra_or_opt::IntraOrOpt, intra_relocate::IntraRelocate, intra_two_opt::IntraTwoOpt,
            mixed_exchange::MixedExchange,
            operator::{LocalSearchOperator, Move},
            or_opt::OrOpt,
            pd_shift::PdShift,
            priority_replace::PriorityReplace,
            relocate::Relocate,
            reverse_two_opt::ReverseTwoOpt,
            route_exchange::RouteExchange,
            route_split::RouteSplit,
            swap_star::SwapStar,
            tsp_fix::TspFix,
            two_opt::TwoOpt,
            unassigned_exchange::UnassignedExchange,
        },
        solution::{RouteIdx, SolutionState},
    },
};

/// Best-improvement loop over the operator family. Operators run in a fixed
/// priority order; each pass picks the feasible move with the largest
/// negative delta, ties resolved by operator order then ascending route and
/// step indices (the scan order makes strict comparison sufficient).
pub struct LocalSearch {
    deadline: Option<Instant>,
}

/// Outcome of one local-search run.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSearchReport {
    pub applied_moves: usize,
    pub timed_out: bool,
}

impl LocalSearch {
    pub fn new(deadline: Option<Instant>) -> Self {
        LocalSearch { deadline }
    }

    fn expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Runs to a local optimum or the deadline. Every `apply` is atomic
    /// with respect to the solution: on expiry the current state is a
    /// complete, consistent solution.
    pub fn run(&self, problem: &Problem, solution: &mut SolutionState) -> LocalSearchReport {
        let mut report = LocalSearchReport::default();

        loop {
            if self.expired() {
                report.timed_out = true;
                break;
            }

            // Assignment first: adding jobs dominates any cost move, and
            // priority gains dominate cost gains.
            if try_job_additions(problem, solution) {
                report.applied_moves += 1;
                continue;
            }

            if let Some(replace) = best_priority_replace(problem, solution) {
                trace!(gain = replace.1, "applying priority replace");
                replace.0.apply(problem, solution);
                #[cfg(debug_assertions)]
                solution.assert_consistent(problem);
                report.applied_moves += 1;
                continue;
            }

            let Some((best_move, delta)) = best_cost_move(problem, solution) else {
                break;
            };

            trace!(
                operator = best_move.operator_name(),
                delta, "applying move"
            );
            best_move.apply(problem, solution);
            #[cfg(debug_assertions)]
            solution.assert_consistent(problem);
            report.applied_moves += 1;
        }

        debug!(
            applied = report.applied_moves,
            timed_out = report.timed_out,
            "local search finished"
        );

        report
    }
}

/// Inserts unassigned jobs at their best feasible positions, most urgent
/// first. Returns whether anything was added; assigned count never drops.
fn try_job_additions(problem: &Problem, solution: &mut SolutionState) -> bool {
    let mut added = false;

    loop {
        let mut drivers: Vec<_> = solution
            .unassigned_sorted()
            .into_iter()
            .filter(|&job| {
                problem.job(job).kind() != crate::problem::job::JobKind::Delivery
            })
            .collect();
        drivers.sort_by_key(|&job| {
            (
                std::cmp::Reverse(problem.job(job).priority()),
                problem.job(job).id(),
            )
        });

        let mut inserted = false;
        for job in drivers {
            let (best, _) = best_insertion_any_route(problem, solution, job);
            if let Some(best) = best {
                best.apply(problem, solution);
                inserted = true;
                added = true;
                break;
            }
        }

        if !inserted {
            break;
        }
    }

    added
}

/// Best priority-improving eviction: maximum priority gain, then lowest
/// cost delta.
fn best_priority_replace(
    problem: &Problem,
    solution: &SolutionState,
) -> Option<(PriorityReplace, u32)> {
    let mut best: Option<(PriorityReplace, u32, Cost)> = None;

    for r in 0..solution.routes().len() {
        let pair = (RouteIdx::new(r), RouteIdx::new(r));
        PriorityReplace::generate_moves(problem, solution, pair, |op| {
            let gain = op.priority_gain(problem, solution);
            if gain == 0 {
                return;
            }
            let Some(delta) = op.evaluate(problem, solution) else {
                return;
            };
            let better = match &best {
                Some((_, best_gain, best_delta)) => {
                    gain > *best_gain || (gain == *best_gain && delta < *best_delta)
                }
                None => true,
            };
            if better {
                best = Some((op, gain, delta));
            }
        });
    }

    best.map(|(op, gain, _)| (op, gain))
}

macro_rules! scan_operator {
    ($ty:ty, $variant:ident, $problem:expr, $solution:expr, $best:expr) => {
        for r1 in 0..$solution.routes().len() {
            for r2 in 0..$solution.routes().len() {
                let pair = (RouteIdx::new(r1), RouteIdx::new(r2));
                <$ty>::generate_moves($problem, $solution, pair, |op| {
                    if let Some(delta) = op.evaluate($problem, $solution)
                        && delta < 0
                        && $best.as_ref().map(|(_, best)| delta < *best).unwrap_or(true)
                    {
                        *$best = Some((Move::$variant(op), delta));
                    }
                });
            }
        }
    };
}

/// Scans the whole operator family and returns the strictly improving move
/// with the largest gain, or `None` at a local optimum.
fn best_cost_move(problem: &Problem, solution: &SolutionState) -> Option<(Move, Cost)> {
    let best = &mut None;

    scan_operator!(UnassignedExchange, UnassignedExchange, problem, solution, best);
    scan_operator!(Relocate, Relocate, problem, solution, best);
    scan_operator!(IntraRelocate, IntraRelocate, problem, solution, best);
    scan_operator!(OrOpt, OrOpt, problem, solution, best);
    scan_operator!(IntraOrOpt, IntraOrOpt, problem, solution, best);
    scan_operator!(CrossExchange, CrossExchange, problem, solution, best);
    scan_operator!(IntraCrossExchange, IntraCrossExchange, problem, solution, best);
    scan_operator!(MixedExchange, MixedExchange, problem, solution, best);
    scan_operator!(IntraMixedExchange, IntraMixedExchange, problem, solution, best);
    scan_operator!(TwoOpt, TwoOpt, problem, solution, best);
    scan_operator!(IntraTwoOpt, IntraTwoOpt, problem, solution, best);
    scan_operator!(ReverseTwoOpt, ReverseTwoOpt, problem, solution, best);
    scan_operator!(IntraExchange, IntraExchange, problem, solution, best);
    scan_operator!(PdShift, PdShift, problem, solution, best);
    scan_operator!(RouteExchange, RouteExchange, problem, solution, best);
    scan_operator!(SwapStar, SwapStar, problem, solution, best);
    scan_operator!(RouteSplit, RouteSplit, problem, solution, best);
    scan_operator!(TspFix, TspFix, problem, solution, best);

    best.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        solver::heuristics::{HeuristicKind, HeuristicParams, InitRule, SortRule, construct},
        test_utils::{self, ProblemConfig},
    };

    fn search(problem: &Problem, solution: &mut SolutionState) -> LocalSearchReport {
        LocalSearch::new(None).run(problem, solution)
    }

    #[test]
    fn test_local_search_reaches_local_optimum() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 5,
            ..ProblemConfig::default()
        });
        // Deliberately scrambled seed.
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[4, 1, 3, 0, 2])]);

        search(&problem, &mut solution);

        // On a line, the optimum sweeps outward and back.
        let cost = solution.total_cost(&problem);
        let optimal =
            test_utils::solution_with_routes(&problem, &[(0, &[0, 1, 2, 3, 4])])
                .total_cost(&problem);
        assert_eq!(cost, optimal);
    }

    #[test]
    fn test_idempotent_on_local_optimum() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 5,
            ..ProblemConfig::default()
        });
        let mut solution = construct(
            &problem,
            HeuristicParams {
                kind: HeuristicKind::Basic,
                init: InitRule::Nearest,
                regret_coeff: 0.3,
                sort: SortRule::Availability,
            },
        );

        search(&problem, &mut solution);
        let snapshot: Vec<Vec<_>> = solution
            .routes()
            .iter()
            .map(|r| r.steps().to_vec())
            .collect();
        let cost = solution.total_cost(&problem);

        // A second run must not move anything.
        let report = search(&problem, &mut solution);
        assert_eq!(report.applied_moves, 0);
        assert_eq!(solution.total_cost(&problem), cost);
        let after: Vec<Vec<_>> = solution
            .routes()
            .iter()
            .map(|r| r.steps().to_vec())
            .collect();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn test_additions_keep_assignment_monotone() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 6,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution = SolutionState::new(&problem);

        search(&problem, &mut solution);
        assert!(solution.unassigned().is_empty());
    }
}
