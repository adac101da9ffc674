use tracing::debug;

use crate::{
    constants::{Cost, INFINITE_COST},
    problem::{
        Problem,
        job::{JobIdx, JobKind},
        vehicle::{ForcedStepKind, VehicleIdx},
    },
    solver::{
        evaluator::{Insertion, best_insertion_in_route},
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeuristicKind {
    Basic,
    Dynamic,
    /// Projects user-pinned step skeletons only; the rest of the fleet is
    /// filled by local search additions.
    InitRoutes,
}

/// Rule picking the first job of an empty vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitRule {
    None,
    HigherAmount,
    Nearest,
    Furthest,
    EarliestDeadline,
}

/// Vehicle ordering rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortRule {
    /// Wider working windows first.
    Availability,
    /// Cheaper vehicles first.
    Cost,
}

#[derive(Clone, Copy, Debug)]
pub struct HeuristicParams {
    pub kind: HeuristicKind,
    pub init: InitRule,
    pub regret_coeff: f32,
    pub sort: SortRule,
}

const REGRET_COEFFS: [f32; 4] = [0.0, 0.3, 0.9, 1.8];
const INIT_RULES: [InitRule; 5] = [
    InitRule::None,
    InitRule::HigherAmount,
    InitRule::Nearest,
    InitRule::Furthest,
    InitRule::EarliestDeadline,
];

/// Tuple counts per exploration level.
const EXPLORATION_MAP: [usize; 6] = [1, 2, 4, 8, 16, 32];

/// Fixed, reproducible list of heuristic parameter tuples for an
/// exploration level. Order front-loads diversity: each regret coefficient
/// contributes both heuristics before the next coefficient enters.
pub fn parameter_tuples(level: u32) -> Vec<HeuristicParams> {
    let count = EXPLORATION_MAP[level as usize];
    let mut tuples = Vec::with_capacity(count);

    'outer: for &regret_coeff in &REGRET_COEFFS {
        for kind in [HeuristicKind::Basic, HeuristicKind::Dynamic] {
            for init in INIT_RULES {
                for sort in [SortRule::Availability, SortRule::Cost] {
                    tuples.push(HeuristicParams {
                        kind,
                        init,
                        regret_coeff,
                        sort,
                    });
                    if tuples.len() == count {
                        break 'outer;
                    }
                }
            }
        }
    }

    tuples
}

/// Builds a seed solution for one parameter tuple. Deterministic: the same
/// input and parameters always produce the same seed.
pub fn construct(problem: &Problem, params: HeuristicParams) -> SolutionState {
    let mut solution = SolutionState::new(problem);

    // Pinned skeletons are honored by every run.
    project_forced_routes(problem, &mut solution);

    match params.kind {
        HeuristicKind::InitRoutes => {}
        HeuristicKind::Basic => basic_construction(problem, &mut solution, params),
        HeuristicKind::Dynamic => dynamic_construction(problem, &mut solution, params),
    }

    #[cfg(debug_assertions)]
    solution.assert_consistent(problem);

    debug!(
        assigned = solution.assigned_count(problem),
        unassigned = solution.unassigned().len(),
        "construction finished"
    );

    solution
}

/// Projects each vehicle's forced step list onto its route, accepting every
/// step even when suboptimal, and freezes the result.
pub fn project_forced_routes(problem: &Problem, solution: &mut SolutionState) {
    for v in 0..problem.vehicles().len() {
        let vehicle = problem.vehicle(VehicleIdx::new(v));
        if !vehicle.has_forced_steps() {
            continue;
        }

        let mut steps = Vec::with_capacity(vehicle.forced_steps().len());
        let mut assigned = Vec::new();
        for forced in vehicle.forced_steps() {
            match &forced.kind {
                ForcedStepKind::Start | ForcedStepKind::End => {}
                ForcedStepKind::Task { id, kind } => {
                    // Ingestion validated the reference.
                    let job = problem
                        .job_by_id(*kind, *id)
                        .expect("forced step references a known task");
                    steps.push(Step::Job(job));
                    assigned.push(job);
                }
                ForcedStepKind::Pause { id } => {
                    let index = vehicle
                        .breaks()
                        .iter()
                        .position(|b| b.id == *id)
                        .expect("forced step references a known break");
                    steps.push(Step::Break(index));
                }
            }
        }

        let route = solution.route_mut(RouteIdx::new(v));
        route.set_steps(problem, steps);
        route.freeze();
        for job in assigned {
            solution.mark_assigned(job);
        }
    }
}

/// Regret score of an insertion candidate: weighted gap to the second-best
/// placement minus the best cost itself. Higher is more urgent.
fn regret_score(regret_coeff: f32, best: Cost, second_best: Cost) -> f64 {
    regret_coeff as f64 * (second_best - best) as f64 - best as f64
}

/// Jobs that drive an insertion: singles and pickup halves. Deliveries ride
/// along with their pickup.
fn insertion_drivers(problem: &Problem, solution: &SolutionState) -> Vec<JobIdx> {
    solution
        .unassigned_sorted()
        .into_iter()
        .filter(|&job| problem.job(job).kind() != JobKind::Delivery)
        .collect()
}

/// Candidate ordering shared by every tie-break in construction: higher
/// priority wins, then higher amount, then lower id.
fn beats_tie(problem: &Problem, challenger: JobIdx, incumbent: JobIdx) -> bool {
    let a = problem.job(challenger);
    let b = problem.job(incumbent);
    (a.priority(), a.amount_total(), std::cmp::Reverse(a.id()))
        > (b.priority(), b.amount_total(), std::cmp::Reverse(b.id()))
}

fn vehicle_order(problem: &Problem, sort: SortRule) -> Vec<VehicleIdx> {
    let mut order: Vec<VehicleIdx> = (0..problem.vehicles().len())
        .map(VehicleIdx::new)
        .filter(|&v| !problem.vehicle(v).has_forced_steps())
        .collect();

    match sort {
        SortRule::Availability => order.sort_by_key(|&v| {
            let vehicle = problem.vehicle(v);
            (
                std::cmp::Reverse(vehicle.time_window().length()),
                vehicle.id(),
            )
        }),
        SortRule::Cost => order.sort_by_key(|&v| {
            let costs = problem.vehicle(v).costs();
            (costs.fixed, costs.per_hour, costs.per_km, problem.vehicle(v).id())
        }),
    }

    order
}

/// Value of a job under an init rule; `None` when the rule does not apply.
/// Smaller is better.
fn init_rank(
    problem: &Problem,
    vehicle: VehicleIdx,
    rule: InitRule,
    job_idx: JobIdx,
) -> Option<i64> {
    let job = problem.job(job_idx);
    match rule {
        InitRule::None => None,
        InitRule::HigherAmount => Some(-job.amount_total()),
        InitRule::Nearest | InitRule::Furthest => {
            let eval = problem.eval(
                vehicle,
                problem.vehicle(vehicle).start(),
                Some(job.location()),
            );
            if !eval.is_reachable() {
                return None;
            }
            match rule {
                InitRule::Nearest => Some(eval.cost),
                _ => Some(-eval.cost),
            }
        }
        InitRule::EarliestDeadline => Some(job.deadline()),
    }
}

/// Seeds an empty route with the init-rule job when one fits.
fn apply_init_rule(
    problem: &Problem,
    solution: &mut SolutionState,
    route_idx: RouteIdx,
    params: HeuristicParams,
) {
    if params.init == InitRule::None || solution.route(route_idx).has_jobs() {
        return;
    }

    let vehicle = solution.route(route_idx).vehicle();
    let mut best: Option<(i64, JobIdx, Insertion)> = None;

    for job in insertion_drivers(problem, solution) {
        let Some(rank) = init_rank(problem, vehicle, params.init, job) else {
            continue;
        };

        let better = match &best {
            Some((best_rank, best_job, _)) => {
                rank < *best_rank || (rank == *best_rank && beats_tie(problem, job, *best_job))
            }
            None => true,
        };
        if !better {
            continue;
        }

        let (insertion, _) = best_insertion_in_route(problem, solution, route_idx, job);
        if let Some(insertion) = insertion {
            best = Some((rank, job, insertion));
        }
    }

    if let Some((_, _, insertion)) = best {
        insertion.apply(problem, solution);
    }
}

/// One vehicle at a time, in sort order; within a vehicle, repeated regret
/// insertion over the two best positions of the route.
fn basic_construction(problem: &Problem, solution: &mut SolutionState, params: HeuristicParams) {
    for vehicle in vehicle_order(problem, params.sort) {
        let route_idx = RouteIdx::new(vehicle.get());

        apply_init_rule(problem, solution, route_idx, params);

        loop {
            let mut chosen: Option<(f64, JobIdx, Insertion)> = None;

            for job in insertion_drivers(problem, solution) {
                let (best, second_best) =
                    best_insertion_in_route(problem, solution, route_idx, job);
                let Some(best) = best else { continue };

                let score = regret_score(params.regret_coeff, best.cost(), second_best);
                let better = match &chosen {
                    Some((chosen_score, chosen_job, _)) => {
                        score > *chosen_score
                            || (score == *chosen_score && beats_tie(problem, job, *chosen_job))
                    }
                    None => true,
                };
                if better {
                    chosen = Some((score, job, best));
                }
            }

            match chosen {
                Some((_, _, insertion)) => insertion.apply(problem, solution),
                None => break,
            }
        }
    }
}

/// All vehicles at once: every iteration takes the globally best-scored
/// (job, vehicle, position). Vehicles open on demand, in sort order.
fn dynamic_construction(problem: &Problem, solution: &mut SolutionState, params: HeuristicParams) {
    let order = vehicle_order(problem, params.sort);

    loop {
        // Routes already serving jobs, plus the first closed one.
        let mut open: Vec<RouteIdx> = Vec::with_capacity(order.len());
        let mut next_closed = None;
        for &vehicle in &order {
            let route_idx = RouteIdx::new(vehicle.get());
            if solution.route(route_idx).has_jobs() {
                open.push(route_idx);
            } else if next_closed.is_none() {
                next_closed = Some(route_idx);
            }
        }
        if let Some(route_idx) = next_closed {
            // A closed vehicle joins the scan and opens when the cheapest
            // global insertion lands on it; only the very first one is
            // seeded by the init rule.
            if open.is_empty() {
                apply_init_rule(problem, solution, route_idx, params);
            }
            open.push(route_idx);
        }

        let mut chosen: Option<(f64, JobIdx, Insertion)> = None;
        for job in insertion_drivers(problem, solution) {
            let mut best: Option<Insertion> = None;
            let mut second_best = INFINITE_COST;

            for &route_idx in &open {
                let (candidate, _) = best_insertion_in_route(problem, solution, route_idx, job);
                let Some(candidate) = candidate else { continue };

                match &best {
                    Some(current) if candidate.cost() >= current.cost() => {
                        second_best = second_best.min(candidate.cost());
                    }
                    _ => {
                        if let Some(previous) = best.take() {
                            second_best = second_best.min(previous.cost());
                        }
                        best = Some(candidate);
                    }
                }
            }

            let Some(best) = best else { continue };
            let score = regret_score(params.regret_coeff, best.cost(), second_best);
            let better = match &chosen {
                Some((chosen_score, chosen_job, _)) => {
                    score > *chosen_score
                        || (score == *chosen_score && beats_tie(problem, job, *chosen_job))
                }
                None => true,
            };
            if better {
                chosen = Some((score, job, best));
            }
        }

        match chosen {
            Some((_, _, insertion)) => insertion.apply(problem, solution),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, ProblemConfig};

    #[test]
    fn test_parameter_tuples_sizes() {
        for (level, &count) in EXPLORATION_MAP.iter().enumerate() {
            assert_eq!(parameter_tuples(level as u32).len(), count);
        }
    }

    #[test]
    fn test_basic_assigns_everything_feasible() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 5,
            ..ProblemConfig::default()
        });

        let solution = construct(
            &problem,
            HeuristicParams {
                kind: HeuristicKind::Basic,
                init: InitRule::Nearest,
                regret_coeff: 0.9,
                sort: SortRule::Availability,
            },
        );

        assert!(solution.unassigned().is_empty());
        assert_eq!(solution.route(RouteIdx::new(0)).job_count(), 5);
    }

    #[test]
    fn test_dynamic_matches_job_multiset() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 6,
            vehicles: 2,
            ..ProblemConfig::default()
        });

        let solution = construct(
            &problem,
            HeuristicParams {
                kind: HeuristicKind::Dynamic,
                init: InitRule::HigherAmount,
                regret_coeff: 0.3,
                sort: SortRule::Cost,
            },
        );

        let routed: usize = solution.routes().iter().map(|r| r.job_count()).sum();
        assert_eq!(routed + solution.unassigned().len(), 6);
        assert!(solution.unassigned().is_empty());
    }

    #[test]
    fn test_construction_is_deterministic() {
        let params = HeuristicParams {
            kind: HeuristicKind::Dynamic,
            init: InitRule::EarliestDeadline,
            regret_coeff: 1.8,
            sort: SortRule::Availability,
        };

        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 8,
            vehicles: 3,
            ..ProblemConfig::default()
        });

        let a = construct(&problem, params);
        let b = construct(&problem, params);

        for (ra, rb) in a.routes().iter().zip(b.routes()) {
            assert_eq!(ra.steps(), rb.steps());
        }
    }

    #[test]
    fn test_max_tasks_limits_assignment() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 4,
            max_tasks: Some(2),
            ..ProblemConfig::default()
        });

        let solution = construct(
            &problem,
            HeuristicParams {
                kind: HeuristicKind::Basic,
                init: InitRule::None,
                regret_coeff: 0.0,
                sort: SortRule::Availability,
            },
        );

        assert_eq!(solution.route(RouteIdx::new(0)).job_count(), 2);
        assert_eq!(solution.unassigned().len(), 2);
    }
}
