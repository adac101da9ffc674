use smallvec::SmallVec;

use crate::{
    constants::{Cost, INFINITE_COST},
    problem::{
        Problem,
        job::{JobIdx, JobKind},
    },
    solver::{
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// A fully located candidate insertion: either a single job at one position
/// or a shipment pair with both positions fixed. Costs are exact deltas as
/// reported by the route splice evaluation.
#[derive(Clone, Debug)]
pub enum Insertion {
    Single {
        route: RouteIdx,
        job: JobIdx,
        position: usize,
        cost: Cost,
    },
    Shipment {
        route: RouteIdx,
        pickup: JobIdx,
        delivery: JobIdx,
        /// Positions in the route before the insertion.
        pickup_position: usize,
        delivery_position: usize,
        cost: Cost,
    },
}

impl Insertion {
    pub fn cost(&self) -> Cost {
        match self {
            Insertion::Single { cost, .. } => *cost,
            Insertion::Shipment { cost, .. } => *cost,
        }
    }

    pub fn route(&self) -> RouteIdx {
        match self {
            Insertion::Single { route, .. } => *route,
            Insertion::Shipment { route, .. } => *route,
        }
    }

    pub fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        match self {
            Insertion::Single {
                route,
                job,
                position,
                ..
            } => {
                solution.route_mut(*route).replace(
                    problem,
                    std::iter::once(Step::Job(*job)),
                    *position,
                    *position,
                );
                solution.mark_assigned(*job);
            }
            Insertion::Shipment {
                route,
                pickup,
                delivery,
                pickup_position,
                delivery_position,
                ..
            } => {
                let seq = shipment_seq(
                    solution.route(*route).steps(),
                    *pickup,
                    *delivery,
                    *pickup_position,
                    *delivery_position,
                );
                solution.route_mut(*route).replace(
                    problem,
                    seq.into_iter(),
                    *pickup_position,
                    *delivery_position,
                );
                solution.mark_assigned(*pickup);
                solution.mark_assigned(*delivery);
            }
        }
    }
}

/// The splice realizing a shipment insertion: pickup, the untouched steps in
/// between, delivery.
fn shipment_seq(
    steps: &[Step],
    pickup: JobIdx,
    delivery: JobIdx,
    pickup_position: usize,
    delivery_position: usize,
) -> SmallVec<[Step; 8]> {
    let mut seq = SmallVec::with_capacity(delivery_position - pickup_position + 2);
    seq.push(Step::Job(pickup));
    seq.extend(steps[pickup_position..delivery_position].iter().copied());
    seq.push(Step::Job(delivery));
    seq
}

/// Best and second-best feasible insertion of a job into one route. The
/// second-best cost feeds the regret term during construction; it stays at
/// `INFINITE_COST` when only one placement exists.
pub fn best_insertion_in_route(
    problem: &Problem,
    solution: &SolutionState,
    route_idx: RouteIdx,
    job_idx: JobIdx,
) -> (Option<Insertion>, Cost) {
    let route = solution.route(route_idx);
    if route.is_frozen() || !problem.vehicle_ok_with_job(route.vehicle(), job_idx) {
        return (None, INFINITE_COST);
    }

    let job = problem.job(job_idx);
    let mut best: Option<Insertion> = None;
    let mut second_best = INFINITE_COST;

    match job.kind() {
        JobKind::Single => {
            for position in 0..=route.len() {
                let Some(delta) = route.evaluate_splice(
                    problem,
                    std::iter::once(Step::Job(job_idx)),
                    position,
                    position,
                ) else {
                    continue;
                };

                track_best(
                    &mut best,
                    &mut second_best,
                    delta.cost,
                    || Insertion::Single {
                        route: route_idx,
                        job: job_idx,
                        position,
                        cost: delta.cost,
                    },
                );
            }
        }
        JobKind::Pickup => {
            let delivery = job
                .partner()
                .expect("pickup must have a paired delivery");

            for pickup_position in 0..=route.len() {
                for delivery_position in pickup_position..=route.len() {
                    if !route.is_job_run(pickup_position, delivery_position) {
                        continue;
                    }
                    let seq = shipment_seq(
                        route.steps(),
                        job_idx,
                        delivery,
                        pickup_position,
                        delivery_position,
                    );
                    let Some(delta) = route.evaluate_splice(
                        problem,
                        seq.iter().copied(),
                        pickup_position,
                        delivery_position,
                    ) else {
                        continue;
                    };

                    track_best(
                        &mut best,
                        &mut second_best,
                        delta.cost,
                        || Insertion::Shipment {
                            route: route_idx,
                            pickup: job_idx,
                            delivery,
                            pickup_position,
                            delivery_position,
                            cost: delta.cost,
                        },
                    );
                }
            }
        }
        // Deliveries ride along with their pickup half.
        JobKind::Delivery => {}
    }

    (best, second_best)
}

fn track_best(
    best: &mut Option<Insertion>,
    second_best: &mut Cost,
    cost: Cost,
    make: impl FnOnce() -> Insertion,
) {
    match best {
        Some(current) if cost >= current.cost() => {
            if cost < *second_best {
                *second_best = cost;
            }
        }
        _ => {
            if let Some(previous) = best.take() {
                *second_best = (*second_best).min(previous.cost());
            }
            *best = Some(make());
        }
    }
}

/// Best and second-best insertion across every route, second-best taken
/// over distinct routes. Frozen routes are skipped.
pub fn best_insertion_any_route(
    problem: &Problem,
    solution: &SolutionState,
    job_idx: JobIdx,
) -> (Option<Insertion>, Cost) {
    let mut best: Option<Insertion> = None;
    let mut second_best = INFINITE_COST;

    for route_idx in 0..solution.routes().len() {
        let (candidate, _) =
            best_insertion_in_route(problem, solution, RouteIdx::new(route_idx), job_idx);
        let Some(candidate) = candidate else { continue };

        match &best {
            Some(current) if candidate.cost() >= current.cost() => {
                if candidate.cost() < second_best {
                    second_best = candidate.cost();
                }
            }
            _ => {
                if let Some(previous) = best.take() {
                    second_best = second_best.min(previous.cost());
                }
                best = Some(candidate);
            }
        }
    }

    (best, second_best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, ProblemConfig};

    #[test]
    fn test_single_insertion_prefers_cheapest_position() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 3,
            travel: 10,
            ..ProblemConfig::default()
        });
        let mut solution = SolutionState::new(&problem);

        // Route serves jobs 0 and 2 (locations 1 and 3); job 1 (location 2)
        // slots in between at zero extra cost on the line.
        for insertion in [
            Insertion::Single {
                route: RouteIdx::new(0),
                job: JobIdx::new(0),
                position: 0,
                cost: 0,
            },
            Insertion::Single {
                route: RouteIdx::new(0),
                job: JobIdx::new(2),
                position: 1,
                cost: 0,
            },
        ] {
            insertion.apply(&problem, &mut solution);
        }

        let (best, second) =
            best_insertion_in_route(&problem, &solution, RouteIdx::new(0), JobIdx::new(1));
        let best = best.unwrap();
        assert_eq!(best.cost(), 0);
        match best {
            Insertion::Single { position, .. } => assert_eq!(position, 1),
            _ => panic!("expected a single insertion"),
        }
        // The mirrored slot right before the return leg is equally cheap on
        // a symmetric line.
        assert_eq!(second, 0);
    }

    #[test]
    fn test_shipment_insertion_keeps_precedence() {
        let problem = test_utils::shipment_problem();
        let solution = SolutionState::new(&problem);

        let (best, _) =
            best_insertion_in_route(&problem, &solution, RouteIdx::new(0), JobIdx::new(0));
        let best = best.unwrap();
        match best {
            Insertion::Shipment {
                pickup_position,
                delivery_position,
                ..
            } => {
                assert!(pickup_position <= delivery_position);
            }
            _ => panic!("expected a shipment insertion"),
        }
    }

    #[test]
    fn test_incompatible_vehicle_yields_nothing() {
        let problem = test_utils::skill_mismatch_problem();
        let solution = SolutionState::new(&problem);

        let (best, second) =
            best_insertion_in_route(&problem, &solution, RouteIdx::new(0), JobIdx::new(0));
        assert!(best.is_none());
        assert_eq!(second, INFINITE_COST);
    }
}
