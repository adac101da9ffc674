use crate::{
    constants::{Cost, INFINITE_COST},
    problem::{Problem, job::JobKind},
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta, remove_then_insert},
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// Swaps two single jobs across routes, each re-entering the other route at
/// its best position rather than the vacated slot.
#[derive(Clone, Debug)]
pub struct SwapStar {
    pub first_route: RouteIdx,
    pub second_route: RouteIdx,
    /// Current positions of the swapped jobs.
    pub first_position: usize,
    pub second_position: usize,
    /// Chosen re-entry positions, expressed over the route with the leaving
    /// job removed.
    pub first_insert: usize,
    pub second_insert: usize,
}

/// Best re-entry position of `incoming` into `route` with the step at
/// `leaving` removed. Positions and deltas refer to the single combined
/// splice.
fn best_reentry(
    problem: &Problem,
    solution: &SolutionState,
    route: RouteIdx,
    leaving: usize,
    incoming: Step,
) -> Option<(usize, Cost)> {
    let steps = solution.route(route).steps();
    let mut best: Option<(usize, Cost)> = None;

    for insert in 0..=steps.len() {
        let (seq, start, end) = remove_then_insert(steps, leaving, insert, incoming);
        let Some(delta) = solution.route(route).evaluate_splice(
            problem,
            seq.iter().copied(),
            start,
            end,
        ) else {
            continue;
        };

        if best.map(|(_, cost)| delta.cost < cost).unwrap_or(true) {
            best = Some((insert, delta.cost));
        }
    }

    best
}

impl LocalSearchOperator for SwapStar {
    fn generate_moves<C>(
        problem: &Problem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 >= r2 {
            return;
        }

        let first = solution.route(r1);
        let second = solution.route(r2);
        if first.is_frozen() || second.is_frozen() {
            return;
        }

        for first_position in 0..first.len() {
            let Some(a) = first.job_at(first_position) else {
                continue;
            };
            if problem.job(a).kind() != JobKind::Single
                || !problem.vehicle_ok_with_job(second.vehicle(), a)
            {
                continue;
            }

            for second_position in 0..second.len() {
                let Some(b) = second.job_at(second_position) else {
                    continue;
                };
                if problem.job(b).kind() != JobKind::Single
                    || !problem.vehicle_ok_with_job(first.vehicle(), b)
                {
                    continue;
                }

                // Pick each side's best re-entry before emitting the move.
                let Some((first_insert, _)) =
                    best_reentry(problem, solution, r1, first_position, Step::Job(b))
                else {
                    continue;
                };
                let Some((second_insert, _)) =
                    best_reentry(problem, solution, r2, second_position, Step::Job(a))
                else {
                    continue;
                };

                consumer(SwapStar {
                    first_route: r1,
                    second_route: r2,
                    first_position,
                    second_position,
                    first_insert,
                    second_insert,
                });
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let a = solution.route(self.first_route).job_at(self.first_position)?;
        let b = solution
            .route(self.second_route)
            .job_at(self.second_position)?;

        let (seq1, start1, end1) = remove_then_insert(
            solution.route(self.first_route).steps(),
            self.first_position,
            self.first_insert,
            Step::Job(b),
        );
        let (seq2, start2, end2) = remove_then_insert(
            solution.route(self.second_route).steps(),
            self.second_position,
            self.second_insert,
            Step::Job(a),
        );

        let delta = pair_delta(
            problem,
            solution,
            self.first_route,
            seq1.iter().copied(),
            (start1, end1),
            self.second_route,
            seq2.iter().copied(),
            (start2, end2),
        )?;
        (delta < INFINITE_COST).then_some(delta)
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let a = solution
            .route(self.first_route)
            .job_at(self.first_position)
            .expect("swap-star first position must be a job");
        let b = solution
            .route(self.second_route)
            .job_at(self.second_position)
            .expect("swap-star second position must be a job");

        let (seq1, start1, end1) = remove_then_insert(
            solution.route(self.first_route).steps(),
            self.first_position,
            self.first_insert,
            Step::Job(b),
        );
        let (seq2, start2, end2) = remove_then_insert(
            solution.route(self.second_route).steps(),
            self.second_position,
            self.second_insert,
            Step::Job(a),
        );

        solution
            .route_mut(self.first_route)
            .replace(problem, seq1.into_iter(), start1, end1);
        solution
            .route_mut(self.second_route)
            .replace(problem, seq2.into_iter(), start2, end2);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.first_route, self.second_route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, ProblemConfig};

    #[test]
    fn test_swap_star_repositions_both_jobs() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 6,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        // Job 5 sits badly in the first route, job 0 badly in the second.
        let mut solution = test_utils::solution_with_routes(
            &problem,
            &[(0, &[1, 5, 2]), (1, &[4, 0, 3])],
        );

        let mut best: Option<(Cost, SwapStar)> = None;
        SwapStar::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(1)),
            |op| {
                if let Some(delta) = op.evaluate(&problem, &solution)
                    && best.as_ref().map(|(cost, _)| delta < *cost).unwrap_or(true)
                {
                    best = Some((delta, op));
                }
            },
        );

        let (delta, op) = best.expect("an improving swap must exist");
        assert!(delta < 0);

        let before = solution.total_cost(&problem);
        op.apply(&problem, &mut solution);
        assert_eq!(solution.total_cost(&problem), before + delta);
    }
}
