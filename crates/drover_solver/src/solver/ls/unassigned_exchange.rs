use crate::{
    constants::Cost,
    problem::{
        Problem,
        job::{JobIdx, JobKind},
    },
    solver::{
        ls::operator::{LocalSearchOperator, remove_then_insert},
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// Swaps an assigned single job with an unassigned one of the same
/// priority. A cost improvement is what makes the move worth applying; the
/// priority-increasing case belongs to Priority-Replace.
#[derive(Clone, Debug)]
pub struct UnassignedExchange {
    pub route: RouteIdx,
    pub position: usize,
    pub incoming: JobIdx,
    /// Re-entry position over the route with the outgoing job removed.
    pub insert: usize,
}

impl LocalSearchOperator for UnassignedExchange {
    fn generate_moves<C>(
        problem: &Problem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 != r2 {
            return;
        }

        let route = solution.route(r1);
        if route.is_frozen() {
            return;
        }

        for incoming in solution.unassigned_sorted() {
            if problem.job(incoming).kind() != JobKind::Single {
                continue;
            }
            if !problem.vehicle_ok_with_job(route.vehicle(), incoming) {
                continue;
            }
            let incoming_priority = problem.job(incoming).priority();

            for position in 0..route.len() {
                let Some(outgoing) = route.job_at(position) else {
                    continue;
                };
                if problem.job(outgoing).kind() != JobKind::Single {
                    continue;
                }
                if problem.job(outgoing).priority() != incoming_priority {
                    continue;
                }

                for insert in 0..=route.len() {
                    consumer(UnassignedExchange {
                        route: r1,
                        position,
                        incoming,
                        insert,
                    });
                }
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let (seq, start, end) = remove_then_insert(
            solution.route(self.route).steps(),
            self.position,
            self.insert,
            Step::Job(self.incoming),
        );

        solution
            .route(self.route)
            .evaluate_splice(problem, seq.iter().copied(), start, end)
            .map(|delta| delta.cost)
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let outgoing = solution
            .route(self.route)
            .job_at(self.position)
            .expect("unassigned exchange must swap out a job");

        let (seq, start, end) = remove_then_insert(
            solution.route(self.route).steps(),
            self.position,
            self.insert,
            Step::Job(self.incoming),
        );
        solution
            .route_mut(self.route)
            .replace(problem, seq.into_iter(), start, end);

        solution.mark_assigned(self.incoming);
        solution.mark_unassigned(outgoing);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        problem::job::JobIdx,
        test_utils::{self, ProblemConfig},
    };

    #[test]
    fn test_unassigned_exchange_swaps_jobs() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 3,
            max_tasks: Some(2),
            ..ProblemConfig::default()
        });
        // Detour order leaves job 1 out.
        let mut solution = test_utils::solution_with_routes(&problem, &[(0, &[0, 2])]);

        let op = UnassignedExchange {
            route: RouteIdx::new(0),
            position: 1,
            incoming: JobIdx::new(1),
            insert: 1,
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        assert!(solution.is_unassigned(JobIdx::new(2)));
        assert!(!solution.is_unassigned(JobIdx::new(1)));
    }
}
