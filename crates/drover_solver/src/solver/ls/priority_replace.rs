use crate::{
    constants::{Cost, Priority},
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

/// Evicts a low-priority assigned job in favor of a higher-priority
/// unassigned one. Unlike the cost operators, the gain of this move is
/// measured in priority first; the driver applies it even at a cost
/// increase.
#[derive(Clone, Debug)]
pub struct PriorityReplace {
    pub route: RouteIdx,
    /// Position of the evicted job.
    pub position: usize,
    pub incoming: JobIdx,
    /// Re-entry position of the incoming job, over the route with the
    /// evicted one removed.
    pub insert: usize,
}

impl PriorityReplace {
    /// Priority gained by the swap.
    pub fn priority_gain(&self, problem: &Problem, solution: &SolutionState) -> Priority {
        let Some(outgoing) = solution.route(self.route).job_at(self.position) else {
            return 0;
        };
        problem
            .job(self.incoming)
            .priority()
            .saturating_sub(problem.job(outgoing).priority())
    }
}

impl LocalSearchOperator for PriorityReplace {
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
                if problem.job(outgoing).priority() >= incoming_priority {
                    continue;
                }

                for insert in 0..=route.len() {
                    consumer(PriorityReplace {
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
            .expect("priority replace must evict a job");

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
    fn test_priority_replace_prefers_urgent_job() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 3,
            max_tasks: Some(2),
            priorities: vec![0, 0, 10],
            ..ProblemConfig::default()
        });
        // Jobs 0 and 1 assigned, the priority-10 job 2 left out.
        let mut solution = test_utils::solution_with_routes(&problem, &[(0, &[0, 1])]);

        let op = PriorityReplace {
            route: RouteIdx::new(0),
            position: 1,
            incoming: JobIdx::new(2),
            insert: 1,
        };

        assert_eq!(op.priority_gain(&problem, &solution), 10);
        assert!(op.evaluate(&problem, &solution).is_some());

        op.apply(&problem, &mut solution);
        assert!(solution.is_unassigned(JobIdx::new(1)));
        assert!(!solution.is_unassigned(JobIdx::new(2)));
    }
}
