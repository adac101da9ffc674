use crate::{
    constants::Cost,
    problem::{Problem, job::JobKind},
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

const SEGMENT_LEN: usize = 2;

/// Swaps one single job of the first route with a 2-step job segment of the
/// second route.
#[derive(Clone, Debug)]
pub struct MixedExchange {
    pub single_route: RouteIdx,
    pub segment_route: RouteIdx,
    pub single_position: usize,
    pub segment_start: usize,
}

impl LocalSearchOperator for MixedExchange {
    fn generate_moves<C>(
        problem: &Problem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 == r2 {
            return;
        }

        let single_route = solution.route(r1);
        let segment_route = solution.route(r2);
        if single_route.is_frozen() || segment_route.is_frozen() {
            return;
        }
        if segment_route.len() < SEGMENT_LEN {
            return;
        }

        for single_position in 0..single_route.len() {
            let Some(job) = single_route.job_at(single_position) else {
                continue;
            };
            if problem.job(job).kind() != JobKind::Single {
                continue;
            }

            for segment_start in 0..=segment_route.len() - SEGMENT_LEN {
                if !segment_route.is_job_run(segment_start, segment_start + SEGMENT_LEN) {
                    continue;
                }
                consumer(MixedExchange {
                    single_route: r1,
                    segment_route: r2,
                    single_position,
                    segment_start,
                });
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let single = solution
            .route(self.single_route)
            .job_at(self.single_position)?;
        let segment = solution.route(self.segment_route).steps()
            [self.segment_start..self.segment_start + SEGMENT_LEN]
            .iter()
            .copied();

        pair_delta(
            problem,
            solution,
            self.single_route,
            segment,
            (self.single_position, self.single_position + 1),
            self.segment_route,
            std::iter::once(Step::Job(single)),
            (self.segment_start, self.segment_start + SEGMENT_LEN),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let single = solution
            .route(self.single_route)
            .job_at(self.single_position)
            .expect("mixed exchange needs a job at the single position");
        let segment: Vec<_> = solution.route(self.segment_route).steps()
            [self.segment_start..self.segment_start + SEGMENT_LEN]
            .to_vec();

        solution.route_mut(self.single_route).replace(
            problem,
            segment.into_iter(),
            self.single_position,
            self.single_position + 1,
        );
        solution.route_mut(self.segment_route).replace(
            problem,
            std::iter::once(Step::Job(single)),
            self.segment_start,
            self.segment_start + SEGMENT_LEN,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.single_route, self.segment_route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, ProblemConfig};

    #[test]
    fn test_mixed_exchange_swaps_one_for_two() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 6,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution = test_utils::solution_with_routes(
            &problem,
            &[(0, &[0, 1, 2]), (1, &[3, 4, 5])],
        );

        let op = MixedExchange {
            single_route: RouteIdx::new(0),
            segment_route: RouteIdx::new(1),
            single_position: 1,
            segment_start: 1,
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        assert_eq!(solution.route(RouteIdx::new(0)).job_count(), 4);
        assert_eq!(solution.route(RouteIdx::new(1)).job_count(), 2);
    }
}
