use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        solution::{RouteIdx, SolutionState},
    },
};

const SEGMENT_LEN: usize = 2;

/// Swaps two 2-step job segments between routes.
///
/// ```text
/// BEFORE:  R1: ... (A) -> [s1, s1+1] -> (B) ...
///          R2: ... (C) -> [s2, s2+1] -> (D) ...
///
/// AFTER:   R1: ... (A) -> [s2, s2+1] -> (B) ...
///          R2: ... (C) -> [s1, s1+1] -> (D) ...
/// ```
#[derive(Clone, Debug)]
pub struct CrossExchange {
    pub first_route: RouteIdx,
    pub second_route: RouteIdx,
    pub first_start: usize,
    pub second_start: usize,
}

impl LocalSearchOperator for CrossExchange {
    fn generate_moves<C>(
        _problem: &Problem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        // Unordered exchange: only visit each route pair once.
        if r1 >= r2 {
            return;
        }

        let first = solution.route(r1);
        let second = solution.route(r2);
        if first.is_frozen() || second.is_frozen() {
            return;
        }
        if first.len() < SEGMENT_LEN || second.len() < SEGMENT_LEN {
            return;
        }

        for first_start in 0..=first.len() - SEGMENT_LEN {
            if !first.is_job_run(first_start, first_start + SEGMENT_LEN) {
                continue;
            }
            for second_start in 0..=second.len() - SEGMENT_LEN {
                if !second.is_job_run(second_start, second_start + SEGMENT_LEN) {
                    continue;
                }
                consumer(CrossExchange {
                    first_route: r1,
                    second_route: r2,
                    first_start,
                    second_start,
                });
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let first_segment = solution.route(self.first_route).steps()
            [self.first_start..self.first_start + SEGMENT_LEN]
            .iter()
            .copied();
        let second_segment = solution.route(self.second_route).steps()
            [self.second_start..self.second_start + SEGMENT_LEN]
            .iter()
            .copied();

        pair_delta(
            problem,
            solution,
            self.first_route,
            second_segment,
            (self.first_start, self.first_start + SEGMENT_LEN),
            self.second_route,
            first_segment,
            (self.second_start, self.second_start + SEGMENT_LEN),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let first_segment: Vec<_> = solution.route(self.first_route).steps()
            [self.first_start..self.first_start + SEGMENT_LEN]
            .to_vec();
        let second_segment: Vec<_> = solution.route(self.second_route).steps()
            [self.second_start..self.second_start + SEGMENT_LEN]
            .to_vec();

        solution.route_mut(self.first_route).replace(
            problem,
            second_segment.into_iter(),
            self.first_start,
            self.first_start + SEGMENT_LEN,
        );
        solution.route_mut(self.second_route).replace(
            problem,
            first_segment.into_iter(),
            self.second_start,
            self.second_start + SEGMENT_LEN,
        );
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
    fn test_cross_exchange_swaps_segments() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 8,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution = test_utils::solution_with_routes(
            &problem,
            &[(0, &[0, 1, 2, 3]), (1, &[4, 5, 6, 7])],
        );

        let op = CrossExchange {
            first_route: RouteIdx::new(0),
            second_route: RouteIdx::new(1),
            first_start: 1,
            second_start: 2,
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        let first: Vec<usize> = solution
            .route(RouteIdx::new(0))
            .steps()
            .iter()
            .map(|s| s.job().unwrap().get())
            .collect();
        let second: Vec<usize> = solution
            .route(RouteIdx::new(1))
            .steps()
            .iter()
            .map(|s| s.job().unwrap().get())
            .collect();
        assert_eq!(first, vec![0, 6, 7, 3]);
        assert_eq!(second, vec![4, 5, 1, 2]);
    }
}
