use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        solution::{RouteIdx, SolutionState},
    },
};

/// Swaps the tails of two routes after the given cut positions, preserving
/// tail order. Classic fix for a pair of crossing routes.
///
/// ```text
/// BEFORE:  R1: [head 1] -> [tail 1]
///          R2: [head 2] -> [tail 2]
///
/// AFTER:   R1: [head 1] -> [tail 2]
///          R2: [head 2] -> [tail 1]
/// ```
#[derive(Clone, Debug)]
pub struct TwoOpt {
    pub first_route: RouteIdx,
    pub second_route: RouteIdx,
    /// Tail of the first route starts here.
    pub first_cut: usize,
    pub second_cut: usize,
}

impl LocalSearchOperator for TwoOpt {
    fn generate_moves<C>(
        _problem: &Problem,
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

        // Tails may not contain breaks: those stay with their vehicle.
        for first_cut in first.tail_start_min()..=first.len() {
            for second_cut in second.tail_start_min()..=second.len() {
                if first_cut == first.len() && second_cut == second.len() {
                    continue;
                }
                consumer(TwoOpt {
                    first_route: r1,
                    second_route: r2,
                    first_cut,
                    second_cut,
                });
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let first_tail = solution.route(self.first_route).steps()[self.first_cut..]
            .iter()
            .copied();
        let second_tail = solution.route(self.second_route).steps()[self.second_cut..]
            .iter()
            .copied();

        let first_len = solution.route(self.first_route).len();
        let second_len = solution.route(self.second_route).len();

        pair_delta(
            problem,
            solution,
            self.first_route,
            second_tail,
            (self.first_cut, first_len),
            self.second_route,
            first_tail,
            (self.second_cut, second_len),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let first_tail: Vec<_> =
            solution.route(self.first_route).steps()[self.first_cut..].to_vec();
        let second_tail: Vec<_> =
            solution.route(self.second_route).steps()[self.second_cut..].to_vec();

        let first_len = solution.route(self.first_route).len();
        solution.route_mut(self.first_route).replace(
            problem,
            second_tail.into_iter(),
            self.first_cut,
            first_len,
        );

        let second_len = solution.route(self.second_route).len();
        solution.route_mut(self.second_route).replace(
            problem,
            first_tail.into_iter(),
            self.second_cut,
            second_len,
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
    fn test_two_opt_swaps_tails() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 8,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution = test_utils::solution_with_routes(
            &problem,
            &[(0, &[0, 1, 2, 3]), (1, &[4, 5, 6, 7])],
        );

        let op = TwoOpt {
            first_route: RouteIdx::new(0),
            second_route: RouteIdx::new(1),
            first_cut: 2,
            second_cut: 3,
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
        assert_eq!(first, vec![0, 1, 7]);
        assert_eq!(second, vec![4, 5, 6, 2, 3]);
    }
}
