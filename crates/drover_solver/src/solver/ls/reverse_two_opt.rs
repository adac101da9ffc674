use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        solution::{RouteIdx, SolutionState},
    },
};

/// Tail swap variant that reverses the tail received by the first route.
/// Catches crossings that plain Two-Opt cannot undo when one tail runs in
/// the opposite direction.
#[derive(Clone, Debug)]
pub struct ReverseTwoOpt {
    pub first_route: RouteIdx,
    pub second_route: RouteIdx,
    pub first_cut: usize,
    pub second_cut: usize,
}

impl LocalSearchOperator for ReverseTwoOpt {
    fn generate_moves<C>(
        _problem: &Problem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        // Reversal makes the exchange asymmetric, so both orderings of the
        // pair produce distinct moves.
        if r1 == r2 {
            return;
        }

        let first = solution.route(r1);
        let second = solution.route(r2);
        if first.is_frozen() || second.is_frozen() {
            return;
        }

        for first_cut in first.tail_start_min()..=first.len() {
            for second_cut in second.tail_start_min()..second.len() {
                consumer(ReverseTwoOpt {
                    first_route: r1,
                    second_route: r2,
                    first_cut,
                    second_cut,
                });
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let second_tail_reversed = solution.route(self.second_route).steps()
            [self.second_cut..]
            .iter()
            .rev()
            .copied();
        let first_tail = solution.route(self.first_route).steps()[self.first_cut..]
            .iter()
            .copied();

        let first_len = solution.route(self.first_route).len();
        let second_len = solution.route(self.second_route).len();

        pair_delta(
            problem,
            solution,
            self.first_route,
            second_tail_reversed,
            (self.first_cut, first_len),
            self.second_route,
            first_tail,
            (self.second_cut, second_len),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let second_tail_reversed: Vec<_> = solution.route(self.second_route).steps()
            [self.second_cut..]
            .iter()
            .rev()
            .copied()
            .collect();
        let first_tail: Vec<_> =
            solution.route(self.first_route).steps()[self.first_cut..].to_vec();

        let first_len = solution.route(self.first_route).len();
        solution.route_mut(self.first_route).replace(
            problem,
            second_tail_reversed.into_iter(),
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
    fn test_reverse_two_opt_reverses_received_tail() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 6,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution = test_utils::solution_with_routes(
            &problem,
            &[(0, &[0, 1, 2]), (1, &[3, 4, 5])],
        );

        let op = ReverseTwoOpt {
            first_route: RouteIdx::new(0),
            second_route: RouteIdx::new(1),
            first_cut: 2,
            second_cut: 1,
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
        assert_eq!(first, vec![0, 1, 5, 4]);
        assert_eq!(second, vec![3, 2]);
    }
}
