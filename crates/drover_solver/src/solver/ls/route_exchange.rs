use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        solution::{RouteIdx, SolutionState},
    },
};

/// Swaps the full job sequences of two vehicles. Only generated for
/// break-free routes, since breaks are bound to their own vehicle.
#[derive(Clone, Debug)]
pub struct RouteExchange {
    pub first_route: RouteIdx,
    pub second_route: RouteIdx,
}

impl LocalSearchOperator for RouteExchange {
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
        if !first.is_job_run(0, first.len()) || !second.is_job_run(0, second.len()) {
            return;
        }
        // Swapping two empty routes is a no-op.
        if !first.has_jobs() && !second.has_jobs() {
            return;
        }

        consumer(RouteExchange {
            first_route: r1,
            second_route: r2,
        });
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let first = solution.route(self.first_route);
        let second = solution.route(self.second_route);

        pair_delta(
            problem,
            solution,
            self.first_route,
            second.steps().iter().copied(),
            (0, first.len()),
            self.second_route,
            first.steps().iter().copied(),
            (0, second.len()),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let first_steps: Vec<_> = solution.route(self.first_route).steps().to_vec();
        let second_steps: Vec<_> = solution.route(self.second_route).steps().to_vec();

        let first_len = first_steps.len();
        let second_len = second_steps.len();

        solution.route_mut(self.first_route).replace(
            problem,
            second_steps.into_iter(),
            0,
            first_len,
        );
        solution.route_mut(self.second_route).replace(
            problem,
            first_steps.into_iter(),
            0,
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
    fn test_route_exchange_swaps_routes() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 5,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[0, 1]), (1, &[2, 3, 4])]);

        let op = RouteExchange {
            first_route: RouteIdx::new(0),
            second_route: RouteIdx::new(1),
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        assert_eq!(solution.route(RouteIdx::new(0)).job_count(), 3);
        assert_eq!(solution.route(RouteIdx::new(1)).job_count(), 2);
    }
}
