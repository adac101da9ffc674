use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        solution::{RouteIdx, SolutionState},
    },
};

/// Splits one route by handing its tail to an unused vehicle. Pays that
/// vehicle's fixed cost, which the splice evaluation accounts for.
#[derive(Clone, Debug)]
pub struct RouteSplit {
    pub from_route: RouteIdx,
    pub to_route: RouteIdx,
    /// The tail `[split, len)` moves.
    pub split: usize,
}

impl LocalSearchOperator for RouteSplit {
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

        let from_route = solution.route(r1);
        let to_route = solution.route(r2);
        if from_route.is_frozen() || to_route.is_frozen() {
            return;
        }
        // Only split toward an unused vehicle.
        if to_route.has_jobs() || from_route.job_count() < 2 {
            return;
        }

        for split in from_route.tail_start_min().max(1)..from_route.len() {
            // The whole tail must be serviceable by the new vehicle.
            let compatible = from_route.steps()[split..]
                .iter()
                .filter_map(|s| s.job())
                .all(|job| problem.vehicle_ok_with_job(to_route.vehicle(), job));
            if !compatible {
                continue;
            }

            consumer(RouteSplit {
                from_route: r1,
                to_route: r2,
                split,
            });
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let from_route = solution.route(self.from_route);
        let to_route = solution.route(self.to_route);
        let tail = from_route.steps()[self.split..].iter().copied();

        // The tail lands after the target's own breaks.
        pair_delta(
            problem,
            solution,
            self.from_route,
            std::iter::empty(),
            (self.split, from_route.len()),
            self.to_route,
            tail,
            (to_route.len(), to_route.len()),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let tail: Vec<_> = solution.route(self.from_route).steps()[self.split..].to_vec();

        let to_len = solution.route(self.to_route).len();
        solution
            .route_mut(self.to_route)
            .replace(problem, tail.into_iter(), to_len, to_len);

        let from_len = solution.route(self.from_route).len();
        solution.route_mut(self.from_route).replace(
            problem,
            std::iter::empty(),
            self.split,
            from_len,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.from_route, self.to_route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, ProblemConfig};

    #[test]
    fn test_route_split_moves_tail_to_empty_vehicle() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 4,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[0, 1, 2, 3])]);

        let op = RouteSplit {
            from_route: RouteIdx::new(0),
            to_route: RouteIdx::new(1),
            split: 2,
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        assert_eq!(solution.route(RouteIdx::new(0)).job_count(), 2);
        assert_eq!(solution.route(RouteIdx::new(1)).job_count(), 2);
    }
}
