use crate::{
    constants::Cost,
    problem::{Problem, job::JobKind},
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// Moves one single job from a route to a position in another route.
/// Shipment pairs travel via PD-Shift instead.
#[derive(Clone, Debug)]
pub struct Relocate {
    pub from_route: RouteIdx,
    pub to_route: RouteIdx,
    pub from: usize,
    pub to: usize,
}

impl LocalSearchOperator for Relocate {
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

        for from in 0..from_route.len() {
            let Some(job) = from_route.job_at(from) else {
                continue;
            };
            if problem.job(job).kind() != JobKind::Single {
                continue;
            }
            if !problem.vehicle_ok_with_job(to_route.vehicle(), job) {
                continue;
            }

            for to in 0..=to_route.len() {
                consumer(Relocate {
                    from_route: r1,
                    to_route: r2,
                    from,
                    to,
                });
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let job = solution.route(self.from_route).job_at(self.from)?;

        pair_delta(
            problem,
            solution,
            self.from_route,
            std::iter::empty(),
            (self.from, self.from + 1),
            self.to_route,
            std::iter::once(Step::Job(job)),
            (self.to, self.to),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let job = solution
            .route(self.from_route)
            .job_at(self.from)
            .expect("relocate source must be a job");

        solution.route_mut(self.to_route).replace(
            problem,
            std::iter::once(Step::Job(job)),
            self.to,
            self.to,
        );
        solution.route_mut(self.from_route).replace(
            problem,
            std::iter::empty(),
            self.from,
            self.from + 1,
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
    fn test_relocate_delta_matches_apply() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 4,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[0, 3]), (1, &[1, 2])]);

        let before = solution.total_cost(&problem);
        let op = Relocate {
            from_route: RouteIdx::new(0),
            to_route: RouteIdx::new(1),
            from: 1,
            to: 2,
        };

        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        assert_eq!(solution.route(RouteIdx::new(0)).job_count(), 1);
        assert_eq!(solution.route(RouteIdx::new(1)).job_count(), 3);
    }
}
