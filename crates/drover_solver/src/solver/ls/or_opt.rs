use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        solution::{RouteIdx, SolutionState},
    },
};

pub const SEGMENT_LENGTHS: [usize; 2] = [2, 3];

/// Moves a 2- or 3-step job segment from one route to another, keeping its
/// order.
#[derive(Clone, Debug)]
pub struct OrOpt {
    pub from_route: RouteIdx,
    pub to_route: RouteIdx,
    pub start: usize,
    pub len: usize,
    pub to: usize,
}

impl LocalSearchOperator for OrOpt {
    fn generate_moves<C>(
        _problem: &Problem,
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

        for len in SEGMENT_LENGTHS {
            if from_route.len() < len {
                continue;
            }
            for start in 0..=from_route.len() - len {
                if !from_route.is_job_run(start, start + len) {
                    continue;
                }
                for to in 0..=to_route.len() {
                    consumer(OrOpt {
                        from_route: r1,
                        to_route: r2,
                        start,
                        len,
                        to,
                    });
                }
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let segment = solution.route(self.from_route).steps()
            [self.start..self.start + self.len]
            .iter()
            .copied();

        pair_delta(
            problem,
            solution,
            self.from_route,
            std::iter::empty(),
            (self.start, self.start + self.len),
            self.to_route,
            segment,
            (self.to, self.to),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let segment: Vec<_> = solution.route(self.from_route).steps()
            [self.start..self.start + self.len]
            .to_vec();

        solution
            .route_mut(self.to_route)
            .replace(problem, segment.into_iter(), self.to, self.to);
        solution.route_mut(self.from_route).replace(
            problem,
            std::iter::empty(),
            self.start,
            self.start + self.len,
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
    fn test_or_opt_moves_segment() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 6,
            vehicles: 2,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[0, 1, 2, 3]), (1, &[4, 5])]);

        let op = OrOpt {
            from_route: RouteIdx::new(0),
            to_route: RouteIdx::new(1),
            start: 1,
            len: 2,
            to: 0,
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        let order: Vec<usize> = solution
            .route(RouteIdx::new(1))
            .steps()
            .iter()
            .map(|s| s.job().unwrap().get())
            .collect();
        assert_eq!(order, vec![1, 2, 4, 5]);
    }
}
