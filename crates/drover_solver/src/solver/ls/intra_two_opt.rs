use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::LocalSearchOperator,
        solution::{RouteIdx, SolutionState},
    },
};

/// Reverses a job segment within one route, removing a crossing in the
/// tour.
#[derive(Clone, Debug)]
pub struct IntraTwoOpt {
    pub route: RouteIdx,
    /// Inclusive segment bounds; the segment `[start, end]` is reversed.
    pub start: usize,
    pub end: usize,
}

impl LocalSearchOperator for IntraTwoOpt {
    fn generate_moves<C>(
        _problem: &Problem,
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
        if route.is_frozen() || route.len() < 2 {
            return;
        }

        for start in 0..route.len() - 1 {
            for end in start + 1..route.len() {
                if !route.is_job_run(start, end + 1) {
                    continue;
                }
                consumer(IntraTwoOpt {
                    route: r1,
                    start,
                    end,
                });
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let reversed = solution.route(self.route).steps()[self.start..=self.end]
            .iter()
            .rev()
            .copied();
        solution
            .route(self.route)
            .evaluate_splice(problem, reversed, self.start, self.end + 1)
            .map(|delta| delta.cost)
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let reversed: Vec<_> = solution.route(self.route).steps()[self.start..=self.end]
            .iter()
            .rev()
            .copied()
            .collect();
        solution.route_mut(self.route).replace(
            problem,
            reversed.into_iter(),
            self.start,
            self.end + 1,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route]
    }
}
