use smallvec::SmallVec;

use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::LocalSearchOperator,
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// Swaps two single steps of one route.
#[derive(Clone, Debug)]
pub struct IntraExchange {
    pub route: RouteIdx,
    /// `first < second`.
    pub first: usize,
    pub second: usize,
}

impl IntraExchange {
    fn splice(&self, solution: &SolutionState) -> (SmallVec<[Step; 8]>, usize, usize) {
        let steps = solution.route(self.route).steps();

        let mut seq = SmallVec::new();
        seq.push(steps[self.second]);
        seq.extend(steps[self.first + 1..self.second].iter().copied());
        seq.push(steps[self.first]);

        (seq, self.first, self.second + 1)
    }
}

impl LocalSearchOperator for IntraExchange {
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

        for first in 0..route.len() - 1 {
            if route.step(first).is_break() {
                continue;
            }
            for second in first + 1..route.len() {
                if route.step(second).is_break() {
                    continue;
                }
                consumer(IntraExchange {
                    route: r1,
                    first,
                    second,
                });
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let (seq, start, end) = self.splice(solution);
        solution
            .route(self.route)
            .evaluate_splice(problem, seq.iter().copied(), start, end)
            .map(|delta| delta.cost)
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let (seq, start, end) = self.splice(solution);
        solution
            .route_mut(self.route)
            .replace(problem, seq.into_iter(), start, end);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, ProblemConfig};

    #[test]
    fn test_intra_exchange_swaps_steps() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 4,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[3, 1, 2, 0])]);

        let op = IntraExchange {
            route: RouteIdx::new(0),
            first: 0,
            second: 3,
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        assert!(delta < 0);
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        let order: Vec<usize> = solution
            .route(RouteIdx::new(0))
            .steps()
            .iter()
            .map(|s| s.job().unwrap().get())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }
}
