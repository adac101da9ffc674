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

/// Moves a single step to another position of the same route. The step is
/// inserted *at* index `to`, effectively placing it after the step at
/// `to - 1`.
///
/// ```text
/// BEFORE:  ... (A) -> [from] -> (C) ... (X) -> (Y) ...
/// AFTER:   ... (A) -> (C) ... (X) -> [from] -> (Y) ...
/// ```
#[derive(Clone, Debug)]
pub struct IntraRelocate {
    pub route: RouteIdx,
    pub from: usize,
    pub to: usize,
}

impl IntraRelocate {
    /// The splice realizing the move as a single contiguous replacement.
    fn splice(&self, solution: &SolutionState) -> (SmallVec<[Step; 8]>, usize, usize) {
        let route = solution.route(self.route);
        let step = route.step(self.from);

        if self.from < self.to {
            let mut seq: SmallVec<[Step; 8]> = route.steps()[self.from + 1..self.to]
                .iter()
                .copied()
                .collect();
            seq.push(step);
            (seq, self.from, self.to)
        } else {
            let mut seq = SmallVec::new();
            seq.push(step);
            seq.extend(route.steps()[self.to..self.from].iter().copied());
            (seq, self.to, self.from + 1)
        }
    }
}

impl LocalSearchOperator for IntraRelocate {
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
        if route.is_frozen() {
            return;
        }

        for from in 0..route.len() {
            if route.step(from).is_break() {
                continue;
            }
            for to in 0..=route.len() {
                // Same position and the slot right after are no-ops.
                if to == from || to == from + 1 {
                    continue;
                }
                consumer(IntraRelocate {
                    route: r1,
                    from,
                    to,
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
    fn test_intra_relocate_forward() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 5,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[0, 1, 2, 3, 4])]);

        let op = IntraRelocate {
            route: RouteIdx::new(0),
            from: 1,
            to: 4,
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        let order: Vec<usize> = solution
            .route(RouteIdx::new(0))
            .steps()
            .iter()
            .map(|s| s.job().unwrap().get())
            .collect();
        assert_eq!(order, vec![0, 2, 3, 1, 4]);
    }

    #[test]
    fn test_intra_relocate_backward() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 5,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[0, 1, 2, 3, 4])]);

        let op = IntraRelocate {
            route: RouteIdx::new(0),
            from: 3,
            to: 1,
        };
        op.apply(&problem, &mut solution);

        let order: Vec<usize> = solution
            .route(RouteIdx::new(0))
            .steps()
            .iter()
            .map(|s| s.job().unwrap().get())
            .collect();
        assert_eq!(order, vec![0, 3, 1, 2, 4]);
    }
}
