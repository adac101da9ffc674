use smallvec::SmallVec;

use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::{operator::LocalSearchOperator, or_opt::SEGMENT_LENGTHS},
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// Moves a 2- or 3-step job segment to another position of the same route.
#[derive(Clone, Debug)]
pub struct IntraOrOpt {
    pub route: RouteIdx,
    pub start: usize,
    pub len: usize,
    pub to: usize,
}

impl IntraOrOpt {
    fn splice(&self, solution: &SolutionState) -> (SmallVec<[Step; 8]>, usize, usize) {
        let steps = solution.route(self.route).steps();
        let segment = &steps[self.start..self.start + self.len];

        if self.start + self.len <= self.to {
            let mut seq: SmallVec<[Step; 8]> = steps[self.start + self.len..self.to]
                .iter()
                .copied()
                .collect();
            seq.extend(segment.iter().copied());
            (seq, self.start, self.to)
        } else {
            let mut seq: SmallVec<[Step; 8]> = segment.iter().copied().collect();
            seq.extend(steps[self.to..self.start].iter().copied());
            (seq, self.to, self.start + self.len)
        }
    }
}

impl LocalSearchOperator for IntraOrOpt {
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

        for len in SEGMENT_LENGTHS {
            if route.len() < len + 1 {
                continue;
            }
            for start in 0..=route.len() - len {
                if !route.is_job_run(start, start + len) {
                    continue;
                }
                for to in 0..=route.len() {
                    // Positions inside or flush with the segment are no-ops.
                    if to >= start && to <= start + len {
                        continue;
                    }
                    consumer(IntraOrOpt {
                        route: r1,
                        start,
                        len,
                        to,
                    });
                }
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
    fn test_intra_or_opt_moves_pair() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 5,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[0, 1, 2, 3, 4])]);

        let op = IntraOrOpt {
            route: RouteIdx::new(0),
            start: 0,
            len: 2,
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
        assert_eq!(order, vec![2, 3, 0, 1, 4]);
    }
}
