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

const SEGMENT_LEN: usize = 2;

/// Swaps two disjoint 2-step job segments within one route.
#[derive(Clone, Debug)]
pub struct IntraCrossExchange {
    pub route: RouteIdx,
    /// Start of the earlier segment.
    pub first_start: usize,
    /// Start of the later segment; at least `first_start + 2`.
    pub second_start: usize,
}

impl IntraCrossExchange {
    fn splice(&self, solution: &SolutionState) -> (SmallVec<[Step; 8]>, usize, usize) {
        let steps = solution.route(self.route).steps();
        let first = &steps[self.first_start..self.first_start + SEGMENT_LEN];
        let second = &steps[self.second_start..self.second_start + SEGMENT_LEN];

        let mut seq: SmallVec<[Step; 8]> = second.iter().copied().collect();
        seq.extend(
            steps[self.first_start + SEGMENT_LEN..self.second_start]
                .iter()
                .copied(),
        );
        seq.extend(first.iter().copied());

        (seq, self.first_start, self.second_start + SEGMENT_LEN)
    }
}

impl LocalSearchOperator for IntraCrossExchange {
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
        if route.is_frozen() || route.len() < 2 * SEGMENT_LEN {
            return;
        }

        for first_start in 0..=route.len() - 2 * SEGMENT_LEN {
            if !route.is_job_run(first_start, first_start + SEGMENT_LEN) {
                continue;
            }
            for second_start in first_start + SEGMENT_LEN..=route.len() - SEGMENT_LEN {
                if !route.is_job_run(second_start, second_start + SEGMENT_LEN) {
                    continue;
                }
                consumer(IntraCrossExchange {
                    route: r1,
                    first_start,
                    second_start,
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
