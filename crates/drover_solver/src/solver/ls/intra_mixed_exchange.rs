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

/// Swaps a single step with a disjoint 2-step job segment of the same
/// route.
#[derive(Clone, Debug)]
pub struct IntraMixedExchange {
    pub route: RouteIdx,
    pub single_position: usize,
    pub segment_start: usize,
}

impl IntraMixedExchange {
    fn splice(&self, solution: &SolutionState) -> (SmallVec<[Step; 8]>, usize, usize) {
        let steps = solution.route(self.route).steps();
        let single = steps[self.single_position];
        let segment = &steps[self.segment_start..self.segment_start + SEGMENT_LEN];

        if self.single_position < self.segment_start {
            let mut seq: SmallVec<[Step; 8]> = segment.iter().copied().collect();
            seq.extend(
                steps[self.single_position + 1..self.segment_start]
                    .iter()
                    .copied(),
            );
            seq.push(single);
            (seq, self.single_position, self.segment_start + SEGMENT_LEN)
        } else {
            let mut seq = SmallVec::new();
            seq.push(single);
            seq.extend(
                steps[self.segment_start + SEGMENT_LEN..self.single_position]
                    .iter()
                    .copied(),
            );
            seq.extend(segment.iter().copied());
            (seq, self.segment_start, self.single_position + 1)
        }
    }
}

impl LocalSearchOperator for IntraMixedExchange {
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
        if route.is_frozen() || route.len() < SEGMENT_LEN + 1 {
            return;
        }

        for single_position in 0..route.len() {
            if route.step(single_position).is_break() {
                continue;
            }
            for segment_start in 0..=route.len() - SEGMENT_LEN {
                // The single step must sit strictly outside the segment.
                if single_position + 1 >= segment_start
                    && single_position <= segment_start + SEGMENT_LEN
                {
                    continue;
                }
                if !route.is_job_run(segment_start, segment_start + SEGMENT_LEN) {
                    continue;
                }
                consumer(IntraMixedExchange {
                    route: r1,
                    single_position,
                    segment_start,
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
