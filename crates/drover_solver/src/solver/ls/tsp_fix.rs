use crate::{
    constants::Cost,
    problem::Problem,
    solver::{
        ls::operator::LocalSearchOperator,
        route::{Route, Step},
        solution::{RouteIdx, SolutionState},
    },
};

/// Re-sequences a whole route over its fixed job membership: greedy
/// nearest-neighbor order refined by pure-cost 2-opt, then validated
/// against the full constraint set. Skipped for routes carrying breaks,
/// whose positions are bound to the original sequence.
#[derive(Clone, Debug)]
pub struct TspFix {
    pub route: RouteIdx,
    pub order: Vec<Step>,
}

fn edge_cost(problem: &Problem, route: &Route, from: Option<usize>, to: Option<usize>) -> Cost {
    problem.eval(route.vehicle(), from, to).cost
}

fn step_location(problem: &Problem, step: Step) -> Option<usize> {
    step.job().map(|j| problem.job(j).location())
}

/// Nearest-neighbor order over the route's jobs, from the vehicle start.
fn nearest_neighbor_order(problem: &Problem, route: &Route) -> Vec<Step> {
    let vehicle = problem.vehicle(route.vehicle());
    let mut remaining: Vec<Step> = route.steps().to_vec();
    let mut order = Vec::with_capacity(remaining.len());
    let mut location = vehicle.start();

    while !remaining.is_empty() {
        let (pick, _) = remaining
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let job_location = step.job().map(|j| problem.job(j).location());
                (i, edge_cost(problem, route, location, job_location))
            })
            .min_by_key(|&(i, cost)| (cost, i))
            .expect("remaining is nonempty");

        let step = remaining.remove(pick);
        location = step.job().map(|j| problem.job(j).location());
        order.push(step);
    }

    order
}

/// Pure-cost 2-opt over the candidate order, ignoring every constraint but
/// the travel objective. The result is validated afterwards. Each reversal
/// is judged by its four boundary edges only.
fn two_opt_refine(problem: &Problem, route: &Route, order: &mut [Step]) {
    let vehicle = problem.vehicle(route.vehicle());
    let n = order.len();

    loop {
        let mut improved = false;

        for i in 0..n.saturating_sub(1) {
            for j in i + 1..n {
                let before = if i == 0 {
                    vehicle.start()
                } else {
                    step_location(problem, order[i - 1])
                };
                let after = if j == n - 1 {
                    vehicle.end()
                } else {
                    step_location(problem, order[j + 1])
                };
                let first = step_location(problem, order[i]);
                let last = step_location(problem, order[j]);

                let current = edge_cost(problem, route, before, first)
                    + edge_cost(problem, route, last, after);
                let reversed = edge_cost(problem, route, before, last)
                    + edge_cost(problem, route, first, after);

                if reversed < current {
                    order[i..=j].reverse();
                    improved = true;
                }
            }
        }

        if !improved {
            break;
        }
    }
}

impl LocalSearchOperator for TspFix {
    fn generate_moves<C>(
        problem: &Problem,
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
        if route.is_frozen() || route.job_count() < 3 {
            return;
        }
        if !route.is_job_run(0, route.len()) {
            return;
        }

        let mut order = nearest_neighbor_order(problem, route);
        two_opt_refine(problem, route, &mut order);

        if order != route.steps() {
            consumer(TspFix { route: r1, order });
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let route = solution.route(self.route);
        route
            .evaluate_splice(problem, self.order.iter().copied(), 0, route.len())
            .map(|delta| delta.cost)
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let len = solution.route(self.route).len();
        solution
            .route_mut(self.route)
            .replace(problem, self.order.iter().copied(), 0, len);
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
    fn test_tsp_fix_restores_line_order() {
        let problem = test_utils::line_problem(ProblemConfig {
            jobs: 5,
            ..ProblemConfig::default()
        });
        let mut solution =
            test_utils::solution_with_routes(&problem, &[(0, &[3, 0, 4, 1, 2])]);

        let mut fix = None;
        TspFix::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |op| fix = Some(op),
        );

        let op = fix.expect("scrambled route must yield a fix");
        let delta = op.evaluate(&problem, &solution).unwrap();
        assert!(delta < 0);

        let before = solution.total_cost(&problem);
        op.apply(&problem, &mut solution);
        assert_eq!(solution.total_cost(&problem), before + delta);

        let order: Vec<usize> = solution
            .route(RouteIdx::new(0))
            .steps()
            .iter()
            .map(|s| s.job().unwrap().get())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
