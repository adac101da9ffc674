use smallvec::SmallVec;

use crate::{
    constants::Cost,
    problem::{Problem, job::JobKind},
    solver::{
        ls::operator::{LocalSearchOperator, pair_delta},
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// Moves a pickup-delivery pair to another route, keeping the pickup ahead
/// of the delivery.
#[derive(Clone, Debug)]
pub struct PdShift {
    pub from_route: RouteIdx,
    pub to_route: RouteIdx,
    /// Positions of the pair in the source route, `pickup < delivery`.
    pub pickup_position: usize,
    pub delivery_position: usize,
    /// Target positions before the insertion, `to_pickup <= to_delivery`.
    pub to_pickup: usize,
    pub to_delivery: usize,
}

impl PdShift {
    /// Insertion splice on the target route: pickup, kept steps, delivery.
    fn insertion_seq(&self, solution: &SolutionState) -> SmallVec<[Step; 8]> {
        let from = solution.route(self.from_route);
        let to = solution.route(self.to_route);

        let pickup = from.step(self.pickup_position);
        let delivery = from.step(self.delivery_position);

        let mut seq = SmallVec::new();
        seq.push(pickup);
        seq.extend(to.steps()[self.to_pickup..self.to_delivery].iter().copied());
        seq.push(delivery);
        seq
    }

    /// Removal splice on the source route: everything in between stays.
    fn removal_seq(&self, solution: &SolutionState) -> SmallVec<[Step; 8]> {
        solution.route(self.from_route).steps()
            [self.pickup_position + 1..self.delivery_position]
            .iter()
            .copied()
            .collect()
    }
}

impl LocalSearchOperator for PdShift {
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

        for pickup_position in 0..from_route.len() {
            let Some(pickup) = from_route.job_at(pickup_position) else {
                continue;
            };
            if problem.job(pickup).kind() != JobKind::Pickup {
                continue;
            }
            let delivery = problem
                .job(pickup)
                .partner()
                .expect("pickup must have a paired delivery");
            let Some(delivery_position) = from_route.position_of(delivery) else {
                continue;
            };
            if !problem.vehicle_ok_with_job(to_route.vehicle(), pickup) {
                continue;
            }

            for to_pickup in 0..=to_route.len() {
                for to_delivery in to_pickup..=to_route.len() {
                    if !to_route.is_job_run(to_pickup, to_delivery) {
                        continue;
                    }
                    consumer(PdShift {
                        from_route: r1,
                        to_route: r2,
                        pickup_position,
                        delivery_position,
                        to_pickup,
                        to_delivery,
                    });
                }
            }
        }
    }

    fn evaluate(&self, problem: &Problem, solution: &SolutionState) -> Option<Cost> {
        let insertion = self.insertion_seq(solution);
        let removal = self.removal_seq(solution);

        pair_delta(
            problem,
            solution,
            self.from_route,
            removal.iter().copied(),
            (self.pickup_position, self.delivery_position + 1),
            self.to_route,
            insertion.iter().copied(),
            (self.to_pickup, self.to_delivery),
        )
    }

    fn apply(&self, problem: &Problem, solution: &mut SolutionState) {
        let insertion = self.insertion_seq(solution);
        let removal = self.removal_seq(solution);

        solution.route_mut(self.to_route).replace(
            problem,
            insertion.into_iter(),
            self.to_pickup,
            self.to_delivery,
        );
        solution.route_mut(self.from_route).replace(
            problem,
            removal.into_iter(),
            self.pickup_position,
            self.delivery_position + 1,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.from_route, self.to_route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_pd_shift_moves_pair() {
        let problem = test_utils::shipment_problem();
        // Pickup is job 0, delivery job 1, both on vehicle 0.
        let mut solution = test_utils::solution_with_routes(&problem, &[(0, &[0, 1])]);

        let op = PdShift {
            from_route: RouteIdx::new(0),
            to_route: RouteIdx::new(1),
            pickup_position: 0,
            delivery_position: 1,
            to_pickup: 0,
            to_delivery: 0,
        };

        let before = solution.total_cost(&problem);
        let delta = op.evaluate(&problem, &solution).unwrap();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(&problem), before + delta);
        assert_eq!(solution.route(RouteIdx::new(0)).job_count(), 0);

        let order: Vec<usize> = solution
            .route(RouteIdx::new(1))
            .steps()
            .iter()
            .map(|s| s.job().unwrap().get())
            .collect();
        assert_eq!(order, vec![0, 1]);
    }
}
