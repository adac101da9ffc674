use crate::{
    constants::{
        Cost, DURATION_FACTOR, Distance, Duration, INFINITE_COST, INFINITE_DISTANCE,
        INFINITE_DURATION, INFINITE_USER_COST, scale_cost, scale_distance,
    },
    problem::matrix::Matrix,
};

/// Travel evaluation for one pair of locations under one vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eval {
    pub cost: Cost,
    pub duration: Duration,
    pub distance: Distance,
}

impl Eval {
    pub const ZERO: Eval = Eval {
        cost: 0,
        duration: 0,
        distance: 0,
    };

    pub const INFINITE: Eval = Eval {
        cost: INFINITE_COST,
        duration: INFINITE_DURATION,
        distance: INFINITE_DISTANCE,
    };

    pub fn is_reachable(&self) -> bool {
        self.cost < INFINITE_COST
    }
}

/// Matrices backing one routing profile. Durations are required, distances
/// and explicit costs optional; an explicit costs matrix overrides the
/// per-hour/per-km derivation.
#[derive(Clone, Debug)]
pub struct ProfileMatrices {
    pub name: String,
    pub durations: Matrix,
    pub distances: Option<Matrix>,
    pub costs: Option<Matrix>,
}

/// Per-vehicle lookup parameters, precomputed at problem build time. The
/// speed factor folds into a single multiplier over raw matrix durations.
#[derive(Clone, Copy, Debug)]
pub struct VehicleEval {
    pub profile: usize,
    pub duration_factor: f64,
    pub per_hour: i64,
    pub per_km: i64,
}

impl VehicleEval {
    pub fn new(profile: usize, speed_factor: f64, per_hour: u32, per_km: u32) -> Self {
        VehicleEval {
            profile,
            duration_factor: DURATION_FACTOR as f64 / speed_factor,
            per_hour: per_hour as i64,
            per_km: per_km as i64,
        }
    }
}

/// Read-only travel oracle over per-profile matrices. Never errors:
/// unreachable pairs evaluate to [`Eval::INFINITE`] and callers treat
/// infinity as infeasible.
#[derive(Debug)]
pub struct CostOracle {
    profiles: Vec<ProfileMatrices>,
}

impl CostOracle {
    pub fn new(profiles: Vec<ProfileMatrices>) -> Self {
        CostOracle { profiles }
    }

    pub fn profiles(&self) -> &[ProfileMatrices] {
        &self.profiles
    }

    pub fn profile_index(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.name == name)
    }

    pub fn locations(&self) -> usize {
        self.profiles
            .first()
            .map(|p| p.durations.size())
            .unwrap_or(0)
    }

    pub fn has_distances(&self) -> bool {
        self.profiles.iter().any(|p| p.distances.is_some())
    }

    #[inline]
    pub fn eval(&self, params: &VehicleEval, from: usize, to: usize) -> Eval {
        if from == to {
            return Eval::ZERO;
        }

        let profile = &self.profiles[params.profile];
        let raw_duration = profile.durations.get(from, to);
        if raw_duration >= INFINITE_USER_COST {
            return Eval::INFINITE;
        }

        let duration = (params.duration_factor * raw_duration as f64).round() as Duration;

        let distance = match &profile.distances {
            Some(distances) => {
                let raw = distances.get(from, to);
                if raw >= INFINITE_USER_COST {
                    return Eval::INFINITE;
                }
                scale_distance(raw)
            }
            None => 0,
        };

        let cost = match &profile.costs {
            Some(costs) => {
                let raw = costs.get(from, to);
                if raw >= INFINITE_USER_COST {
                    return Eval::INFINITE;
                }
                scale_cost(raw)
            }
            None => params.per_hour * duration + params.per_km * distance,
        };

        Eval {
            cost,
            duration,
            distance,
        }
    }

    pub fn duration(&self, params: &VehicleEval, from: usize, to: usize) -> Duration {
        self.eval(params, from, to).duration
    }

    pub fn distance(&self, params: &VehicleEval, from: usize, to: usize) -> Distance {
        self.eval(params, from, to).distance
    }

    pub fn cost(&self, params: &VehicleEval, from: usize, to: usize) -> Cost {
        self.eval(params, from, to).cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{scale_duration, unscale_cost};

    fn oracle(durations: Vec<Vec<u32>>) -> CostOracle {
        CostOracle::new(vec![ProfileMatrices {
            name: "car".to_owned(),
            durations: Matrix::from_rows(durations).unwrap(),
            distances: None,
            costs: None,
        }])
    }

    #[test]
    fn test_default_cost_tracks_duration() {
        let oracle = oracle(vec![vec![0, 1800], vec![1800, 0]]);
        let params = VehicleEval::new(0, 1.0, 3600, 0);

        let eval = oracle.eval(&params, 0, 1);
        assert_eq!(eval.duration, scale_duration(1800));
        // One cost unit per second at the default per-hour rate.
        assert_eq!(unscale_cost(eval.cost), 1800);
    }

    #[test]
    fn test_speed_factor_shrinks_durations() {
        let oracle = oracle(vec![vec![0, 1000], vec![1000, 0]]);
        let params = VehicleEval::new(0, 2.0, 3600, 0);

        assert_eq!(oracle.duration(&params, 0, 1), scale_duration(500));
    }

    #[test]
    fn test_unreachable_pair_is_infinite() {
        let oracle = oracle(vec![vec![0, INFINITE_USER_COST], vec![10, 0]]);
        let params = VehicleEval::new(0, 1.0, 3600, 0);

        assert!(!oracle.eval(&params, 0, 1).is_reachable());
        assert!(oracle.eval(&params, 1, 0).is_reachable());
    }

    #[test]
    fn test_explicit_costs_matrix_wins() {
        let oracle = CostOracle::new(vec![ProfileMatrices {
            name: "car".to_owned(),
            durations: Matrix::from_rows(vec![vec![0, 100], vec![100, 0]]).unwrap(),
            distances: None,
            costs: Some(Matrix::from_rows(vec![vec![0, 7], vec![7, 0]]).unwrap()),
        }]);
        let params = VehicleEval::new(0, 1.0, 3600, 0);

        assert_eq!(unscale_cost(oracle.cost(&params, 0, 1)), 7);
    }

    #[test]
    fn test_same_location_is_free() {
        let oracle = oracle(vec![vec![0, 5], vec![5, 0]]);
        let params = VehicleEval::new(0, 1.0, 3600, 0);
        assert_eq!(oracle.eval(&params, 1, 1), Eval::ZERO);
    }
}
