//! Scaling conventions and solver-wide defaults.
//!
//! Durations are stored as hundredths of a second, distances scaled by 360
//! and costs by `DURATION_FACTOR * COST_FACTOR`, so that one cost-per-second
//! equals one cost-per-hour without any floating point in the hot path.

/// External identifier as it appears in the input.
pub type UserId = u64;
/// Duration in seconds, as it appears in the input.
pub type UserDuration = u32;
/// Cost in user units, as it appears in the input.
pub type UserCost = u32;
/// Distance in meters, as it appears in the input.
pub type UserDistance = u32;

/// Internal duration, hundredths of a second.
pub type Duration = i64;
/// Internal cost, scaled by `DURATION_FACTOR * COST_FACTOR`.
pub type Cost = i64;
/// Internal distance, scaled by `DISTANCE_FACTOR`.
pub type Distance = i64;

pub type Skill = u32;
pub type Priority = u32;

pub const DURATION_FACTOR: Duration = 100;
pub const DISTANCE_FACTOR: Distance = 360;
pub const COST_FACTOR: Cost = 3600;

pub const DEFAULT_COST_PER_HOUR: UserCost = 3600;
pub const DEFAULT_COST_PER_KM: UserCost = 0;

/// Setting the max value would cause trouble with further additions, so
/// unreachable pairs sit at three quarters of the range.
pub const INFINITE_USER_COST: UserCost = 3 * (u32::MAX / 4);

/// Scaled counterpart of [`INFINITE_USER_COST`]. Several thousands of these
/// still sum below `i64::MAX`.
pub const INFINITE_COST: Cost =
    DURATION_FACTOR * COST_FACTOR * INFINITE_USER_COST as Cost;

/// Durations beyond this value mean the pair is unreachable. Time
/// propagation uses saturating arithmetic so these never wrap.
pub const INFINITE_DURATION: Duration = 3 * (i64::MAX / 4);
pub const INFINITE_DISTANCE: Distance = 3 * (i64::MAX / 4);

pub const MAX_PRIORITY: Priority = 100;
pub const MAX_SPEED_FACTOR: f64 = 5.0;

pub const MAX_EXPLORATION_LEVEL: u32 = 5;
pub const DEFAULT_EXPLORATION_LEVEL: u32 = 5;
pub const DEFAULT_THREADS: usize = 4;

pub const DEFAULT_PROFILE: &str = "car";

pub const fn scale_duration(d: UserDuration) -> Duration {
    DURATION_FACTOR * d as Duration
}

pub const fn unscale_duration(d: Duration) -> UserDuration {
    (d / DURATION_FACTOR) as UserDuration
}

pub const fn scale_cost(c: UserCost) -> Cost {
    DURATION_FACTOR * COST_FACTOR * c as Cost
}

pub const fn unscale_cost(c: Cost) -> UserCost {
    (c / (DURATION_FACTOR * COST_FACTOR)) as UserCost
}

pub const fn scale_distance(d: UserDistance) -> Distance {
    DISTANCE_FACTOR * d as Distance
}

pub const fn unscale_distance(d: Distance) -> UserDistance {
    (d / DISTANCE_FACTOR) as UserDistance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_round_trip() {
        assert_eq!(unscale_duration(scale_duration(0)), 0);
        assert_eq!(unscale_duration(scale_duration(3600)), 3600);
        assert_eq!(unscale_duration(scale_duration(u32::MAX)), u32::MAX);
    }

    #[test]
    fn test_cost_scaling_matches_duration_for_default_per_hour() {
        // With the default cost of 3600 per hour, one second of travel costs
        // exactly one user cost unit.
        let one_second = scale_duration(1);
        let cost = DEFAULT_COST_PER_HOUR as Cost * one_second;
        assert_eq!(unscale_cost(cost), 1);
    }

    #[test]
    fn test_infinite_cost_headroom() {
        // A handful of infinities must sum without overflowing.
        let mut total: Cost = 0;
        for _ in 0..1000 {
            total = total.checked_add(INFINITE_COST).unwrap();
        }
        assert!(total > INFINITE_COST);
    }
}
