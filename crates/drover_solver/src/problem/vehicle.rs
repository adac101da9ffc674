use fxhash::FxHashSet;

use crate::{
    constants::{
        Cost, Distance, Duration, Skill, UserCost, UserId, scale_cost,
    },
    define_index_newtype,
    problem::{amount::Amount, job::JobKind, time_window::{TimeWindow, TimeWindows}},
};

define_index_newtype!(VehicleIdx, Vehicle);

/// Scheduled non-service pause carried by a vehicle. Served at the preceding
/// step's location; the carried load must satisfy `max_load` when set.
#[derive(Clone, Debug)]
pub struct Break {
    pub id: UserId,
    pub time_windows: TimeWindows,
    pub service: Duration,
    pub max_load: Option<Amount>,
    pub description: String,
}

/// Fixed cost counts once per nonempty route; per-hour and per-km apply to
/// travel. User values are kept for reporting, the fixed part pre-scaled.
#[derive(Clone, Copy, Debug)]
pub struct VehicleCosts {
    pub fixed: UserCost,
    pub per_hour: UserCost,
    pub per_km: UserCost,
}

impl VehicleCosts {
    pub fn scaled_fixed(&self) -> Cost {
        scale_cost(self.fixed)
    }
}

/// Forced service bounds attached to a user-pinned step. They narrow the
/// step's allowed interval before the usual time-window intersection.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForcedService {
    pub at: Option<Duration>,
    pub after: Option<Duration>,
    pub before: Option<Duration>,
}

impl ForcedService {
    /// Lower and upper service-start bounds implied by the forced values.
    pub fn bounds(&self) -> (Duration, Duration) {
        match self.at {
            Some(at) => (at, at),
            None => (
                self.after.unwrap_or(0),
                self.before.unwrap_or(Duration::MAX),
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ForcedStepKind {
    Start,
    End,
    Task { id: UserId, kind: JobKind },
    Pause { id: UserId },
}

/// One entry of a user-supplied route skeleton.
#[derive(Clone, Debug)]
pub struct ForcedStep {
    pub kind: ForcedStepKind,
    pub service: ForcedService,
}

#[derive(Clone, Debug)]
pub struct Vehicle {
    id: UserId,
    start: Option<usize>,
    start_coordinates: Option<[f64; 2]>,
    end: Option<usize>,
    end_coordinates: Option<[f64; 2]>,
    profile: usize,
    capacity: Amount,
    skills: FxHashSet<Skill>,
    time_window: TimeWindow,
    breaks: Vec<Break>,
    costs: VehicleCosts,
    speed_factor: f64,
    service_type: Option<String>,
    max_tasks: usize,
    max_travel_time: Duration,
    max_distance: Distance,
    steps: Vec<ForcedStep>,
    description: String,
}

pub struct VehicleData {
    pub id: UserId,
    pub start: Option<usize>,
    pub start_coordinates: Option<[f64; 2]>,
    pub end: Option<usize>,
    pub end_coordinates: Option<[f64; 2]>,
    pub profile: usize,
    pub capacity: Amount,
    pub skills: FxHashSet<Skill>,
    pub time_window: TimeWindow,
    pub breaks: Vec<Break>,
    pub costs: VehicleCosts,
    pub speed_factor: f64,
    pub service_type: Option<String>,
    pub max_tasks: Option<usize>,
    pub max_travel_time: Option<Duration>,
    pub max_distance: Option<Distance>,
    pub steps: Vec<ForcedStep>,
    pub description: String,
}

impl Vehicle {
    pub fn new(data: VehicleData) -> Self {
        let mut breaks = data.breaks;
        breaks.sort_by_key(|b| {
            let first = b.time_windows.windows()[0];
            (first.start, first.end)
        });

        Vehicle {
            id: data.id,
            start: data.start,
            start_coordinates: data.start_coordinates,
            end: data.end,
            end_coordinates: data.end_coordinates,
            profile: data.profile,
            capacity: data.capacity,
            skills: data.skills,
            time_window: data.time_window,
            breaks,
            costs: data.costs,
            speed_factor: data.speed_factor,
            service_type: data.service_type,
            max_tasks: data.max_tasks.unwrap_or(usize::MAX),
            max_travel_time: data.max_travel_time.unwrap_or(Duration::MAX),
            max_distance: data.max_distance.unwrap_or(Distance::MAX),
            steps: data.steps,
            description: data.description,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn start_coordinates(&self) -> Option<[f64; 2]> {
        self.start_coordinates
    }

    pub fn end(&self) -> Option<usize> {
        self.end
    }

    pub fn end_coordinates(&self) -> Option<[f64; 2]> {
        self.end_coordinates
    }

    pub fn profile(&self) -> usize {
        self.profile
    }

    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn can_serve(&self, required: &FxHashSet<Skill>) -> bool {
        required.is_subset(&self.skills)
    }

    pub fn time_window(&self) -> TimeWindow {
        self.time_window
    }

    pub fn breaks(&self) -> &[Break] {
        &self.breaks
    }

    pub fn costs(&self) -> &VehicleCosts {
        &self.costs
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn service_type(&self) -> Option<&str> {
        self.service_type.as_deref()
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn max_travel_time(&self) -> Duration {
        self.max_travel_time
    }

    pub fn max_distance(&self) -> Distance {
        self.max_distance
    }

    pub fn forced_steps(&self) -> &[ForcedStep] {
        &self.steps
    }

    pub fn has_forced_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
