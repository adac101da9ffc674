use fxhash::{FxHashMap, FxHashSet};

use crate::{
    constants::{Duration, Priority, Skill, UserId},
    define_index_newtype,
    problem::{amount::Amount, time_window::TimeWindows},
};

define_index_newtype!(JobIdx, Job);

/// Single jobs are regular one-stop tasks without precedence constraints;
/// pickups and deliveries come paired by a parent shipment and must be served
/// in order by the same vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    Single,
    Pickup,
    Delivery,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Single => "job",
            JobKind::Pickup => "pickup",
            JobKind::Delivery => "delivery",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Job {
    id: UserId,
    kind: JobKind,
    location: usize,
    coordinates: Option<[f64; 2]>,
    setup: Duration,
    service: Duration,
    service_per_type: FxHashMap<String, Duration>,
    delivery: Amount,
    pickup: Amount,
    skills: FxHashSet<Skill>,
    priority: Priority,
    time_windows: TimeWindows,
    description: String,
    /// The other half of the shipment, for pickups and deliveries.
    partner: Option<JobIdx>,
}

pub struct JobData {
    pub id: UserId,
    pub kind: JobKind,
    pub location: usize,
    pub coordinates: Option<[f64; 2]>,
    pub setup: Duration,
    pub service: Duration,
    pub service_per_type: FxHashMap<String, Duration>,
    pub delivery: Amount,
    pub pickup: Amount,
    pub skills: FxHashSet<Skill>,
    pub priority: Priority,
    pub time_windows: TimeWindows,
    pub description: String,
}

impl Job {
    pub fn new(data: JobData) -> Self {
        Job {
            id: data.id,
            kind: data.kind,
            location: data.location,
            coordinates: data.coordinates,
            setup: data.setup,
            service: data.service,
            service_per_type: data.service_per_type,
            delivery: data.delivery,
            pickup: data.pickup,
            skills: data.skills,
            priority: data.priority,
            time_windows: data.time_windows,
            description: data.description,
            partner: None,
        }
    }

    pub(crate) fn set_partner(&mut self, partner: JobIdx) {
        self.partner = Some(partner);
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn is_shipment_half(&self) -> bool {
        !matches!(self.kind, JobKind::Single)
    }

    pub fn partner(&self) -> Option<JobIdx> {
        self.partner
    }

    pub fn location(&self) -> usize {
        self.location
    }

    pub fn coordinates(&self) -> Option<[f64; 2]> {
        self.coordinates
    }

    pub fn setup(&self) -> Duration {
        self.setup
    }

    /// Service duration, honoring a per-vehicle-type override when the
    /// serving vehicle declares a matching type. A vehicle without a type
    /// falls back to the default duration.
    pub fn service_for(&self, vehicle_type: Option<&str>) -> Duration {
        vehicle_type
            .and_then(|t| self.service_per_type.get(t).copied())
            .unwrap_or(self.service)
    }

    pub fn default_service(&self) -> Duration {
        self.service
    }

    pub fn delivery(&self) -> &Amount {
        &self.delivery
    }

    pub fn pickup(&self) -> &Amount {
        &self.pickup
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn time_windows(&self) -> &TimeWindows {
        &self.time_windows
    }

    pub(crate) fn time_windows_mut(&mut self) -> &mut TimeWindows {
        &mut self.time_windows
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Total moved amount, used for amount-based tie breaking and the
    /// HigherAmount init rule.
    pub fn amount_total(&self) -> i64 {
        self.pickup.total() + self.delivery.total()
    }

    pub fn deadline(&self) -> Duration {
        self.time_windows.deadline()
    }
}
