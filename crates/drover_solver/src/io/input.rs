use std::collections::BTreeMap;

use fxhash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use crate::{
    constants::{
        DEFAULT_COST_PER_HOUR, DEFAULT_COST_PER_KM, DEFAULT_PROFILE, Duration, MAX_PRIORITY,
        MAX_SPEED_FACTOR, UserId, scale_distance, scale_duration,
    },
    error::InputError,
    problem::{
        Problem,
        amount::Amount,
        cost_oracle::{CostOracle, ProfileMatrices},
        job::{Job, JobData, JobIdx, JobKind},
        matrix::Matrix,
        time_window::{TimeWindow, TimeWindows},
        vehicle::{
            Break, ForcedService, ForcedStep, ForcedStepKind, Vehicle, VehicleCosts, VehicleData,
        },
    },
};

/// Top-level input document. Unknown fields are ignored, matching the
/// tolerant reader this format grew up with.
#[derive(Deserialize)]
pub struct ProblemInput {
    #[serde(default)]
    pub jobs: Vec<JobInput>,
    #[serde(default)]
    pub shipments: Vec<ShipmentInput>,
    #[serde(default)]
    pub vehicles: Vec<VehicleInput>,
    /// Per-profile matrices. A `BTreeMap` keeps profile indices stable
    /// across runs.
    #[serde(default)]
    pub matrices: BTreeMap<String, MatrixInput>,
    /// Deprecated: equivalent to `matrices.car.durations`.
    #[serde(default)]
    pub matrix: Option<Vec<Vec<u32>>>,
}

#[derive(Deserialize)]
pub struct JobInput {
    pub id: UserId,
    pub location: Option<[f64; 2]>,
    pub location_index: Option<usize>,
    #[serde(default)]
    pub setup: u32,
    #[serde(default)]
    pub service: u32,
    #[serde(default)]
    pub service_per_vehicle_type: BTreeMap<String, u32>,
    pub delivery: Option<Vec<u32>>,
    pub pickup: Option<Vec<u32>>,
    /// Deprecated alias for `delivery`, honored only when neither `pickup`
    /// nor `delivery` is present.
    pub amount: Option<Vec<u32>>,
    #[serde(default)]
    pub skills: Vec<u32>,
    #[serde(default)]
    pub priority: u32,
    pub time_windows: Option<Vec<[u32; 2]>>,
    #[serde(default)]
    pub description: String,
}

/// One half of a shipment. Amount, skills and priority live at the
/// shipment level.
#[derive(Deserialize)]
pub struct ShipmentTaskInput {
    pub id: UserId,
    pub location: Option<[f64; 2]>,
    pub location_index: Option<usize>,
    #[serde(default)]
    pub setup: u32,
    #[serde(default)]
    pub service: u32,
    #[serde(default)]
    pub service_per_vehicle_type: BTreeMap<String, u32>,
    pub time_windows: Option<Vec<[u32; 2]>>,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct ShipmentInput {
    pub pickup: ShipmentTaskInput,
    pub delivery: ShipmentTaskInput,
    pub amount: Option<Vec<u32>>,
    #[serde(default)]
    pub skills: Vec<u32>,
    #[serde(default)]
    pub priority: u32,
}

#[derive(Deserialize)]
pub struct BreakInput {
    pub id: UserId,
    pub time_windows: Option<Vec<[u32; 2]>>,
    #[serde(default)]
    pub service: u32,
    pub max_load: Option<Vec<u32>>,
    #[serde(default)]
    pub description: String,
}

fn default_per_hour() -> u32 {
    DEFAULT_COST_PER_HOUR
}

fn default_per_km() -> u32 {
    DEFAULT_COST_PER_KM
}

#[derive(Deserialize)]
pub struct CostsInput {
    #[serde(default)]
    pub fixed: u32,
    #[serde(default = "default_per_hour")]
    pub per_hour: u32,
    #[serde(default = "default_per_km")]
    pub per_km: u32,
}

impl Default for CostsInput {
    fn default() -> Self {
        CostsInput {
            fixed: 0,
            per_hour: DEFAULT_COST_PER_HOUR,
            per_km: DEFAULT_COST_PER_KM,
        }
    }
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum StepTypeInput {
    Start,
    End,
    Job,
    Pickup,
    Delivery,
    Break,
}

#[derive(Deserialize)]
pub struct StepInput {
    #[serde(rename = "type")]
    pub step_type: StepTypeInput,
    pub id: Option<UserId>,
    pub service_at: Option<u32>,
    pub service_after: Option<u32>,
    pub service_before: Option<u32>,
}

fn default_speed_factor() -> f64 {
    1.0
}

#[derive(Deserialize)]
pub struct VehicleInput {
    pub id: UserId,
    pub start: Option<[f64; 2]>,
    pub start_index: Option<usize>,
    pub end: Option<[f64; 2]>,
    pub end_index: Option<usize>,
    pub profile: Option<String>,
    pub capacity: Option<Vec<u32>>,
    #[serde(default)]
    pub skills: Vec<u32>,
    pub time_window: Option<[u32; 2]>,
    pub time_windows: Option<Vec<[u32; 2]>>,
    #[serde(default)]
    pub breaks: Vec<BreakInput>,
    #[serde(default)]
    pub costs: CostsInput,
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,
    pub service_type: Option<String>,
    pub max_tasks: Option<usize>,
    pub max_travel_time: Option<u32>,
    pub max_distance: Option<u32>,
    #[serde(default)]
    pub steps: Vec<StepInput>,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct MatrixInput {
    pub durations: Option<Vec<Vec<u32>>>,
    pub distances: Option<Vec<Vec<u32>>>,
    pub costs: Option<Vec<Vec<u32>>>,
}

/// Parses and validates an input document into an immutable [`Problem`].
pub fn parse_problem(input: &str) -> Result<Problem, InputError> {
    let document: ProblemInput =
        serde_json::from_str(input).map_err(|e| InputError::Json(e.to_string()))?;
    document.into_problem()
}

fn scaled_amount(
    values: Option<&[u32]>,
    field: &str,
    expected: usize,
) -> Result<Amount, InputError> {
    match values {
        None => Ok(Amount::zero(expected)),
        Some(values) => {
            if values.len() != expected {
                return Err(InputError::InconsistentAmount {
                    field: field.to_owned(),
                    actual: values.len(),
                    expected,
                });
            }
            Ok(Amount::from_user(values))
        }
    }
}

fn task_time_windows(
    windows: Option<&Vec<[u32; 2]>>,
    object: &str,
    id: UserId,
) -> Result<TimeWindows, InputError> {
    match windows {
        None => Ok(TimeWindows::full()),
        Some(windows) => {
            if windows.is_empty() {
                return Err(InputError::InvalidFieldFor {
                    field: "time_windows".to_owned(),
                    object: object.to_owned(),
                    id,
                });
            }
            let mut parsed = Vec::with_capacity(windows.len());
            for &[start, end] in windows {
                if start > end {
                    return Err(InputError::InvalidTimeWindow {
                        object: object.to_owned(),
                        id,
                        start,
                        end,
                    });
                }
                parsed.push(TimeWindow::from_user(start, end));
            }
            Ok(TimeWindows::new(parsed))
        }
    }
}

fn task_location(
    index: Option<usize>,
    _coordinates: Option<[f64; 2]>,
    locations: usize,
    object: &str,
    id: UserId,
) -> Result<usize, InputError> {
    let Some(index) = index else {
        // With matrix-backed costs every task needs an index; coordinates
        // alone belong to the routing-engine path.
        return Err(InputError::MissingLocationIndex {
            object: object.to_owned(),
            id,
        });
    };
    if index >= locations {
        return Err(InputError::LocationOutOfBounds {
            object: object.to_owned(),
            id,
            index,
        });
    }
    Ok(index)
}

fn check_priority(priority: u32, object: &str, id: UserId) -> Result<(), InputError> {
    if priority > MAX_PRIORITY {
        return Err(InputError::InvalidFieldFor {
            field: "priority".to_owned(),
            object: object.to_owned(),
            id,
        });
    }
    Ok(())
}

struct ScaledDurations {
    setup: Duration,
    service: Duration,
    per_type: FxHashMap<String, Duration>,
}

fn scaled_durations(
    setup: u32,
    service: u32,
    per_type: &BTreeMap<String, u32>,
) -> ScaledDurations {
    ScaledDurations {
        setup: scale_duration(setup),
        service: scale_duration(service),
        per_type: per_type
            .iter()
            .map(|(k, v)| (k.clone(), scale_duration(*v)))
            .collect(),
    }
}

impl ProblemInput {
    pub fn into_problem(self) -> Result<Problem, InputError> {
        if self.jobs.is_empty() && self.shipments.is_empty() {
            return Err(InputError::NoTasks);
        }
        if self.vehicles.is_empty() {
            return Err(InputError::NoVehicles);
        }

        let amount_size = self
            .vehicles
            .first()
            .and_then(|v| v.capacity.as_ref())
            .map(|c| c.len())
            .unwrap_or(0);

        let oracle = build_oracle(self.matrices, self.matrix)?;
        let locations = oracle.locations();

        let mut jobs = Vec::new();
        let mut seen_ids: FxHashSet<(JobKind, UserId)> = FxHashSet::default();

        for job in &self.jobs {
            check_priority(job.priority, "job", job.id)?;
            if !seen_ids.insert((JobKind::Single, job.id)) {
                return Err(InputError::DuplicateId {
                    object: "job".to_owned(),
                    id: job.id,
                });
            }

            // Deprecated `amount` acts as `delivery` only when neither
            // explicit key is present.
            let delivery = match (&job.delivery, &job.pickup, &job.amount) {
                (None, None, Some(amount)) => {
                    scaled_amount(Some(amount.as_slice()), "amount", amount_size)?
                }
                (delivery, _, _) => {
                    scaled_amount(delivery.as_deref(), "delivery", amount_size)?
                }
            };
            let pickup = scaled_amount(job.pickup.as_deref(), "pickup", amount_size)?;

            let durations =
                scaled_durations(job.setup, job.service, &job.service_per_vehicle_type);

            jobs.push(Job::new(JobData {
                id: job.id,
                kind: JobKind::Single,
                location: task_location(
                    job.location_index,
                    job.location,
                    locations,
                    "job",
                    job.id,
                )?,
                coordinates: job.location,
                setup: durations.setup,
                service: durations.service,
                service_per_type: durations.per_type,
                delivery,
                pickup,
                skills: job.skills.iter().copied().collect(),
                priority: job.priority,
                time_windows: task_time_windows(job.time_windows.as_ref(), "job", job.id)?,
                description: job.description.clone(),
            }));
        }

        for shipment in &self.shipments {
            let amount = scaled_amount(shipment.amount.as_deref(), "amount", amount_size)?;
            let skills: FxHashSet<u32> = shipment.skills.iter().copied().collect();
            check_priority(shipment.priority, "pickup", shipment.pickup.id)?;

            let pickup_index = JobIdx::new(jobs.len());
            let delivery_index = JobIdx::new(jobs.len() + 1);

            for (task, kind, partner) in [
                (&shipment.pickup, JobKind::Pickup, delivery_index),
                (&shipment.delivery, JobKind::Delivery, pickup_index),
            ] {
                let object = kind.as_str();
                if !seen_ids.insert((kind, task.id)) {
                    return Err(InputError::DuplicateId {
                        object: object.to_owned(),
                        id: task.id,
                    });
                }

                let durations =
                    scaled_durations(task.setup, task.service, &task.service_per_vehicle_type);
                let (pickup_amount, delivery_amount) = match kind {
                    JobKind::Pickup => (amount.clone(), Amount::zero(amount_size)),
                    _ => (Amount::zero(amount_size), amount.clone()),
                };

                let mut job = Job::new(JobData {
                    id: task.id,
                    kind,
                    location: task_location(
                        task.location_index,
                        task.location,
                        locations,
                        object,
                        task.id,
                    )?,
                    coordinates: task.location,
                    setup: durations.setup,
                    service: durations.service,
                    service_per_type: durations.per_type,
                    delivery: delivery_amount,
                    pickup: pickup_amount,
                    skills: skills.clone(),
                    priority: shipment.priority,
                    time_windows: task_time_windows(
                        task.time_windows.as_ref(),
                        object,
                        task.id,
                    )?,
                    description: task.description.clone(),
                });
                job.set_partner(partner);
                jobs.push(job);
            }
        }

        let mut vehicles = Vec::new();
        for vehicle in &self.vehicles {
            // Multi-window vehicles expand into one clone per window.
            let windows: Vec<TimeWindow> = match (&vehicle.time_windows, &vehicle.time_window) {
                (Some(windows), _) => {
                    task_time_windows(Some(windows), "vehicle", vehicle.id)?
                        .windows()
                        .to_vec()
                }
                (None, Some([start, end])) => {
                    let (start, end) = (*start, *end);
                    if start > end {
                        return Err(InputError::InvalidTimeWindow {
                            object: "vehicle".to_owned(),
                            id: vehicle.id,
                            start,
                            end,
                        });
                    }
                    vec![TimeWindow::from_user(start, end)]
                }
                (None, None) => vec![TimeWindow::full()],
            };

            for window in windows {
                vehicles.push(build_vehicle(
                    vehicle,
                    window,
                    amount_size,
                    locations,
                    &oracle,
                )?);
            }
        }

        // Forced steps narrow the pinned tasks' windows before anything
        // else sees them.
        apply_forced_service_bounds(&mut jobs, &vehicles)?;

        Ok(Problem::new(jobs, vehicles, oracle, amount_size))
    }
}

fn build_oracle(
    matrices: BTreeMap<String, MatrixInput>,
    legacy: Option<Vec<Vec<u32>>>,
) -> Result<CostOracle, InputError> {
    let mut profiles = Vec::new();

    if matrices.is_empty() {
        let Some(legacy) = legacy else {
            return Err(InputError::MissingDurationsMatrix {
                profile: DEFAULT_PROFILE.to_owned(),
            });
        };
        let durations =
            Matrix::from_rows(legacy).ok_or_else(|| InputError::NonSquareMatrix {
                profile: DEFAULT_PROFILE.to_owned(),
            })?;
        profiles.push(ProfileMatrices {
            name: DEFAULT_PROFILE.to_owned(),
            durations,
            distances: None,
            costs: None,
        });
        return Ok(CostOracle::new(profiles));
    }

    let mut size = None;
    for (name, input) in matrices {
        let parse = |rows: Option<Vec<Vec<u32>>>| -> Result<Option<Matrix>, InputError> {
            rows.map(|rows| {
                Matrix::from_rows(rows).ok_or_else(|| InputError::NonSquareMatrix {
                    profile: name.clone(),
                })
            })
            .transpose()
        };

        let durations = parse(input.durations)?.ok_or_else(|| {
            InputError::MissingDurationsMatrix {
                profile: name.clone(),
            }
        })?;
        let distances = parse(input.distances)?;
        let costs = parse(input.costs)?;

        for matrix in [Some(&durations), distances.as_ref(), costs.as_ref()]
            .into_iter()
            .flatten()
        {
            match size {
                None => size = Some(matrix.size()),
                Some(size) if size == matrix.size() => {}
                Some(_) => {
                    return Err(InputError::NonSquareMatrix {
                        profile: name.clone(),
                    });
                }
            }
        }

        profiles.push(ProfileMatrices {
            name,
            durations,
            distances,
            costs,
        });
    }

    Ok(CostOracle::new(profiles))
}

fn build_vehicle(
    input: &VehicleInput,
    window: TimeWindow,
    amount_size: usize,
    locations: usize,
    oracle: &CostOracle,
) -> Result<Vehicle, InputError> {
    let id = input.id;

    if input.speed_factor <= 0.0 || input.speed_factor > MAX_SPEED_FACTOR {
        return Err(InputError::InvalidFieldFor {
            field: "speed_factor".to_owned(),
            object: "vehicle".to_owned(),
            id,
        });
    }

    let profile_name = input.profile.as_deref().unwrap_or(DEFAULT_PROFILE);
    let profile = oracle.profile_index(profile_name).ok_or_else(|| {
        InputError::MissingDurationsMatrix {
            profile: profile_name.to_owned(),
        }
    })?;

    let start = match (input.start_index, input.start) {
        (Some(index), coords) => Some(task_location(Some(index), coords, locations, "vehicle", id)?),
        (None, Some(_)) => {
            return Err(InputError::MissingLocationIndex {
                object: "vehicle".to_owned(),
                id,
            });
        }
        (None, None) => None,
    };
    let end = match (input.end_index, input.end) {
        (Some(index), coords) => Some(task_location(Some(index), coords, locations, "vehicle", id)?),
        (None, Some(_)) => {
            return Err(InputError::MissingLocationIndex {
                object: "vehicle".to_owned(),
                id,
            });
        }
        (None, None) => None,
    };
    if start.is_none() && end.is_none() {
        return Err(InputError::InvalidFieldFor {
            field: "start and end".to_owned(),
            object: "vehicle".to_owned(),
            id,
        });
    }

    let capacity = scaled_amount(input.capacity.as_deref(), "capacity", amount_size)?;

    let mut breaks = Vec::with_capacity(input.breaks.len());
    for b in &input.breaks {
        let max_load = b
            .max_load
            .as_deref()
            .map(|load| scaled_amount(Some(load), "max_load", amount_size))
            .transpose()?;
        breaks.push(Break {
            id: b.id,
            time_windows: task_time_windows(b.time_windows.as_ref(), "break", b.id)?,
            service: scale_duration(b.service),
            max_load,
            description: b.description.clone(),
        });
    }

    let steps = input
        .steps
        .iter()
        .map(|step| forced_step(step, id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Vehicle::new(VehicleData {
        id,
        start,
        start_coordinates: input.start,
        end,
        end_coordinates: input.end,
        profile,
        capacity,
        skills: input.skills.iter().copied().collect(),
        time_window: window,
        breaks,
        costs: VehicleCosts {
            fixed: input.costs.fixed,
            per_hour: input.costs.per_hour,
            per_km: input.costs.per_km,
        },
        speed_factor: input.speed_factor,
        service_type: input.service_type.clone(),
        max_tasks: input.max_tasks,
        max_travel_time: input.max_travel_time.map(scale_duration),
        max_distance: input.max_distance.map(scale_distance),
        steps,
        description: input.description.clone(),
    }))
}

fn forced_step(input: &StepInput, vehicle_id: UserId) -> Result<ForcedStep, InputError> {
    let service = ForcedService {
        at: input.service_at.map(scale_duration),
        after: input.service_after.map(scale_duration),
        before: input.service_before.map(scale_duration),
    };

    let kind = match input.step_type {
        StepTypeInput::Start => ForcedStepKind::Start,
        StepTypeInput::End => ForcedStepKind::End,
        StepTypeInput::Job | StepTypeInput::Pickup | StepTypeInput::Delivery => {
            let id = input.id.ok_or_else(|| InputError::InvalidFieldFor {
                field: "id".to_owned(),
                object: "steps for vehicle".to_owned(),
                id: vehicle_id,
            })?;
            let kind = match input.step_type {
                StepTypeInput::Job => JobKind::Single,
                StepTypeInput::Pickup => JobKind::Pickup,
                _ => JobKind::Delivery,
            };
            ForcedStepKind::Task { id, kind }
        }
        StepTypeInput::Break => {
            let id = input.id.ok_or_else(|| InputError::InvalidFieldFor {
                field: "id".to_owned(),
                object: "steps for vehicle".to_owned(),
                id: vehicle_id,
            })?;
            ForcedStepKind::Pause { id }
        }
    };

    Ok(ForcedStep { kind, service })
}

/// Resolves forced step references and narrows the pinned tasks' time
/// windows to their forced service bounds.
fn apply_forced_service_bounds(
    jobs: &mut [Job],
    vehicles: &[Vehicle],
) -> Result<(), InputError> {
    let lookup: FxHashMap<(JobKind, UserId), usize> = jobs
        .iter()
        .enumerate()
        .map(|(index, job)| ((job.kind(), job.id()), index))
        .collect();

    for vehicle in vehicles {
        let vehicle_id = vehicle.id();
        for step in vehicle.forced_steps() {
            match &step.kind {
                ForcedStepKind::Start | ForcedStepKind::End => {}
                ForcedStepKind::Task { id, kind } => {
                    let &index =
                        lookup
                            .get(&(*kind, *id))
                            .ok_or(InputError::UnknownStepId {
                                vehicle_id,
                                id: *id,
                            })?;

                    let (after, before) = step.service.bounds();
                    let narrowed = jobs[index]
                        .time_windows()
                        .narrowed(after, before)
                        .ok_or_else(|| InputError::InvalidFieldFor {
                            field: "forced service interval".to_owned(),
                            object: kind.as_str().to_owned(),
                            id: *id,
                        })?;
                    *jobs[index].time_windows_mut() = narrowed;
                }
                ForcedStepKind::Pause { id } => {
                    if !vehicle.breaks().iter().any(|b| b.id == *id) {
                        return Err(InputError::UnknownStepId {
                            vehicle_id,
                            id: *id,
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(extra_job: &str, extra_vehicle: &str) -> String {
        format!(
            r#"{{
                "jobs": [{{"id": 1, "location_index": 1{extra_job}}}],
                "vehicles": [{{"id": 1, "start_index": 0{extra_vehicle}}}],
                "matrix": [[0, 10], [10, 0]]
            }}"#
        )
    }

    #[test]
    fn test_minimal_input_parses() {
        let problem = parse_problem(&minimal("", "")).unwrap();
        assert_eq!(problem.jobs().len(), 1);
        assert_eq!(problem.vehicles().len(), 1);
        assert_eq!(problem.oracle().locations(), 2);
    }

    #[test]
    fn test_missing_tasks_is_rejected() {
        let input = r#"{"vehicles": [{"id": 1, "start_index": 0}], "matrix": [[0]]}"#;
        assert!(matches!(parse_problem(input), Err(InputError::NoTasks)));
    }

    #[test]
    fn test_reversed_time_window_is_rejected() {
        let err = parse_problem(&minimal(r#", "time_windows": [[100, 50]]"#, "")).unwrap_err();
        assert!(matches!(err, InputError::InvalidTimeWindow { id: 1, .. }));
    }

    #[test]
    fn test_amount_compat_rule() {
        // `amount` acts as delivery when alone.
        let input = r#"{
            "jobs": [{"id": 1, "location_index": 1, "amount": [3]}],
            "vehicles": [{"id": 1, "start_index": 0, "capacity": [5]}],
            "matrix": [[0, 10], [10, 0]]
        }"#;
        let problem = parse_problem(input).unwrap();
        assert_eq!(problem.job(JobIdx::new(0)).delivery().get(0), 3);

        // With an explicit pickup the deprecated key is ignored.
        let input = r#"{
            "jobs": [{"id": 1, "location_index": 1, "amount": [3], "pickup": [2]}],
            "vehicles": [{"id": 1, "start_index": 0, "capacity": [5]}],
            "matrix": [[0, 10], [10, 0]]
        }"#;
        let problem = parse_problem(input).unwrap();
        assert_eq!(problem.job(JobIdx::new(0)).delivery().get(0), 0);
        assert_eq!(problem.job(JobIdx::new(0)).pickup().get(0), 2);
    }

    #[test]
    fn test_amount_dimension_mismatch() {
        let err = parse_problem(&minimal(r#", "delivery": [1, 2]"#, r#", "capacity": [5]"#))
            .unwrap_err();
        assert!(matches!(err, InputError::InconsistentAmount { .. }));
    }

    #[test]
    fn test_multi_window_vehicle_expands_to_clones() {
        let input = r#"{
            "jobs": [{"id": 1, "location_index": 1}],
            "vehicles": [{"id": 7, "start_index": 0,
                          "time_windows": [[0, 100], [200, 300]]}],
            "matrix": [[0, 10], [10, 0]]
        }"#;
        let problem = parse_problem(input).unwrap();
        assert_eq!(problem.vehicles().len(), 2);
        assert!(problem.vehicles().iter().all(|v| v.id() == 7));
    }

    #[test]
    fn test_unknown_profile_is_rejected() {
        let err = parse_problem(&minimal("", r#", "profile": "bike""#)).unwrap_err();
        assert!(matches!(
            err,
            InputError::MissingDurationsMatrix { profile } if profile == "bike"
        ));
    }

    #[test]
    fn test_shipment_halves_are_linked() {
        let input = r#"{
            "shipments": [{
                "pickup": {"id": 3, "location_index": 0},
                "delivery": {"id": 4, "location_index": 1},
                "amount": [2]
            }],
            "vehicles": [{"id": 1, "start_index": 0, "capacity": [5]}],
            "matrix": [[0, 10], [10, 0]]
        }"#;
        let problem = parse_problem(input).unwrap();
        assert_eq!(problem.jobs().len(), 2);

        let pickup = problem.job(JobIdx::new(0));
        let delivery = problem.job(JobIdx::new(1));
        assert_eq!(pickup.kind(), JobKind::Pickup);
        assert_eq!(pickup.partner(), Some(JobIdx::new(1)));
        assert_eq!(delivery.partner(), Some(JobIdx::new(0)));
        assert_eq!(pickup.pickup().get(0), 2);
        assert_eq!(delivery.delivery().get(0), 2);
    }

    #[test]
    fn test_speed_factor_limit() {
        let err = parse_problem(&minimal("", r#", "speed_factor": 9.0"#)).unwrap_err();
        assert!(matches!(err, InputError::InvalidFieldFor { id: 1, .. }));
    }
}
