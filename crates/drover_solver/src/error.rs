use thiserror::Error;

/// Rejections raised while turning the input document into a [`crate::Problem`].
///
/// Every variant names the offending field and, where one exists, the task or
/// vehicle id so the message can be surfaced verbatim to the caller.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid {field} value.")]
    InvalidField { field: String },
    #[error("Invalid {field} for {object} {id}.")]
    InvalidFieldFor {
        field: String,
        object: String,
        id: u64,
    },
    #[error("Invalid or missing id for {object}.")]
    MissingId { object: String },
    #[error("Duplicate id {id} for {object}.")]
    DuplicateId { object: String, id: u64 },
    #[error("Invalid jobs or shipments.")]
    NoTasks,
    #[error("Invalid vehicles.")]
    NoVehicles,
    #[error("Inconsistent {field} length: {actual} instead of {expected}.")]
    InconsistentAmount {
        field: String,
        actual: usize,
        expected: usize,
    },
    #[error("Invalid time window ({start}, {end}) for {object} {id}.")]
    InvalidTimeWindow {
        object: String,
        id: u64,
        start: u32,
        end: u32,
    },
    #[error("Unexpected matrix line length for profile {profile}.")]
    NonSquareMatrix { profile: String },
    #[error("No durations matrix defined for profile {profile}.")]
    MissingDurationsMatrix { profile: String },
    #[error("Location index {index} out of bounds for {object} {id}.")]
    LocationOutOfBounds {
        object: String,
        id: u64,
        index: usize,
    },
    #[error("Missing location index for {object} {id}.")]
    MissingLocationIndex { object: String, id: u64 },
    #[error("Invalid step id {id} in steps for vehicle {vehicle_id}.")]
    UnknownStepId { vehicle_id: u64, id: u64 },
    #[error("{0}")]
    Json(String),
}

/// Failures of the solve stage proper. Deadline expiry is not one of them: a
/// timed out run still returns its best state, flagged in the summary.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Exploration level must be in 0..={max}, got {level}.")]
    InvalidExplorationLevel { level: u32, max: u32 },
    #[error("Thread count must be nonzero.")]
    NoThreads,
    #[error("Could not build the worker pool: {0}")]
    ThreadPool(String),
}
