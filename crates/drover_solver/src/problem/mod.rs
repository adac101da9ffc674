pub mod amount;
pub mod cost_oracle;
pub mod job;
pub mod matrix;
pub mod time_window;
pub mod vehicle;

use fxhash::FxHashMap;

use crate::{
    constants::{Duration, UserId},
    problem::{
        cost_oracle::{CostOracle, Eval, VehicleEval},
        job::{Job, JobIdx, JobKind},
        vehicle::{Vehicle, VehicleIdx},
    },
};

/// Immutable solver input: tasks, fleet and the travel oracle. Shared
/// read-only across search workers behind an `Arc`; nothing here mutates
/// after construction.
#[derive(Debug)]
pub struct Problem {
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    oracle: CostOracle,
    evals: Vec<VehicleEval>,
    amount_dimensions: usize,
    /// Flat vehicles × jobs table of skill/capacity compatibility.
    compatibility: Vec<bool>,
    has_shipments: bool,
    /// User (kind, id) to internal index, for forced-step resolution.
    job_lookup: FxHashMap<(JobKind, UserId), JobIdx>,
}

impl Problem {
    pub fn new(
        jobs: Vec<Job>,
        vehicles: Vec<Vehicle>,
        oracle: CostOracle,
        amount_dimensions: usize,
    ) -> Self {
        let evals = vehicles
            .iter()
            .map(|vehicle| {
                VehicleEval::new(
                    vehicle.profile(),
                    vehicle.speed_factor(),
                    vehicle.costs().per_hour,
                    vehicle.costs().per_km,
                )
            })
            .collect();

        let mut compatibility = vec![false; vehicles.len() * jobs.len()];
        for (v, vehicle) in vehicles.iter().enumerate() {
            for (j, job) in jobs.iter().enumerate() {
                let skills_ok = vehicle.can_serve(job.skills());
                let capacity_ok = job.pickup().fits_in(vehicle.capacity())
                    && job.delivery().fits_in(vehicle.capacity());
                compatibility[v * jobs.len() + j] = skills_ok && capacity_ok;
            }
        }

        let has_shipments = jobs.iter().any(|job| job.is_shipment_half());

        let job_lookup = jobs
            .iter()
            .enumerate()
            .map(|(index, job)| ((job.kind(), job.id()), JobIdx::new(index)))
            .collect();

        Problem {
            jobs,
            vehicles,
            oracle,
            evals,
            amount_dimensions,
            compatibility,
            has_shipments,
            job_lookup,
        }
    }

    pub fn job_by_id(&self, kind: JobKind, id: UserId) -> Option<JobIdx> {
        self.job_lookup.get(&(kind, id)).copied()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, index: JobIdx) -> &Job {
        &self.jobs[index]
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, index: VehicleIdx) -> &Vehicle {
        &self.vehicles[index]
    }

    pub fn oracle(&self) -> &CostOracle {
        &self.oracle
    }

    pub fn amount_dimensions(&self) -> usize {
        self.amount_dimensions
    }

    pub fn has_shipments(&self) -> bool {
        self.has_shipments
    }

    /// Skill and unit-capacity compatibility between a vehicle and a job.
    pub fn vehicle_ok_with_job(&self, vehicle: VehicleIdx, job: JobIdx) -> bool {
        self.compatibility[vehicle.get() * self.jobs.len() + job.get()]
    }

    /// Travel evaluation between two optional locations; a missing endpoint
    /// (open route start or end) travels for free.
    pub fn eval(
        &self,
        vehicle: VehicleIdx,
        from: Option<usize>,
        to: Option<usize>,
    ) -> Eval {
        match (from, to) {
            (Some(from), Some(to)) => self.oracle.eval(&self.evals[vehicle.get()], from, to),
            _ => Eval::ZERO,
        }
    }

    /// Service duration of a job when served by a given vehicle, honoring
    /// the per-vehicle-type override.
    pub fn job_service(&self, vehicle: VehicleIdx, job: JobIdx) -> Duration {
        self.jobs[job].service_for(self.vehicles[vehicle.get()].service_type())
    }
}
