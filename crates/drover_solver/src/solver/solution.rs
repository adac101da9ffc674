use fxhash::FxHashSet;

use crate::{
    constants::{Cost, Distance, Duration, Priority},
    define_index_newtype,
    problem::{Problem, job::JobIdx},
    solver::route::Route,
};

define_index_newtype!(RouteIdx, Route);

/// Complete assignment state: one route per vehicle plus the unassigned job
/// set. The multiset of job ids across routes and unassigned always equals
/// the input job set exactly once.
#[derive(Clone, Debug)]
pub struct SolutionState {
    routes: Vec<Route>,
    unassigned: FxHashSet<JobIdx>,
}

impl SolutionState {
    pub fn new(problem: &Problem) -> Self {
        let routes = (0..problem.vehicles().len())
            .map(|v| Route::empty(problem, v.into()))
            .collect();
        let unassigned = (0..problem.jobs().len()).map(JobIdx::new).collect();

        SolutionState {
            routes,
            unassigned,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, index: RouteIdx) -> &Route {
        &self.routes[index]
    }

    pub fn route_mut(&mut self, index: RouteIdx) -> &mut Route {
        &mut self.routes[index]
    }

    pub fn unassigned(&self) -> &FxHashSet<JobIdx> {
        &self.unassigned
    }

    /// Unassigned jobs in a deterministic order.
    pub fn unassigned_sorted(&self) -> Vec<JobIdx> {
        let mut jobs: Vec<JobIdx> = self.unassigned.iter().copied().collect();
        jobs.sort_unstable();
        jobs
    }

    pub fn is_unassigned(&self, job: JobIdx) -> bool {
        self.unassigned.contains(&job)
    }

    pub fn assigned_count(&self, problem: &Problem) -> usize {
        problem.jobs().len() - self.unassigned.len()
    }

    pub(crate) fn mark_assigned(&mut self, job: JobIdx) {
        let removed = self.unassigned.remove(&job);
        debug_assert!(removed, "job {job} was not unassigned");
    }

    pub(crate) fn mark_unassigned(&mut self, job: JobIdx) {
        let inserted = self.unassigned.insert(job);
        debug_assert!(inserted, "job {job} was already unassigned");
    }

    pub fn route_of_job(&self, job: JobIdx) -> Option<RouteIdx> {
        self.routes
            .iter()
            .position(|route| route.contains_job(job))
            .map(RouteIdx::new)
    }

    pub fn total_cost(&self, problem: &Problem) -> Cost {
        self.routes.iter().map(|route| route.cost(problem)).sum()
    }

    pub fn total_duration(&self, problem: &Problem) -> Duration {
        self.routes
            .iter()
            .map(|route| route.duration(problem))
            .sum()
    }

    pub fn total_travel(&self) -> Duration {
        self.routes.iter().map(|route| route.travel()).sum()
    }

    pub fn total_distance(&self) -> Distance {
        self.routes.iter().map(|route| route.distance()).sum()
    }

    pub fn assigned_priority(&self, problem: &Problem) -> Priority {
        self.routes
            .iter()
            .flat_map(|route| route.steps())
            .filter_map(|step| step.job())
            .map(|job| problem.job(job).priority())
            .sum()
    }

    /// Checks the task multiset invariant; debug builds call this after
    /// every operator application.
    #[cfg(debug_assertions)]
    pub fn assert_consistent(&self, problem: &Problem) {
        let mut seen = FxHashSet::default();
        for route in &self.routes {
            for step in route.steps() {
                if let Some(job) = step.job() {
                    assert!(seen.insert(job), "job {job} appears twice in routes");
                    assert!(
                        !self.unassigned.contains(&job),
                        "job {job} both routed and unassigned"
                    );
                }
            }
        }
        assert_eq!(
            seen.len() + self.unassigned.len(),
            problem.jobs().len(),
            "job multiset mismatch"
        );
    }
}
