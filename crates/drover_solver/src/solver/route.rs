use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    constants::{Cost, Distance, Duration, INFINITE_COST},
    problem::{
        Problem,
        amount::Amount,
        job::{JobIdx, JobKind},
        vehicle::VehicleIdx,
    },
};

/// One position of a route tour. Start and end are implicit from the
/// vehicle; breaks reference the vehicle's own break list and never migrate
/// to another route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Job(JobIdx),
    Break(usize),
}

impl Step {
    pub fn job(&self) -> Option<JobIdx> {
        match self {
            Step::Job(job) => Some(*job),
            Step::Break(_) => None,
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Step::Break(_))
    }
}

/// Exact deltas of a candidate splice, in internal scaled units.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpliceDelta {
    pub cost: Cost,
    pub travel: Duration,
    pub distance: Distance,
}

/// Ordered tour of one vehicle with dense caches over step positions:
/// loads with prefix/suffix headroom margins, earliest and latest service
/// starts, and prefix sums of cost, travel time and distance. Feasibility
/// and cost queries for a splice are answered against the caches; only
/// [`Route::replace`] pays a rebuild.
#[derive(Clone, Debug)]
pub struct Route {
    vehicle: VehicleIdx,
    steps: Vec<Step>,
    /// Routes projected from a user-pinned step skeleton are frozen: no
    /// operator may reorder or migrate their steps.
    frozen: bool,

    job_count: usize,
    time_feasible: bool,

    /// Effective location per step; a break sits at the preceding job's
    /// location.
    locations: Vec<Option<usize>>,

    /// Earliest service start per step under the earliest schedule.
    earliest: Vec<Duration>,
    /// Latest service start per step keeping the suffix feasible.
    latest: Vec<Duration>,
    /// Departure per step under the earliest schedule.
    departure: Vec<Duration>,

    /// `loads[0]` is the initial load, `loads[k + 1]` the load after step k.
    loads: Vec<Amount>,
    /// `fwd_margin[p]` = componentwise min over positions `0..=p` of the
    /// headroom `limit - load`, where the limit is the vehicle capacity
    /// tightened by `max_load` at breaks.
    fwd_margin: Vec<Amount>,
    /// Same, over positions `p..=len`.
    bwd_margin: Vec<Amount>,
    /// Inclusive prefix sums of delivery and pickup amounts per step.
    fwd_deliveries: Vec<Amount>,
    fwd_pickups: Vec<Amount>,

    /// Cumulative edge cost / travel / distance through the edge into step k.
    fwd_cost: Vec<Cost>,
    fwd_travel: Vec<Duration>,
    fwd_distance: Vec<Distance>,
    /// Totals including the final edge to the vehicle end.
    end_cost: Cost,
    end_travel: Duration,
    end_distance: Distance,

    /// Step position per job; shipment precedence checks read pickup and
    /// delivery ranks from here.
    positions: FxHashMap<JobIdx, usize>,
}

impl Route {
    /// Fresh route for a vehicle: no jobs, the vehicle's breaks in window
    /// order.
    pub fn empty(problem: &Problem, vehicle: VehicleIdx) -> Self {
        let steps = (0..problem.vehicle(vehicle).breaks().len())
            .map(Step::Break)
            .collect();

        let mut route = Route {
            vehicle,
            steps,
            frozen: false,
            job_count: 0,
            time_feasible: true,
            locations: Vec::new(),
            earliest: Vec::new(),
            latest: Vec::new(),
            departure: Vec::new(),
            loads: Vec::new(),
            fwd_margin: Vec::new(),
            bwd_margin: Vec::new(),
            fwd_deliveries: Vec::new(),
            fwd_pickups: Vec::new(),
            fwd_cost: Vec::new(),
            fwd_travel: Vec::new(),
            fwd_distance: Vec::new(),
            end_cost: 0,
            end_travel: 0,
            end_distance: 0,
            positions: FxHashMap::default(),
        };

        route.rebuild(problem);
        route
    }

    pub fn vehicle(&self) -> VehicleIdx {
        self.vehicle
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn has_jobs(&self) -> bool {
        self.job_count > 0
    }

    pub fn job_count(&self) -> usize {
        self.job_count
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, position: usize) -> Step {
        self.steps[position]
    }

    pub fn job_at(&self, position: usize) -> Option<JobIdx> {
        self.steps[position].job()
    }

    pub fn position_of(&self, job: JobIdx) -> Option<usize> {
        self.positions.get(&job).copied()
    }

    pub fn contains_job(&self, job: JobIdx) -> bool {
        self.positions.contains_key(&job)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_time_feasible(&self) -> bool {
        self.time_feasible
    }

    pub fn earliest(&self, position: usize) -> Duration {
        self.earliest[position]
    }

    pub fn latest(&self, position: usize) -> Duration {
        self.latest[position]
    }

    pub fn departure(&self, position: usize) -> Duration {
        self.departure[position]
    }

    pub fn load_after(&self, position: usize) -> &Amount {
        &self.loads[position + 1]
    }

    pub fn initial_load(&self) -> &Amount {
        &self.loads[0]
    }

    /// Effective location of a step; breaks sit at the preceding job's
    /// location (or the vehicle start).
    pub fn location_at(&self, position: usize) -> Option<usize> {
        self.locations[position]
    }

    /// Location preceding a splice at `position`.
    pub fn location_before(&self, problem: &Problem, position: usize) -> Option<usize> {
        if position == 0 {
            problem.vehicle(self.vehicle).start()
        } else {
            self.locations[position - 1]
        }
    }

    /// Total route cost: traveled edges plus the fixed cost once the route
    /// serves at least one job.
    pub fn cost(&self, problem: &Problem) -> Cost {
        let fixed = if self.has_jobs() {
            problem.vehicle(self.vehicle).costs().scaled_fixed()
        } else {
            0
        };
        self.end_cost + fixed
    }

    pub fn travel(&self) -> Duration {
        self.end_travel
    }

    pub fn distance(&self) -> Distance {
        self.end_distance
    }

    /// Departure time from the vehicle start, shifted forward to absorb
    /// waiting before the first step.
    pub fn start_departure(&self, problem: &Problem) -> Duration {
        let vehicle = problem.vehicle(self.vehicle);
        if self.steps.is_empty() {
            return vehicle.time_window().start;
        }

        let first_travel = problem
            .eval(self.vehicle, vehicle.start(), self.locations[0])
            .duration;
        let setup = match self.steps[0] {
            Step::Job(job) => problem.job(job).setup(),
            Step::Break(_) => 0,
        };

        (self.earliest[0] - setup - first_travel).max(vehicle.time_window().start)
    }

    /// Arrival at the vehicle end under the earliest schedule.
    pub fn end_arrival(&self, problem: &Problem) -> Duration {
        let vehicle = problem.vehicle(self.vehicle);
        match self.steps.last() {
            None => vehicle.time_window().start,
            Some(_) => {
                let last = self.len() - 1;
                let travel = problem
                    .eval(self.vehicle, self.locations[last], vehicle.end())
                    .duration;
                self.departure[last].saturating_add(travel)
            }
        }
    }

    pub fn duration(&self, problem: &Problem) -> Duration {
        if !self.has_jobs() {
            return 0;
        }
        self.end_arrival(problem) - self.start_departure(problem)
    }

    /// True when the range contains no break, which is what segment-moving
    /// operators require.
    pub fn is_job_run(&self, start: usize, end: usize) -> bool {
        self.steps[start..end].iter().all(|s| !s.is_break())
    }

    /// First position from which a job-only tail can be cut.
    pub fn tail_start_min(&self) -> usize {
        self.steps
            .iter()
            .rposition(|s| s.is_break())
            .map(|p| p + 1)
            .unwrap_or(0)
    }

    fn service_of(&self, problem: &Problem, step: Step) -> Duration {
        match step {
            Step::Job(job) => problem.job_service(self.vehicle, job),
            Step::Break(b) => problem.vehicle(self.vehicle).breaks()[b].service,
        }
    }

    /// Can `seq` replace the steps in `[start, end)` without violating any
    /// route invariant. O(|seq| + |removed|) against cached prefix/suffix
    /// values.
    pub fn is_valid_addition<I>(&self, problem: &Problem, seq: I, start: usize, end: usize) -> bool
    where
        I: Iterator<Item = Step> + Clone,
    {
        self.evaluate_splice(problem, seq, start, end).is_some()
    }

    /// Exact cost delta of the splice; `INFINITE_COST` when infeasible.
    pub fn addition_cost<I>(&self, problem: &Problem, seq: I, start: usize, end: usize) -> Cost
    where
        I: Iterator<Item = Step> + Clone,
    {
        self.evaluate_splice(problem, seq, start, end)
            .map(|delta| delta.cost)
            .unwrap_or(INFINITE_COST)
    }

    /// Feasibility and exact deltas of replacing `[start, end)` by `seq`.
    /// `None` means some invariant would break.
    pub fn evaluate_splice<I>(
        &self,
        problem: &Problem,
        seq: I,
        start: usize,
        end: usize,
    ) -> Option<SpliceDelta>
    where
        I: Iterator<Item = Step> + Clone,
    {
        if self.frozen || !self.time_feasible {
            return None;
        }

        let vehicle = problem.vehicle(self.vehicle);
        let n = self.len();
        debug_assert!(start <= end && end <= n);

        // A break's schedule and the edges around it depend on the job
        // preceding it, so the comparison window extends over any breaks
        // right after the removed range.
        let mut ext_end = end;
        while ext_end < n && self.steps[ext_end].is_break() {
            ext_end += 1;
        }
        let seq = seq.chain(self.steps[end..ext_end].iter().copied());

        // Removed and inserted break sequences must match: breaks never
        // leave their route nor reorder.
        let removed_breaks: SmallVec<[usize; 2]> = self.steps[start..ext_end]
            .iter()
            .filter_map(|s| match s {
                Step::Break(b) => Some(*b),
                Step::Job(_) => None,
            })
            .collect();
        let inserted_breaks: SmallVec<[usize; 2]> = seq
            .clone()
            .filter_map(|s| match s {
                Step::Break(b) => Some(b),
                Step::Job(_) => None,
            })
            .collect();
        if removed_breaks != inserted_breaks {
            return None;
        }

        // Removed amounts come from the prefix sums; the job list itself is
        // only needed for precedence checks.
        let dim = problem.amount_dimensions();
        let (d_rem, p_rem) = if start < ext_end {
            let d_hi = &self.fwd_deliveries[ext_end - 1];
            let p_hi = &self.fwd_pickups[ext_end - 1];
            if start > 0 {
                (
                    d_hi.minus(&self.fwd_deliveries[start - 1]),
                    p_hi.minus(&self.fwd_pickups[start - 1]),
                )
            } else {
                (d_hi.clone(), p_hi.clone())
            }
        } else {
            (Amount::zero(dim), Amount::zero(dim))
        };

        let removed_jobs: SmallVec<[JobIdx; 8]> = self.steps[start..ext_end]
            .iter()
            .filter_map(Step::job)
            .collect();

        let mut inserted_jobs: SmallVec<[JobIdx; 8]> = SmallVec::new();
        let mut d_ins = Amount::zero(dim);
        let mut p_ins = Amount::zero(dim);
        for step in seq.clone() {
            if let Step::Job(job) = step {
                inserted_jobs.push(job);
                d_ins.add_assign(problem.job(job).delivery());
                p_ins.add_assign(problem.job(job).pickup());
            }
        }

        let new_job_count = self.job_count - removed_jobs.len() + inserted_jobs.len();
        if new_job_count > vehicle.max_tasks() {
            return None;
        }

        for &job in &inserted_jobs {
            if !problem.vehicle_ok_with_job(self.vehicle, job) {
                return None;
            }
        }

        if !self.precedence_ok(problem, &removed_jobs, &inserted_jobs, start, ext_end) {
            return None;
        }

        if !self.capacity_ok(
            problem, &seq, start, ext_end, &d_rem, &p_rem, &d_ins, &p_ins,
        ) {
            return None;
        }

        let delta = self.time_and_edges_ok(problem, &seq, start, ext_end)?;

        if self.end_travel + delta.travel > vehicle.max_travel_time()
            || self.end_distance + delta.distance > vehicle.max_distance()
        {
            return None;
        }

        let mut delta = delta;
        let fixed = vehicle.costs().scaled_fixed();
        if self.job_count == 0 && new_job_count > 0 {
            delta.cost += fixed;
        } else if self.job_count > 0 && new_job_count == 0 {
            delta.cost -= fixed;
        }

        Some(delta)
    }

    fn precedence_ok(
        &self,
        problem: &Problem,
        removed_jobs: &[JobIdx],
        inserted_jobs: &[JobIdx],
        start: usize,
        ext_end: usize,
    ) -> bool {
        // A shipment half removed for good drags its partner with it.
        for &job in removed_jobs {
            if inserted_jobs.contains(&job) {
                continue;
            }
            if let Some(partner) = problem.job(job).partner() {
                let partner_removed =
                    removed_jobs.contains(&partner) && !inserted_jobs.contains(&partner);
                if !partner_removed {
                    return false;
                }
            }
        }

        // Inserted halves must keep pickup before delivery, either inside
        // the sequence or against the partner's untouched position.
        for (rank, &job) in inserted_jobs.iter().enumerate() {
            let Some(partner) = problem.job(job).partner() else {
                continue;
            };

            let partner_rank = inserted_jobs.iter().position(|&j| j == partner);
            let is_pickup = matches!(problem.job(job).kind(), JobKind::Pickup);

            match partner_rank {
                Some(partner_rank) => {
                    if is_pickup && partner_rank < rank {
                        return false;
                    }
                }
                None => {
                    let Some(partner_pos) = self.position_of(partner) else {
                        return false;
                    };
                    // The partner must sit strictly outside the splice.
                    if partner_pos >= start && partner_pos < ext_end {
                        return false;
                    }
                    if is_pickup && partner_pos < start {
                        return false;
                    }
                    if !is_pickup && partner_pos >= ext_end {
                        return false;
                    }
                }
            }
        }

        true
    }

    #[allow(clippy::too_many_arguments)]
    fn capacity_ok<I>(
        &self,
        problem: &Problem,
        seq: &I,
        start: usize,
        ext_end: usize,
        d_rem: &Amount,
        p_rem: &Amount,
        d_ins: &Amount,
        p_ins: &Amount,
    ) -> bool
    where
        I: Iterator<Item = Step> + Clone,
    {
        let vehicle = problem.vehicle(self.vehicle);
        let capacity = vehicle.capacity();
        let dim = problem.amount_dimensions();
        let zero = Amount::zero(dim);

        // Loads before the splice all shift by the delivery delta.
        let shift_before = d_ins.minus(d_rem);
        if !shift_before.fits_in(&self.fwd_margin[start]) {
            return false;
        }

        // Loads after the splice shift by the pickup delta.
        if ext_end < self.len() {
            let shift_after = p_ins.minus(p_rem);
            if !shift_after.fits_in(&self.bwd_margin[ext_end + 1]) {
                return false;
            }
        }

        // Walk the inserted segment exactly.
        let mut load = self.loads[start].plus(&shift_before);
        for step in seq.clone() {
            match step {
                Step::Job(job) => {
                    let job = problem.job(job);
                    load.sub_assign(job.delivery());
                    load.add_assign(job.pickup());
                    if !load.fits_in(capacity) || !zero.fits_in(&load) {
                        return false;
                    }
                }
                Step::Break(b) => {
                    if let Some(max_load) = &vehicle.breaks()[b].max_load
                        && !load.fits_in(max_load)
                    {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Forward time simulation over the spliced segment, bounded by the
    /// `latest` cache at the first kept job. Also accumulates the exact
    /// edge deltas.
    fn time_and_edges_ok<I>(
        &self,
        problem: &Problem,
        seq: &I,
        start: usize,
        ext_end: usize,
    ) -> Option<SpliceDelta>
    where
        I: Iterator<Item = Step> + Clone,
    {
        let vehicle = problem.vehicle(self.vehicle);
        let n = self.len();

        let mut location = self.location_before(problem, start);
        let mut departure = if start == 0 {
            vehicle.time_window().start
        } else {
            self.departure[start - 1]
        };

        let mut cost: Cost = 0;
        let mut travel: Duration = 0;
        let mut distance: Distance = 0;

        for step in seq.clone() {
            match step {
                Step::Job(idx) => {
                    let job = problem.job(idx);
                    let eval = problem.eval(self.vehicle, location, Some(job.location()));
                    cost += eval.cost;
                    travel += eval.duration;
                    distance += eval.distance;

                    let arrival = departure.saturating_add(eval.duration);
                    let ready = arrival.saturating_add(job.setup());
                    let service_start = job.time_windows().earliest_start(ready)?;
                    departure = service_start + problem.job_service(self.vehicle, idx);
                    location = Some(job.location());
                }
                Step::Break(b) => {
                    let pause = &vehicle.breaks()[b];
                    let service_start = pause.time_windows.earliest_start(departure)?;
                    departure = service_start + pause.service;
                }
            }
        }

        // Reconnect to the kept suffix or to the vehicle end.
        if ext_end == n {
            let eval = problem.eval(self.vehicle, location, vehicle.end());
            cost += eval.cost;
            travel += eval.duration;
            distance += eval.distance;

            if departure.saturating_add(eval.duration) > vehicle.time_window().end {
                return None;
            }
        } else {
            // Normalization guarantees the first kept step is a job.
            let next = self.steps[ext_end]
                .job()
                .expect("splice extension must stop at a job");
            let job = problem.job(next);
            let eval = problem.eval(self.vehicle, location, Some(job.location()));
            cost += eval.cost;
            travel += eval.duration;
            distance += eval.distance;

            let arrival = departure.saturating_add(eval.duration);
            let ready = arrival.saturating_add(job.setup());
            let service_start = job.time_windows().earliest_start(ready)?;
            if service_start > self.latest[ext_end] {
                return None;
            }
        }

        // Old edges covered by the same window: into steps start..=ext_end,
        // or through the final edge when the window reaches the route end.
        let old_until = if ext_end == n {
            self.end_cost
        } else {
            self.fwd_cost[ext_end]
        };
        let old_travel_until = if ext_end == n {
            self.end_travel
        } else {
            self.fwd_travel[ext_end]
        };
        let old_distance_until = if ext_end == n {
            self.end_distance
        } else {
            self.fwd_distance[ext_end]
        };

        let (old_cost, old_travel, old_distance) = if start == 0 {
            (old_until, old_travel_until, old_distance_until)
        } else {
            (
                old_until - self.fwd_cost[start - 1],
                old_travel_until - self.fwd_travel[start - 1],
                old_distance_until - self.fwd_distance[start - 1],
            )
        };

        Some(SpliceDelta {
            cost: cost - old_cost,
            travel: travel - old_travel,
            distance: distance - old_distance,
        })
    }

    /// Splices `seq` over `[start, end)` and rebuilds the caches. Callers
    /// validate first; the rebuild asserts the invariants in debug builds.
    pub fn replace<I>(&mut self, problem: &Problem, seq: I, start: usize, end: usize)
    where
        I: Iterator<Item = Step>,
    {
        self.steps.splice(start..end, seq);
        self.rebuild(problem);
    }

    pub(crate) fn set_steps(&mut self, problem: &Problem, steps: Vec<Step>) {
        self.steps = steps;
        self.rebuild(problem);
    }

    /// Full cache rebuild: forward schedule and prefix sums, load margins,
    /// backward latest pass.
    pub fn rebuild(&mut self, problem: &Problem) {
        let vehicle = problem.vehicle(self.vehicle);
        let tw = vehicle.time_window();
        let n = self.steps.len();
        let dim = problem.amount_dimensions();

        self.job_count = self.steps.iter().filter(|s| !s.is_break()).count();
        self.time_feasible = true;

        self.positions.clear();
        for (position, step) in self.steps.iter().enumerate() {
            if let Step::Job(job) = step {
                self.positions.insert(*job, position);
            }
        }

        self.locations.resize(n, None);
        self.earliest.resize(n, 0);
        self.latest.resize(n, 0);
        self.departure.resize(n, 0);
        self.fwd_cost.resize(n, 0);
        self.fwd_travel.resize(n, 0);
        self.fwd_distance.resize(n, 0);
        self.fwd_deliveries.resize_with(n, || Amount::zero(dim));
        self.fwd_pickups.resize_with(n, || Amount::zero(dim));
        self.loads.resize_with(n + 1, || Amount::zero(dim));
        self.fwd_margin.resize_with(n + 1, || Amount::zero(dim));
        self.bwd_margin.resize_with(n + 1, || Amount::zero(dim));

        // Forward pass: schedule, effective locations, edge prefix sums.
        let mut location = vehicle.start();
        let mut departure = tw.start;
        let mut cost: Cost = 0;
        let mut travel: Duration = 0;
        let mut distance: Distance = 0;

        for k in 0..n {
            match self.steps[k] {
                Step::Job(idx) => {
                    let job = problem.job(idx);
                    let eval = problem.eval(self.vehicle, location, Some(job.location()));
                    cost += eval.cost;
                    travel += eval.duration;
                    distance += eval.distance;

                    let arrival = departure.saturating_add(eval.duration);
                    let ready = arrival.saturating_add(job.setup());
                    let service_start = match job.time_windows().earliest_start(ready) {
                        Some(start) => start,
                        None => {
                            self.time_feasible = false;
                            ready
                        }
                    };

                    self.earliest[k] = service_start;
                    departure = service_start + problem.job_service(self.vehicle, idx);
                    location = Some(job.location());
                }
                Step::Break(b) => {
                    let pause = &vehicle.breaks()[b];
                    let service_start = match pause.time_windows.earliest_start(departure) {
                        Some(start) => start,
                        None => {
                            self.time_feasible = false;
                            departure
                        }
                    };
                    self.earliest[k] = service_start;
                    departure = service_start + pause.service;
                }
            }

            self.locations[k] = location;
            self.departure[k] = departure;
            self.fwd_cost[k] = cost;
            self.fwd_travel[k] = travel;
            self.fwd_distance[k] = distance;
        }

        let end_eval = problem.eval(self.vehicle, location, vehicle.end());
        self.end_cost = cost + end_eval.cost;
        self.end_travel = travel + end_eval.duration;
        self.end_distance = distance + end_eval.distance;

        if n > 0 && departure.saturating_add(end_eval.duration) > tw.end {
            self.time_feasible = false;
        }

        // Load pass: initial load carries every delivery of the route.
        let mut total_deliveries = Amount::zero(dim);
        for step in &self.steps {
            if let Step::Job(job) = step {
                total_deliveries.add_assign(problem.job(*job).delivery());
            }
        }

        let mut running = total_deliveries.clone();
        let mut d_prefix = Amount::zero(dim);
        let mut p_prefix = Amount::zero(dim);
        self.loads[0] = total_deliveries;
        for k in 0..n {
            if let Step::Job(idx) = self.steps[k] {
                let job = problem.job(idx);
                running.sub_assign(job.delivery());
                running.add_assign(job.pickup());
                d_prefix.add_assign(job.delivery());
                p_prefix.add_assign(job.pickup());
            }
            self.loads[k + 1] = running.clone();
            self.fwd_deliveries[k] = d_prefix.clone();
            self.fwd_pickups[k] = p_prefix.clone();
        }

        // Margin passes. The limit at a break tightens to its max_load.
        let capacity = vehicle.capacity();
        let headrooms: Vec<Amount> = (0..=n)
            .map(|position| {
                let mut limit = capacity.clone();
                if position > 0
                    && let Step::Break(b) = self.steps[position - 1]
                    && let Some(max_load) = &vehicle.breaks()[b].max_load
                {
                    limit.min_assign(max_load);
                }
                limit.minus(&self.loads[position])
            })
            .collect();

        let mut margin = headrooms[0].clone();
        self.fwd_margin[0] = margin.clone();
        for p in 1..=n {
            margin.min_assign(&headrooms[p]);
            self.fwd_margin[p] = margin.clone();
        }

        let mut margin = headrooms[n].clone();
        self.bwd_margin[n] = margin.clone();
        for p in (0..n).rev() {
            margin.min_assign(&headrooms[p]);
            self.bwd_margin[p] = margin.clone();
        }

        // Backward pass: latest feasible service starts.
        let mut bound_departure = if let Some(end_loc) = vehicle.end() {
            let travel_out = problem
                .eval(self.vehicle, if n > 0 { self.locations[n - 1] } else { vehicle.start() }, Some(end_loc))
                .duration;
            tw.end.saturating_sub(travel_out)
        } else {
            tw.end
        };

        for k in (0..n).rev() {
            let service = self.service_of(problem, self.steps[k]);
            let bound_start = bound_departure.saturating_sub(service);

            let (windows, setup, travel_in) = match self.steps[k] {
                Step::Job(idx) => {
                    let job = problem.job(idx);
                    let travel_in = problem
                        .eval(
                            self.vehicle,
                            if k == 0 { vehicle.start() } else { self.locations[k - 1] },
                            Some(job.location()),
                        )
                        .duration;
                    (job.time_windows(), job.setup(), travel_in)
                }
                Step::Break(b) => {
                    let pause = &vehicle.breaks()[b];
                    (&pause.time_windows, 0, 0)
                }
            };

            let latest = match windows.latest_start(bound_start) {
                Some(latest) => latest,
                None => {
                    self.time_feasible = false;
                    bound_start
                }
            };
            self.latest[k] = latest;

            bound_departure = latest.saturating_sub(setup).saturating_sub(travel_in);
        }

        if self.time_feasible {
            debug_assert!(
                (0..n).all(|k| self.earliest[k] <= self.latest[k]),
                "earliest must not exceed latest on a feasible route"
            );
        }
    }
}
