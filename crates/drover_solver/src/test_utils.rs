use fxhash::{FxHashMap, FxHashSet};

use crate::{
    constants::{DEFAULT_COST_PER_HOUR, scale_duration},
    problem::{
        Problem,
        amount::Amount,
        cost_oracle::{CostOracle, ProfileMatrices},
        job::{Job, JobData, JobIdx, JobKind},
        matrix::Matrix,
        time_window::{TimeWindow, TimeWindows},
        vehicle::{Vehicle, VehicleCosts, VehicleData},
    },
    solver::{
        route::Step,
        solution::{RouteIdx, SolutionState},
    },
};

/// Knobs for [`line_problem`]: a depot at location 0 and one job per
/// location 1..=jobs along a line, travel proportional to the index gap.
pub struct ProblemConfig {
    pub jobs: usize,
    pub vehicles: usize,
    pub travel: u32,
    pub service: u32,
    pub capacity: i64,
    pub delivery: i64,
    pub pickup: i64,
    pub horizon: Option<u32>,
    pub max_tasks: Option<usize>,
    pub priorities: Vec<u32>,
    /// When set, every vehicle carries one break with this max_load.
    pub break_max_load: Option<i64>,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        ProblemConfig {
            jobs: 3,
            vehicles: 1,
            travel: 10,
            service: 0,
            capacity: 100,
            delivery: 0,
            pickup: 0,
            horizon: None,
            max_tasks: None,
            priorities: Vec::new(),
            break_max_load: None,
        }
    }
}

pub fn line_matrix(locations: usize, travel: u32) -> Matrix {
    let mut matrix = Matrix::constant(locations, 0);
    for i in 0..locations {
        for j in 0..locations {
            matrix.set(i, j, i.abs_diff(j) as u32 * travel);
        }
    }
    matrix
}

fn time_windows(horizon: Option<u32>) -> TimeWindows {
    match horizon {
        Some(h) => TimeWindows::new(vec![TimeWindow::from_user(0, h)]),
        None => TimeWindows::full(),
    }
}

pub fn basic_job(id: u64, kind: JobKind, location: usize, config: &ProblemConfig) -> Job {
    let priority = config
        .priorities
        .get(id as usize)
        .copied()
        .unwrap_or(0);

    Job::new(JobData {
        id,
        kind,
        location,
        coordinates: None,
        setup: 0,
        service: scale_duration(config.service),
        service_per_type: FxHashMap::default(),
        delivery: Amount::from_vec(vec![config.delivery]),
        pickup: Amount::from_vec(vec![config.pickup]),
        skills: FxHashSet::default(),
        priority,
        time_windows: time_windows(config.horizon),
        description: String::new(),
    })
}

pub fn basic_vehicle(id: u64, config: &ProblemConfig) -> Vehicle {
    let breaks = config
        .break_max_load
        .map(|max_load| {
            vec![crate::problem::vehicle::Break {
                id: 1,
                time_windows: TimeWindows::full(),
                service: 0,
                max_load: Some(Amount::from_vec(vec![max_load])),
                description: String::new(),
            }]
        })
        .unwrap_or_default();

    Vehicle::new(VehicleData {
        id,
        start: Some(0),
        start_coordinates: None,
        end: Some(0),
        end_coordinates: None,
        profile: 0,
        capacity: Amount::from_vec(vec![config.capacity]),
        skills: FxHashSet::default(),
        time_window: TimeWindow::full(),
        breaks,
        costs: VehicleCosts {
            fixed: 0,
            per_hour: DEFAULT_COST_PER_HOUR,
            per_km: 0,
        },
        speed_factor: 1.0,
        service_type: None,
        max_tasks: config.max_tasks,
        max_travel_time: None,
        max_distance: None,
        steps: Vec::new(),
        description: String::new(),
    })
}

/// Depot plus one job per location on a line.
pub fn line_problem(config: ProblemConfig) -> Problem {
    let locations = config.jobs + 1;
    let jobs = (0..config.jobs)
        .map(|j| basic_job(j as u64, JobKind::Single, j + 1, &config))
        .collect();
    let vehicles = (0..config.vehicles)
        .map(|v| basic_vehicle(v as u64, &config))
        .collect();

    let oracle = CostOracle::new(vec![ProfileMatrices {
        name: "car".to_owned(),
        durations: line_matrix(locations, config.travel),
        distances: None,
        costs: None,
    }]);

    Problem::new(jobs, vehicles, oracle, 1)
}

/// One pickup/delivery pair at locations 1 and 2, two identical vehicles.
pub fn shipment_problem() -> Problem {
    let config = ProblemConfig {
        jobs: 2,
        vehicles: 2,
        delivery: 0,
        ..ProblemConfig::default()
    };

    let mut pickup = basic_job(1, JobKind::Pickup, 1, &config);
    let mut delivery = basic_job(2, JobKind::Delivery, 2, &config);
    pickup.set_partner(JobIdx::new(1));
    delivery.set_partner(JobIdx::new(0));

    let vehicles = (0..config.vehicles)
        .map(|v| basic_vehicle(v as u64, &config))
        .collect();

    let oracle = CostOracle::new(vec![ProfileMatrices {
        name: "car".to_owned(),
        durations: line_matrix(3, config.travel),
        distances: None,
        costs: None,
    }]);

    Problem::new(vec![pickup, delivery], vehicles, oracle, 1)
}

/// One vehicle with skill 1, one job requiring skill 2.
pub fn skill_mismatch_problem() -> Problem {
    let job = Job::new(JobData {
        id: 0,
        kind: JobKind::Single,
        location: 1,
        coordinates: None,
        setup: 0,
        service: 0,
        service_per_type: FxHashMap::default(),
        delivery: Amount::from_vec(vec![0]),
        pickup: Amount::from_vec(vec![0]),
        skills: [2].into_iter().collect(),
        priority: 0,
        time_windows: TimeWindows::full(),
        description: String::new(),
    });

    let vehicle = Vehicle::new(VehicleData {
        id: 0,
        start: Some(0),
        start_coordinates: None,
        end: Some(0),
        end_coordinates: None,
        profile: 0,
        capacity: Amount::from_vec(vec![100]),
        skills: [1].into_iter().collect(),
        time_window: TimeWindow::full(),
        breaks: Vec::new(),
        costs: VehicleCosts {
            fixed: 0,
            per_hour: DEFAULT_COST_PER_HOUR,
            per_km: 0,
        },
        speed_factor: 1.0,
        service_type: None,
        max_tasks: None,
        max_travel_time: None,
        max_distance: None,
        steps: Vec::new(),
        description: String::new(),
    });

    let oracle = CostOracle::new(vec![ProfileMatrices {
        name: "car".to_owned(),
        durations: line_matrix(2, 10),
        distances: None,
        costs: None,
    }]);

    Problem::new(vec![job], vec![vehicle], oracle, 1)
}

/// Random instance for invariant sweeps: symmetric travel matrix, mixed
/// amounts and priorities, moderately tight windows.
pub fn random_problem(seed: u64, jobs: usize, vehicles: usize) -> Problem {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let locations = jobs + 1;

    let mut matrix = Matrix::constant(locations, 0);
    for i in 0..locations {
        for j in i + 1..locations {
            let travel = rng.random_range(1..=30u32);
            matrix.set(i, j, travel);
            matrix.set(j, i, travel);
        }
    }

    let jobs: Vec<Job> = (0..jobs)
        .map(|index| {
            Job::new(JobData {
                id: index as u64,
                kind: JobKind::Single,
                location: index + 1,
                coordinates: None,
                setup: 0,
                service: scale_duration(rng.random_range(0..=30)),
                service_per_type: FxHashMap::default(),
                delivery: Amount::from_vec(vec![rng.random_range(0..=3)]),
                pickup: Amount::from_vec(vec![rng.random_range(0..=2)]),
                skills: FxHashSet::default(),
                priority: rng.random_range(0..=10),
                time_windows: time_windows(Some(rng.random_range(600..=7200))),
                description: String::new(),
            })
        })
        .collect();

    let vehicles = (0..vehicles)
        .map(|v| {
            basic_vehicle(
                v as u64,
                &ProblemConfig {
                    capacity: 8,
                    ..ProblemConfig::default()
                },
            )
        })
        .collect();

    let oracle = CostOracle::new(vec![ProfileMatrices {
        name: "car".to_owned(),
        durations: matrix,
        distances: None,
        costs: None,
    }]);

    Problem::new(jobs, vehicles, oracle, 1)
}

/// Checks the universally quantified route invariants against recomputed
/// values.
pub fn assert_route_invariants(problem: &Problem, solution: &SolutionState) {
    let mut seen = FxHashSet::default();

    for route in solution.routes() {
        let vehicle = problem.vehicle(route.vehicle());
        let capacity = vehicle.capacity();

        let mut load = route.initial_load().clone();
        assert!(load.fits_in(capacity), "initial load exceeds capacity");

        for (position, &step) in route.steps().iter().enumerate() {
            assert!(
                route.earliest(position) <= route.latest(position),
                "earliest exceeds latest"
            );

            match step {
                Step::Job(idx) => {
                    assert!(seen.insert(idx), "job routed twice");
                    assert!(!solution.is_unassigned(idx), "routed job also unassigned");

                    let job = problem.job(idx);
                    assert!(
                        job.skills().is_subset(vehicle.skills()),
                        "skill requirement violated"
                    );
                    assert!(
                        job.time_windows().is_satisfied(route.earliest(position)),
                        "service starts outside every window"
                    );

                    load.sub_assign(job.delivery());
                    load.add_assign(job.pickup());
                    assert_eq!(&load, route.load_after(position), "load cache diverged");
                    assert!(load.fits_in(capacity), "load exceeds capacity");
                    assert!(
                        Amount::zero(load.dimensions()).fits_in(&load),
                        "load went negative"
                    );

                    if job.kind() == JobKind::Pickup {
                        let delivery = job.partner().unwrap();
                        let delivery_pos = route
                            .position_of(delivery)
                            .expect("shipment halves share a route");
                        assert!(position < delivery_pos, "delivery precedes pickup");
                    }
                }
                Step::Break(b) => {
                    if let Some(max_load) = &vehicle.breaks()[b].max_load {
                        assert!(load.fits_in(max_load), "break max_load violated");
                    }
                }
            }
        }

        assert!(route.job_count() <= vehicle.max_tasks());
        assert!(route.travel() <= vehicle.max_travel_time());
        assert!(route.distance() <= vehicle.max_distance());
    }

    assert_eq!(
        seen.len() + solution.unassigned().len(),
        problem.jobs().len(),
        "job multiset mismatch"
    );
}

/// Builds a solution with the given job sequences, bypassing construction.
pub fn solution_with_routes(problem: &Problem, routes: &[(usize, &[usize])]) -> SolutionState {
    let mut solution = SolutionState::new(problem);

    for &(vehicle, jobs) in routes {
        let route = solution.route_mut(RouteIdx::new(vehicle));
        let insert_at = route.len();
        route.replace(
            problem,
            jobs.iter().map(|&j| Step::Job(JobIdx::new(j))),
            insert_at,
            insert_at,
        );
        for &j in jobs {
            solution.mark_assigned(JobIdx::new(j));
        }
    }

    solution
}
