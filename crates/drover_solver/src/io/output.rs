use serde::Serialize;

use crate::{
    constants::{UserId, unscale_cost, unscale_distance, unscale_duration},
    problem::{Problem, job::JobKind},
    solver::{driver::Solved, route::Route, route::Step},
};

#[derive(Serialize, Debug)]
pub struct SolutionOutput {
    pub code: u32,
    pub summary: Summary,
    pub routes: Vec<RouteOutput>,
    pub unassigned: Vec<UnassignedOutput>,
}

#[derive(Serialize, Debug)]
pub struct Summary {
    pub cost: u32,
    pub routes: usize,
    pub unassigned: usize,
    pub setup: u32,
    pub service: u32,
    pub duration: u32,
    pub waiting_time: u32,
    pub distance: u32,
    pub priority: u32,
    pub violations: Vec<serde_json::Value>,
    pub timed_out: bool,
    pub computing_time_ms: i64,
}

#[derive(Serialize, Debug)]
pub struct RouteOutput {
    pub vehicle: UserId,
    pub cost: u32,
    pub setup: u32,
    pub service: u32,
    pub duration: u32,
    pub waiting_time: u32,
    pub distance: u32,
    pub priority: u32,
    pub steps: Vec<StepOutput>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Serialize, Debug)]
pub struct StepOutput {
    #[serde(rename = "type")]
    pub step_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_index: Option<usize>,
    pub arrival: u32,
    /// Cumulative travel time when arriving at this step.
    pub duration: u32,
    pub setup: u32,
    pub service: u32,
    pub waiting_time: u32,
    pub load: Vec<i64>,
    pub distance: u32,
}

#[derive(Serialize, Debug)]
pub struct UnassignedOutput {
    pub id: UserId,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_index: Option<usize>,
}

/// Renders a solved state into the output document, converting every value
/// back to user units.
pub fn solution_output(problem: &Problem, solved: &Solved) -> SolutionOutput {
    let solution = &solved.solution;

    let routes: Vec<RouteOutput> = solution
        .routes()
        .iter()
        .filter(|route| route.has_jobs())
        .map(|route| route_output(problem, route))
        .collect();

    let unassigned: Vec<UnassignedOutput> = solution
        .unassigned_sorted()
        .into_iter()
        .map(|idx| {
            let job = problem.job(idx);
            UnassignedOutput {
                id: job.id(),
                kind: job.kind().as_str(),
                location: job.coordinates(),
                location_index: Some(job.location()),
            }
        })
        .collect();

    let summary = Summary {
        cost: routes.iter().map(|r| r.cost).sum(),
        routes: routes.len(),
        unassigned: unassigned.len(),
        setup: routes.iter().map(|r| r.setup).sum(),
        service: routes.iter().map(|r| r.service).sum(),
        duration: routes.iter().map(|r| r.duration).sum(),
        waiting_time: routes.iter().map(|r| r.waiting_time).sum(),
        distance: routes.iter().map(|r| r.distance).sum(),
        priority: routes.iter().map(|r| r.priority).sum(),
        violations: Vec::new(),
        timed_out: solved.timed_out,
        computing_time_ms: solved.computing_time.as_millis() as i64,
    };

    SolutionOutput {
        code: 0,
        summary,
        routes,
        unassigned,
    }
}

fn route_output(problem: &Problem, route: &Route) -> RouteOutput {
    let vehicle = problem.vehicle(route.vehicle());
    let mut steps = Vec::with_capacity(route.len() + 2);

    let mut setup_total = 0u32;
    let mut service_total = 0u32;
    let mut waiting_total = 0u32;
    let mut priority_total = 0u32;

    // Re-derive the schedule with the start shifted to absorb leading
    // waiting time.
    let mut departure = route.start_departure(problem);
    let mut location = vehicle.start();
    let mut travel = 0;
    let mut distance = 0;

    if vehicle.start().is_some() {
        steps.push(StepOutput {
            step_type: "start",
            id: None,
            location: vehicle.start_coordinates(),
            location_index: vehicle.start(),
            arrival: unscale_duration(departure),
            duration: 0,
            setup: 0,
            service: 0,
            waiting_time: 0,
            load: route.initial_load().values().to_vec(),
            distance: 0,
        });
    }

    for (position, &step) in route.steps().iter().enumerate() {
        match step {
            Step::Job(idx) => {
                let job = problem.job(idx);
                let eval = problem.eval(route.vehicle(), location, Some(job.location()));
                travel += eval.duration;
                distance += eval.distance;

                let arrival = departure + eval.duration;
                let ready = arrival + job.setup();
                let service_start = job
                    .time_windows()
                    .earliest_start(ready)
                    .expect("a stored route is feasible");
                let waiting = service_start - ready;
                let service = problem.job_service(route.vehicle(), idx);

                setup_total += unscale_duration(job.setup());
                service_total += unscale_duration(service);
                waiting_total += unscale_duration(waiting);
                priority_total += job.priority();

                steps.push(StepOutput {
                    step_type: job.kind().as_str(),
                    id: Some(job.id()),
                    location: job.coordinates(),
                    location_index: Some(job.location()),
                    arrival: unscale_duration(arrival),
                    duration: unscale_duration(travel),
                    setup: unscale_duration(job.setup()),
                    service: unscale_duration(service),
                    waiting_time: unscale_duration(waiting),
                    load: route.load_after(position).values().to_vec(),
                    distance: unscale_distance(distance),
                });

                departure = service_start + service;
                location = Some(job.location());
            }
            Step::Break(b) => {
                let pause = &vehicle.breaks()[b];
                let arrival = departure;
                let service_start = pause
                    .time_windows
                    .earliest_start(arrival)
                    .expect("a stored route is feasible");
                let waiting = service_start - arrival;

                service_total += unscale_duration(pause.service);
                waiting_total += unscale_duration(waiting);

                steps.push(StepOutput {
                    step_type: "break",
                    id: Some(pause.id),
                    location: None,
                    location_index: location,
                    arrival: unscale_duration(arrival),
                    duration: unscale_duration(travel),
                    setup: 0,
                    service: unscale_duration(pause.service),
                    waiting_time: unscale_duration(waiting),
                    load: route.load_after(position).values().to_vec(),
                    distance: unscale_distance(distance),
                });

                departure = service_start + pause.service;
            }
        }
    }

    if vehicle.end().is_some() {
        let eval = problem.eval(route.vehicle(), location, vehicle.end());
        travel += eval.duration;
        distance += eval.distance;

        steps.push(StepOutput {
            step_type: "end",
            id: None,
            location: vehicle.end_coordinates(),
            location_index: vehicle.end(),
            arrival: unscale_duration(departure + eval.duration),
            duration: unscale_duration(travel),
            setup: 0,
            service: 0,
            waiting_time: 0,
            load: route
                .load_after(route.len().saturating_sub(1))
                .values()
                .to_vec(),
            distance: unscale_distance(distance),
        });
    }

    RouteOutput {
        vehicle: vehicle.id(),
        cost: unscale_cost(route.cost(problem)),
        setup: setup_total,
        service: service_total,
        duration: unscale_duration(travel),
        waiting_time: waiting_total,
        distance: unscale_distance(distance),
        priority: priority_total,
        steps,
        description: vehicle.description().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        io::input::parse_problem,
        solver::driver::{SolveOptions, solve},
    };
    use std::sync::Arc;

    #[test]
    fn test_output_round_trip_shape() {
        let problem = Arc::new(
            parse_problem(
                r#"{
                    "jobs": [
                        {"id": 1, "location_index": 1, "service": 60},
                        {"id": 2, "location_index": 2, "service": 60}
                    ],
                    "vehicles": [{"id": 1, "start_index": 0, "end_index": 0}],
                    "matrix": [[0, 10, 20], [10, 0, 10], [20, 10, 0]]
                }"#,
            )
            .unwrap(),
        );

        let solved = solve(
            &problem,
            &SolveOptions {
                exploration_level: 1,
                threads: 1,
                timeout: None,
            },
        )
        .unwrap();

        let output = solution_output(&problem, &solved);
        assert_eq!(output.code, 0);
        assert_eq!(output.summary.unassigned, 0);
        assert_eq!(output.summary.routes, 1);
        assert_eq!(output.summary.service, 120);
        assert!(!output.summary.timed_out);

        let route = &output.routes[0];
        assert_eq!(route.steps.first().unwrap().step_type, "start");
        assert_eq!(route.steps.last().unwrap().step_type, "end");
        // 0 -> 1 -> 2 -> 0 on the line is 40s of travel.
        assert_eq!(route.duration, 40);
        assert_eq!(output.summary.cost, 40);

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"summary\""));
    }
}
