use std::sync::Arc;

use jiff::SignedDuration;

use drover_solver::{
    io::{input::parse_problem, output::solution_output},
    solver::driver::{SolveOptions, solve},
};

fn quick_options() -> SolveOptions {
    SolveOptions {
        exploration_level: 2,
        threads: 2,
        timeout: None,
    }
}

#[test]
fn two_deliveries_fit_one_vehicle() {
    let problem = Arc::new(
        parse_problem(
            r#"{
                "jobs": [
                    {"id": 1, "location_index": 1, "delivery": [4],
                     "service": 60, "time_windows": [[0, 3600]]},
                    {"id": 2, "location_index": 2, "delivery": [4],
                     "service": 60, "time_windows": [[0, 3600]]}
                ],
                "vehicles": [{"id": 1, "start_index": 0, "end_index": 0,
                              "capacity": [10]}],
                "matrix": [[0, 10, 10], [10, 0, 10], [10, 10, 0]]
            }"#,
        )
        .unwrap(),
    );

    let solved = solve(&problem, &quick_options()).unwrap();
    let output = solution_output(&problem, &solved);

    assert_eq!(output.summary.unassigned, 0);
    assert_eq!(output.summary.routes, 1);
    // Three legs of 10s each, plus two minutes of service.
    assert_eq!(output.summary.duration, 30);
    assert_eq!(output.summary.service, 120);

    let steps: Vec<&str> = output.routes[0]
        .steps
        .iter()
        .map(|s| s.step_type)
        .collect();
    assert_eq!(steps, vec!["start", "job", "job", "end"]);
}

#[test]
fn shipment_stays_on_one_vehicle_in_order() {
    let problem = Arc::new(
        parse_problem(
            r#"{
                "shipments": [{
                    "pickup": {"id": 10, "location_index": 1},
                    "delivery": {"id": 11, "location_index": 2},
                    "amount": [3]
                }],
                "vehicles": [
                    {"id": 1, "start_index": 0, "end_index": 0, "capacity": [5]},
                    {"id": 2, "start_index": 0, "end_index": 0, "capacity": [5]}
                ],
                "matrix": [[0, 10, 20], [10, 0, 10], [20, 10, 0]]
            }"#,
        )
        .unwrap(),
    );

    let solved = solve(&problem, &quick_options()).unwrap();
    let output = solution_output(&problem, &solved);

    assert_eq!(output.summary.unassigned, 0);
    // Exactly one vehicle works; the other never leaves the depot.
    assert_eq!(output.summary.routes, 1);

    let kinds: Vec<&str> = output.routes[0]
        .steps
        .iter()
        .map(|s| s.step_type)
        .collect();
    assert_eq!(kinds, vec!["start", "pickup", "delivery", "end"]);
}

#[test]
fn skill_mismatch_leaves_job_unassigned() {
    let problem = Arc::new(
        parse_problem(
            r#"{
                "jobs": [{"id": 1, "location_index": 1, "skills": [2]}],
                "vehicles": [{"id": 1, "start_index": 0, "skills": [1]}],
                "matrix": [[0, 10], [10, 0]]
            }"#,
        )
        .unwrap(),
    );

    let solved = solve(&problem, &quick_options()).unwrap();
    let output = solution_output(&problem, &solved);

    assert_eq!(output.summary.routes, 0);
    assert_eq!(output.summary.unassigned, 1);
    assert_eq!(output.unassigned[0].id, 1);
    assert_eq!(output.unassigned[0].kind, "job");
}

#[test]
fn max_tasks_drops_higher_id_on_priority_tie() {
    let problem = Arc::new(
        parse_problem(
            r#"{
                "jobs": [
                    {"id": 1, "location_index": 1},
                    {"id": 2, "location_index": 2}
                ],
                "vehicles": [{"id": 1, "start_index": 0, "end_index": 0,
                              "max_tasks": 1}],
                "matrix": [[0, 10, 10], [10, 0, 10], [10, 10, 0]]
            }"#,
        )
        .unwrap(),
    );

    let solved = solve(&problem, &quick_options()).unwrap();
    let output = solution_output(&problem, &solved);

    assert_eq!(output.summary.unassigned, 1);
    assert_eq!(output.unassigned[0].id, 2);
}

#[test]
fn priority_wins_over_id_when_capacity_is_short() {
    let problem = Arc::new(
        parse_problem(
            r#"{
                "jobs": [
                    {"id": 1, "location_index": 1, "priority": 0},
                    {"id": 2, "location_index": 2, "priority": 80}
                ],
                "vehicles": [{"id": 1, "start_index": 0, "end_index": 0,
                              "max_tasks": 1}],
                "matrix": [[0, 10, 10], [10, 0, 10], [10, 10, 0]]
            }"#,
        )
        .unwrap(),
    );

    let solved = solve(&problem, &quick_options()).unwrap();
    let output = solution_output(&problem, &solved);

    assert_eq!(output.summary.unassigned, 1);
    assert_eq!(output.unassigned[0].id, 1);
    assert_eq!(output.summary.priority, 80);
}

#[test]
fn line_instance_is_visited_in_order() {
    // Jobs on a line past the depot; the optimum sweeps out and back.
    let problem = Arc::new(
        parse_problem(
            r#"{
                "jobs": [
                    {"id": 1, "location_index": 1},
                    {"id": 2, "location_index": 2},
                    {"id": 3, "location_index": 3}
                ],
                "vehicles": [{"id": 1, "start_index": 0, "end_index": 0}],
                "matrix": [
                    [0, 1, 2, 3],
                    [1, 0, 1, 2],
                    [2, 1, 0, 1],
                    [3, 2, 1, 0]
                ]
            }"#,
        )
        .unwrap(),
    );

    let solved = solve(&problem, &quick_options()).unwrap();
    let output = solution_output(&problem, &solved);

    let visits: Vec<u64> = output.routes[0]
        .steps
        .iter()
        .filter_map(|s| (s.step_type == "job").then_some(s.id.unwrap()))
        .collect();
    // Either sweep direction is optimal on a symmetric line.
    assert!(visits == vec![1, 2, 3] || visits == vec![3, 2, 1]);
    // Out to index 3 and back: 6 time units of travel.
    assert_eq!(output.summary.duration, 6);
}

#[test]
fn determinism_is_byte_for_byte() {
    let input = r#"{
        "jobs": [
            {"id": 1, "location_index": 1, "delivery": [1]},
            {"id": 2, "location_index": 2, "delivery": [2]},
            {"id": 3, "location_index": 3, "delivery": [1]},
            {"id": 4, "location_index": 4, "delivery": [3]},
            {"id": 5, "location_index": 5, "delivery": [1]}
        ],
        "vehicles": [
            {"id": 1, "start_index": 0, "end_index": 0, "capacity": [5]},
            {"id": 2, "start_index": 0, "end_index": 0, "capacity": [5]}
        ],
        "matrix": [
            [0, 3, 5, 4, 2, 6],
            [3, 0, 2, 5, 4, 3],
            [5, 2, 0, 3, 6, 2],
            [4, 5, 3, 0, 3, 4],
            [2, 4, 6, 3, 0, 5],
            [6, 3, 2, 4, 5, 0]
        ]
    }"#;

    let render = || {
        let problem = Arc::new(parse_problem(input).unwrap());
        let solved = solve(
            &problem,
            &SolveOptions {
                exploration_level: 3,
                threads: 4,
                timeout: None,
            },
        )
        .unwrap();
        let mut output = solution_output(&problem, &solved);
        // Wall-clock timing is the one legitimately varying field.
        output.summary.computing_time_ms = 0;
        serde_json::to_string(&output).unwrap()
    };

    assert_eq!(render(), render());
}

#[test]
fn timeout_returns_flagged_best_effort() {
    // Large enough that the deadline expires before local search starts.
    let mut jobs = String::new();
    let size = 120usize;
    for i in 0..size {
        if i > 0 {
            jobs.push(',');
        }
        jobs.push_str(&format!(
            r#"{{"id": {}, "location_index": {}}}"#,
            i + 1,
            i + 1
        ));
    }

    let mut matrix_rows = Vec::with_capacity(size + 1);
    for i in 0..=size {
        let row: Vec<String> = (0..=size)
            .map(|j| (i.abs_diff(j) as u32).to_string())
            .collect();
        matrix_rows.push(format!("[{}]", row.join(",")));
    }

    let input = format!(
        r#"{{
            "jobs": [{jobs}],
            "vehicles": [{{"id": 1, "start_index": 0, "end_index": 0}}],
            "matrix": [{}]
        }}"#,
        matrix_rows.join(",")
    );

    let problem = Arc::new(parse_problem(&input).unwrap());
    let solved = solve(
        &problem,
        &SolveOptions {
            exploration_level: 0,
            threads: 1,
            timeout: Some(SignedDuration::from_millis(1)),
        },
    )
    .unwrap();

    let output = solution_output(&problem, &solved);
    assert!(output.summary.timed_out);
    // The result is still a complete, consistent solution.
    let assigned: usize = output
        .routes
        .iter()
        .map(|r| {
            r.steps
                .iter()
                .filter(|s| s.step_type == "job")
                .count()
        })
        .sum();
    assert_eq!(assigned + output.summary.unassigned, size);
}
