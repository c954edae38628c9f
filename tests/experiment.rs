//! Experiment plumbing: configuration files, telemetry CSVs, summaries and
//! seeding.

mod common;

use common::lateral_config;
use pomdrive::{
    analysis::TelemetrySummary,
    app::{App, ExperimentConfig},
    export::read_records,
    pipeline::{
        AgentKind, CsvTelemetryObserver, ExperimentResult, GridSearch, MetricsObserver,
        SharedObserver,
    },
    vehicle::Dynamics,
};

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lateral.json");
    let config = lateral_config(AgentKind::Planner);
    config.save(&path).unwrap();

    let loaded = ExperimentConfig::load(&path).unwrap();
    assert_eq!(loaded.name, config.name);
    assert_eq!(loaded.agent, config.agent);
    assert_eq!(loaded.seed, Some(7));
    assert_eq!(loaded.simulator.actions, config.simulator.actions);
    assert_eq!(loaded.planner.budget, config.planner.budget);
    assert!((loaded.planner.discount - config.planner.discount).abs() < 1e-12);
    assert_eq!(loaded.start.lane_width, 2.0);
    assert!(matches!(loaded.dynamics, Dynamics::LateralDrift(_)));
}

#[test]
fn test_partial_config_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.json");
    std::fs::write(&path, r#"{ "name": "short", "runs": 2, "agent": "driver_only" }"#).unwrap();

    let loaded = ExperimentConfig::load(&path).unwrap();
    assert_eq!(loaded.name, "short");
    assert_eq!(loaded.runs, 2);
    assert_eq!(loaded.agent, AgentKind::DriverOnly);
    assert_eq!(loaded.target_actions, ExperimentConfig::default().target_actions);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "runs": 0 }"#).unwrap();
    assert!(ExperimentConfig::load(&path).is_err());
}

#[test]
fn test_telemetry_csv_feeds_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("driver.csv");
    let config = lateral_config(AgentKind::DriverOnly)
        .with_runs(3)
        .with_target_actions(20);

    let result = {
        let mut runner = App::new()
            .create_runner(&config)
            .unwrap()
            .with_observer(Box::new(CsvTelemetryObserver::new(&path).unwrap()));
        runner.run().unwrap()
    };

    let records = read_records(&path).unwrap();
    assert_eq!(records.len(), 60);
    assert!(records.iter().all(|r| !r.cheat && r.driver_action == 0.0));

    let summary = TelemetrySummary::from_csv(&path).unwrap();
    assert_eq!(summary.scenario, "driver");
    assert_eq!(summary.runs, 3);
    assert_eq!(summary.terminal_runs, result.terminal_runs);
    assert!((summary.mean_reward - result.mean_reward).abs() < 1e-9);
    assert_eq!(summary.std_dev, 0.0);
}

#[test]
fn test_result_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");
    let config = lateral_config(AgentKind::Optimal).with_target_actions(10);
    let result = App::new().create_runner(&config).unwrap().run().unwrap();

    result.save(&path).unwrap();
    assert_eq!(ExperimentResult::load(&path).unwrap(), result);
}

#[test]
fn test_metrics_agree_with_result() {
    let config = lateral_config(AgentKind::Planner)
        .with_runs(2)
        .with_target_actions(10);
    let (observer, metrics) = SharedObserver::new(MetricsObserver::new());
    let result = App::new()
        .create_runner(&config)
        .unwrap()
        .with_observer(Box::new(observer))
        .run()
        .unwrap();

    let summary = metrics.lock().unwrap().summary();
    assert_eq!(summary.runs, 2);
    assert_eq!(summary.total_decisions, result.total_decisions);
    assert_eq!(summary.terminal_runs, result.terminal_runs);
    assert!((summary.mean_reward - result.mean_reward).abs() < 1e-12);
}

#[test]
fn test_small_grid_runs_every_scenario() {
    let base = lateral_config(AgentKind::Planner).with_target_actions(5);
    let grid = GridSearch::new(base)
        .with_simulations(vec![20, 40])
        .with_exploration(vec![1.5])
        .with_horizons(vec![5])
        .with_baselines(true);

    let app = App::new();
    let results: Vec<_> = grid
        .scenarios()
        .map(|config| {
            let result = app.create_runner(&config).unwrap().run().unwrap();
            (config.name, result.agent)
        })
        .collect();

    assert_eq!(
        results,
        [
            ("planner_n20_c1.5_h5".to_string(), AgentKind::Planner),
            ("planner_n40_c1.5_h5".to_string(), AgentKind::Planner),
            ("driver".to_string(), AgentKind::DriverOnly),
            ("optimal".to_string(), AgentKind::Optimal),
        ]
    );
}

#[test]
fn test_seeded_runs_replay() {
    let config = lateral_config(AgentKind::Planner).with_target_actions(15);
    let first = App::new().create_runner(&config).unwrap().run().unwrap();
    let second = App::new().create_runner(&config).unwrap().run().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_config_seed_overrides_app_default() {
    let config = lateral_config(AgentKind::Planner).with_target_actions(15);
    let plain = App::new().create_runner(&config).unwrap().run().unwrap();
    let seeded_app = App::for_testing().with_default_seed(99).build();
    let overridden = seeded_app.create_runner(&config).unwrap().run().unwrap();
    assert_eq!(plain, overridden);
}
