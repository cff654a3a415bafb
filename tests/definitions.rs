use std::fs;

use approx::assert_relative_eq;
use uav_config::{load_mission_configs, load_vehicle_configs};
use uav_mission::{DefinitionError, missions, vehicle};
use uav_mission_calculator::{SetupError, manx, run_definitions, run_manx, run_mission};

#[test]
fn shipped_vehicle_definition_matches_the_builtin_manx() {
    let configs = load_vehicle_configs("configs/vehicles/manx.yaml").expect("vehicle yaml");
    let from_file = vehicle::from_config(vehicle::select(&configs, Some("manx")).unwrap()).unwrap();
    let builtin = manx::vehicle_setup().unwrap().derive().unwrap();
    assert_eq!(from_file, builtin);
}

#[test]
fn shipped_definitions_reproduce_the_builtin_run() {
    let vehicles = load_vehicle_configs("configs/vehicles/manx.yaml").unwrap();
    let missions_yaml = load_mission_configs("configs/missions/test_mission.yaml").unwrap();
    let report = run_definitions(&vehicles[0], &missions_yaml[0]).expect("definition run");
    let builtin = run_manx().unwrap();

    assert_eq!(report.results.control_point_count(), 32);
    assert_relative_eq!(
        report.results.final_energy().unwrap(),
        builtin.results.final_energy().unwrap(),
        max_relative = 1e-9
    );
}

#[test]
fn later_segments_continue_the_battery_state() {
    let survey = load_mission_configs("configs/missions/survey.toml").unwrap();
    let vehicle = manx::vehicle_setup().unwrap();
    let report = run_mission(&vehicle, &manx::CONFIGURATIONS, &survey[0]).expect("survey run");

    let segments = &report.results.segments;
    assert_eq!(segments.len(), 2);
    let outbound_end = segments[0].points.last().unwrap();
    let return_start = &segments[1].points[0];
    assert_relative_eq!(
        return_start.battery.energy,
        outbound_end.battery.energy,
        max_relative = 1e-12
    );
    assert_relative_eq!(return_start.time, outbound_end.time, epsilon = 1e-9);
    assert_relative_eq!(segments[1].points.last().unwrap().distance, 4_000.0, epsilon = 1e-6);
    assert!(return_start.drag.increment > 0.0);
}

#[test]
fn unknown_configuration_is_rejected_before_flight() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loiter.toml");
    fs::write(
        &path,
        r#"
name = "Loiter"

[[segments]]
tag = "Hold"
configuration = "landing"
control_points = 8
start_time = "2023-05-02T11:30:00"
air_speed_m_s = 10.0
altitude_km = 0.1
distance_km = 1.0
battery_fraction = 0.5
"#,
    )
    .unwrap();
    let loiter = load_mission_configs(&path).unwrap();
    let vehicle = manx::vehicle_setup().unwrap();
    let err = run_mission(&vehicle, &manx::CONFIGURATIONS, &loiter[0]).unwrap_err();
    assert!(matches!(err, SetupError::Definition(DefinitionError::Mission(_))));
}

#[test]
fn missing_mission_name_is_reported() {
    let configs = load_mission_configs("configs/missions/test_mission.yaml").unwrap();
    assert!(matches!(
        missions::select(&configs, Some("Ferry")),
        Err(DefinitionError::NotFound(_))
    ));
}
