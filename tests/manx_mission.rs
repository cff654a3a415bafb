use approx::assert_relative_eq;
use uav_mission_calculator::{manx, run_manx};

#[test]
fn manx_cruise_flies_thirty_two_control_points() {
    let report = run_manx().expect("manx mission");
    let results = &report.results;
    assert_eq!(results.mission, "The Test Mission");
    assert_eq!(results.segments.len(), 1);
    assert_eq!(results.control_point_count(), 32);

    let points: Vec<_> = results.points().collect();
    for point in &points {
        assert_relative_eq!(point.altitude, 120.0, epsilon = 1e-9);
        assert_relative_eq!(point.mach, 0.03, epsilon = 1e-9);
        assert!(point.air_speed > 10.0 && point.air_speed < 10.5);
        assert!(point.throttle > 0.0 && point.throttle <= 1.0);
        assert!(point.residual_norm < 1e-6);
    }
    for pair in points.windows(2) {
        assert!(pair[1].time > pair[0].time);
        assert!(pair[1].battery.energy <= pair[0].battery.energy);
    }

    let first = points[0];
    let last = points[points.len() - 1];
    assert_relative_eq!(first.time, 0.0, epsilon = 1e-12);
    assert_relative_eq!(last.time, 3_000.0 / last.air_speed, epsilon = 1e-9);
    assert_relative_eq!(last.distance, 3_000.0, epsilon = 1e-6);
    let initial = 0.3 * 1.186 * 187.18 * 3_600.0;
    assert_relative_eq!(first.battery.energy, initial, max_relative = 1e-12);
    assert!(last.battery.energy < initial);
}

#[test]
fn manx_weights_are_positive_and_below_takeoff_mass() {
    let report = run_manx().expect("manx mission");
    let breakdown = &report.breakdown;
    assert_eq!(report.vehicle, "Manx");
    assert!(breakdown.structure() > 0.0);
    assert!(breakdown.propulsion > 0.0);
    assert_relative_eq!(breakdown.battery, 1.186, epsilon = 1e-12);
    assert!(breakdown.total > 0.0 && breakdown.total < 3.23);
}

#[test]
fn manx_sizing_reflects_its_envelope_and_tails() {
    let report = run_manx().expect("manx mission");
    let sizing = &report.sizing;
    assert_relative_eq!(
        sizing.wing_loading,
        3.23 * uav_core::constants::G0 / 0.594,
        max_relative = 1e-12
    );
    assert_relative_eq!(sizing.max_equivalent_airspeed, 12.0, epsilon = 1e-9);
    assert!(sizing.horizontal_tail_volume > 0.0);
    assert!(sizing.vertical_tail_volume > 0.0);
}

#[test]
fn mission_segments_follow_append_order() {
    let (configs, analyses) = manx::full_setup().expect("setup");
    let analyses = analyses.finalize(&configs).expect("bound analyses");
    let mission = manx::mission_setup(&configs, &analyses).expect("mission");
    let tags: Vec<_> = mission.segments().iter().map(|s| s.tag.as_str()).collect();
    assert_eq!(tags, ["Cruise"]);
    assert_eq!(mission.segments()[0].extended_by.as_deref(), Some("battery_propeller"));
}
