//! The Manx example aircraft: a 3.23 kg, 3 m span electric sailplane with two
//! tractor propellers on the wing, and its 3 km survey cruise.

use chrono::NaiveDate;
use uav_analyses::{Analyses, AnalysisSettings, BoundAnalyses};
use uav_core::units::{
    deg_to_rad, inches_to_m, km_to_m, rpm_per_volt_to_rad_s_per_volt, rpm_to_rad_s,
    wh_per_kg_to_j_per_kg,
};
use uav_energy::{
    Avionics, BatteryDesign, BatteryPropeller, ElectronicSpeedController, Motor, Payload,
    Propeller, propeller_design, size_from_kv,
};
use uav_geometry::{Wing, WingSegment};
use uav_mission::{
    BatteryCharge, CruiseProfile, Mission, Segment, SegmentExtension, SpeedTarget,
};
use uav_vehicle::{Component, Configs, FrozenConfigs, Vehicle};

use crate::SetupError;

pub const CONFIGURATIONS: [&str; 2] = ["base", "cruise"];

const BUS_VOLTAGE: f64 = 11.1;

/// Build the Manx. Wings are appended raw and derived when the
/// configurations are finalized.
pub fn vehicle_setup() -> Result<Vehicle, SetupError> {
    let mut vehicle = Vehicle::new("Manx");
    vehicle.mass_properties.takeoff = 3.23;
    vehicle.mass_properties.operating_empty = 3.23;
    vehicle.mass_properties.max_takeoff = 3.23;
    vehicle.reference_area = 0.594;
    vehicle.envelope.maximum_dynamic_pressure = 0.5 * 1.225 * 12.0_f64.powi(2);

    vehicle.append_component(Component::Wing(main_wing(vehicle.reference_area)))?;
    vehicle.append_component(Component::Wing(horizontal_stabilizer()))?;
    vehicle.append_component(Component::Wing(vertical_stabilizer()))?;
    vehicle.append_component(Component::Network(network()?))?;
    Ok(vehicle)
}

fn main_wing(reference_area: f64) -> Wing {
    let mut wing = Wing::main_wing("main_wing");
    wing.reference_area = reference_area;
    wing.set_projected_span(3.0);
    wing.sweep_quarter_chord = 0.0;
    wing.thickness_to_chord = 0.014;
    wing.taper = 0.48;
    wing.dynamic_pressure_ratio = 1.0;
    wing.twist_root = 0.0;
    wing.twist_tip = deg_to_rad(-1.5);
    wing.number_ribs = 32;
    wing.number_end_ribs = 2;
    wing.origin = [0.12, 0.0, 0.0];
    wing.aerodynamic_center = [0.075, 0.0, 0.0];

    // (tag, span fraction, twist deg, chord fraction, t/c)
    let stations = [
        ("Root", 0.0, 1.5, 1.0, 0.014),
        ("Break1", 0.083, 0.0, 1.0, 0.014),
        ("Break2", 0.43, 0.0, 0.94, 0.015),
        ("Break3", 0.8, 0.0, 0.65, 0.021),
        ("Tip", 1.0, -1.5, 0.48, 0.029),
    ];
    for (tag, eta, twist, chord, tc) in stations {
        wing.append_segment(WingSegment {
            twist: deg_to_rad(twist),
            root_chord_percent: chord,
            thickness_to_chord: tc,
            ..WingSegment::new(tag, eta)
        });
    }
    wing
}

fn horizontal_stabilizer() -> Wing {
    let mut wing = Wing::horizontal_tail("horizontal_stabilizer");
    wing.reference_area = 0.095;
    wing.aspect_ratio = 4.87;
    wing.thickness_to_chord = 0.027;
    wing.taper = 1.0;
    wing.dynamic_pressure_ratio = 0.9;
    wing.number_ribs = 11;
    wing.origin = [1.6, 0.0, 0.02];
    wing.aerodynamic_center = [0.05, 0.0, 0.0];
    wing
}

fn vertical_stabilizer() -> Wing {
    let mut wing = Wing::vertical_tail("vertical_stabilizer");
    wing.reference_area = 0.032;
    wing.aspect_ratio = 1.458;
    wing.thickness_to_chord = 0.038;
    wing.taper = 1.0;
    wing.dynamic_pressure_ratio = 1.0;
    wing.number_ribs = 7;
    wing.origin = [1.45, 0.01, 0.0];
    wing.aerodynamic_center = [0.0325, 0.0, 0.0];
    wing
}

/// Two identical 9 in propellers share one definition, which carries both
/// mounting positions.
fn network() -> Result<BatteryPropeller, SetupError> {
    let prop = propeller_design(Propeller {
        number_of_blades: 2,
        freestream_velocity: 12.0,
        angular_velocity: rpm_to_rad_s(5000.0),
        tip_radius: inches_to_m(4.5),
        hub_radius: inches_to_m(0.4),
        design_cl: 0.7,
        design_altitude: km_to_m(0.12),
        design_thrust: Some(2.0),
        design_power: None,
        origins: vec![[0.12, 0.45, 0.0], [0.12, -0.45, 0.0]],
        ..Propeller::new("propeller")
    })?;

    let sized = size_from_kv(
        Motor {
            resistance: 0.0075,
            no_load_current: 0.85,
            speed_constant: rpm_per_volt_to_rad_s_per_volt(1150.0),
            ..Motor::new("motor")
        },
        BUS_VOLTAGE,
    )?;
    let motor = Motor {
        propeller_radius: prop.tip_radius,
        propeller_cp: prop.design().map_or(0.0, |d| d.power_coefficient),
        gear_ratio: 1.0,
        gearbox_efficiency: 1.0,
        expected_current: 25.0,
        mass: 0.06,
        ..sized
    };

    let battery = BatteryDesign::lithium_ion(wh_per_kg_to_j_per_kg(187.18), BUS_VOLTAGE)
        .initialize_from_mass(1.186)?;

    Ok(BatteryPropeller {
        number_of_propeller_engines: 2,
        voltage: BUS_VOLTAGE,
        identical_propellers: true,
        esc: ElectronicSpeedController { efficiency: 0.95 },
        propellers: vec![prop],
        propeller_motors: vec![motor],
        payload: Payload {
            power_draw: 0.0,
            mass: 0.0,
        },
        avionics: Avionics { power_draw: 1.0 },
        battery: Some(battery),
        ..BatteryPropeller::new("battery_propeller")
    })
}

/// `base` and an identical `cruise` configuration.
pub fn configs_setup(vehicle: &Vehicle) -> Result<Configs, SetupError> {
    Ok(Configs::expand(vehicle, &CONFIGURATIONS)?)
}

pub fn analyses_setup(configs: &Configs) -> Analyses {
    Analyses::setup(configs, &AnalysisSettings::default())
}

/// Configurations and unbound analyses; bind them with
/// [`Analyses::finalize`] before building the mission.
pub fn full_setup() -> Result<(FrozenConfigs, Analyses), SetupError> {
    let vehicle = vehicle_setup()?;
    let configs = configs_setup(&vehicle)?;
    let analyses = analyses_setup(&configs);
    Ok((configs.finalize()?, analyses))
}

/// One 32-point cruise at 12 m/s and 120 m over 3 km, starting from 30 % charge.
pub fn mission_setup(
    configs: &FrozenConfigs,
    analyses: &BoundAnalyses<'_>,
) -> Result<Mission, SetupError> {
    let mut mission = Mission::new("The Test Mission");

    let mut segment = Segment::cruise(
        "Cruise",
        "cruise",
        CruiseProfile {
            speed: SpeedTarget::Mach(0.03),
            altitude: km_to_m(0.12),
            distance: km_to_m(3.0),
        },
    );
    segment.control_points = 32;
    segment.start_time = NaiveDate::from_ymd_opt(2023, 5, 2)
        .and_then(|d| d.and_hms_opt(11, 30, 0))
        .unwrap_or_default();
    segment.latitude = deg_to_rad(51.0);
    segment.longitude = 0.0;
    segment.battery = Some(BatteryCharge::Fraction(0.3));

    let network = configs
        .require("cruise")?
        .network()
        .ok_or_else(|| SetupError::NoNetwork("cruise".to_string()))?;
    let segment = network.add_unknowns_and_residuals_to_segment(segment, 0.08)?;
    mission.append_segment(segment, analyses)?;
    Ok(mission)
}
