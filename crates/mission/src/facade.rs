//! Conversion of definition-file records into runtime vehicles and missions.

use thiserror::Error;
use uav_energy::EnergyError;
use uav_vehicle::VehicleError;

use crate::mission::MissionError;

/// Errors surfaced while turning definitions into runtime types.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("'{0}' not found in catalog")]
    NotFound(String),
    #[error("catalog is empty")]
    EmptyCatalog,
    #[error("wing '{0}' needs either an aspect ratio or a span")]
    MissingWingSize(String),
    #[error("segment '{0}' needs either an air speed or a Mach number")]
    MissingSpeed(String),
    #[error("segment '{segment}': invalid start time '{value}': {source}")]
    StartTime {
        segment: String,
        value: String,
        source: chrono::ParseError,
    },
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error(transparent)]
    Energy(#[from] EnergyError),
    #[error(transparent)]
    Mission(#[from] MissionError),
}

fn by_name<'a, T>(
    records: &'a [T],
    requested: Option<&str>,
    name: impl Fn(&T) -> &str,
) -> Result<&'a T, DefinitionError> {
    let first = records.first().ok_or(DefinitionError::EmptyCatalog)?;
    match requested {
        None => Ok(first),
        Some(wanted) => records
            .iter()
            .find(|r| name(r).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DefinitionError::NotFound(wanted.to_string())),
    }
}

pub mod vehicle {
    use uav_config::{
        BatteryConfig, ChemistryConfig, NetworkConfig, VehicleConfig, WingConfig, WingRoleConfig,
    };
    use uav_core::constants::SEA_LEVEL_DENSITY;
    use uav_core::units::{
        deg_to_rad, inches_to_m, km_to_m, rpm_per_volt_to_rad_s_per_volt, rpm_to_rad_s,
        wh_per_kg_to_j_per_kg,
    };
    use uav_energy::{
        Avionics, Battery, BatteryChemistry, BatteryDesign, BatteryPropeller,
        ElectronicSpeedController, Motor, Payload, Propeller, propeller_design, size_from_kv,
    };
    use uav_geometry::{Wing, WingSegment};
    use uav_vehicle::{Component, Vehicle};

    use super::{DefinitionError, by_name};

    /// Convert a `VehicleConfig` into a derived runtime `Vehicle`.
    pub fn from_config(config: &VehicleConfig) -> Result<Vehicle, DefinitionError> {
        let mut vehicle = Vehicle::new(&config.name);
        vehicle.mass_properties.takeoff = config.takeoff_mass_kg;
        vehicle.mass_properties.operating_empty = config
            .operating_empty_mass_kg
            .unwrap_or(config.takeoff_mass_kg);
        vehicle.mass_properties.max_takeoff =
            config.max_takeoff_mass_kg.unwrap_or(config.takeoff_mass_kg);
        vehicle.reference_area = config.reference_area_m2;
        vehicle.envelope.maximum_dynamic_pressure =
            0.5 * SEA_LEVEL_DENSITY * config.max_speed_m_s * config.max_speed_m_s;

        for wing in &config.wings {
            vehicle.append_component(Component::Wing(wing_from_config(wing)?))?;
        }
        if let Some(network) = &config.network {
            vehicle.append_component(Component::Network(network_from_config(network)?))?;
        }
        Ok(vehicle.derive()?)
    }

    /// Select a vehicle definition by optional name (case-insensitive),
    /// defaulting to the first entry.
    pub fn select<'a>(
        configs: &'a [VehicleConfig],
        requested: Option<&str>,
    ) -> Result<&'a VehicleConfig, DefinitionError> {
        by_name(configs, requested, |c| c.name.as_str())
    }

    fn wing_from_config(config: &WingConfig) -> Result<Wing, DefinitionError> {
        let mut wing = match config.role {
            WingRoleConfig::Main => Wing::main_wing(&config.tag),
            WingRoleConfig::HorizontalTail => Wing::horizontal_tail(&config.tag),
            WingRoleConfig::VerticalTail => Wing::vertical_tail(&config.tag),
        };
        wing.reference_area = config.area_m2;
        match (config.aspect_ratio, config.span_m) {
            (Some(ar), _) => wing.aspect_ratio = ar,
            (None, Some(span)) => wing.set_projected_span(span),
            (None, None) => return Err(DefinitionError::MissingWingSize(config.tag.clone())),
        }
        wing.sweep_quarter_chord = deg_to_rad(config.sweep_quarter_chord_deg);
        wing.taper = config.taper;
        wing.thickness_to_chord = config.thickness_to_chord;
        wing.twist_root = deg_to_rad(config.twist_root_deg);
        wing.twist_tip = deg_to_rad(config.twist_tip_deg);
        wing.dynamic_pressure_ratio = config.dynamic_pressure_ratio;
        wing.number_ribs = config.number_ribs;
        wing.number_end_ribs = config.number_end_ribs;
        wing.symmetric = config.symmetric;
        wing.vertical = config.vertical || wing.vertical;
        wing.t_tail = config.t_tail;
        wing.origin = config.origin_m;
        wing.aerodynamic_center = config.aerodynamic_center_m;
        for segment in &config.segments {
            wing.append_segment(WingSegment {
                tag: segment.tag.clone(),
                percent_span_location: segment.percent_span_location,
                twist: deg_to_rad(segment.twist_deg),
                root_chord_percent: segment.root_chord_percent,
                thickness_to_chord: segment.thickness_to_chord,
                sweep_quarter_chord: deg_to_rad(segment.sweep_quarter_chord_deg),
            });
        }
        Ok(wing)
    }

    fn battery_from_config(config: &BatteryConfig) -> Result<Battery, DefinitionError> {
        let chemistry = match config.chemistry {
            ChemistryConfig::LithiumIon => BatteryChemistry::LithiumIon,
            ChemistryConfig::LithiumPolymer => BatteryChemistry::LithiumPolymer,
        };
        let design = BatteryDesign {
            chemistry,
            ..BatteryDesign::lithium_ion(
                wh_per_kg_to_j_per_kg(config.specific_energy_wh_per_kg),
                config.max_voltage_v,
            )
        };
        Ok(design.initialize_from_mass(config.mass_kg)?)
    }

    fn network_from_config(config: &NetworkConfig) -> Result<BatteryPropeller, DefinitionError> {
        let propellers = config
            .propellers
            .iter()
            .map(|p| {
                propeller_design(Propeller {
                    number_of_blades: p.blades,
                    tip_radius: inches_to_m(p.tip_radius_inches),
                    hub_radius: inches_to_m(p.hub_radius_inches),
                    design_cl: p.design_cl,
                    design_altitude: km_to_m(p.design_altitude_km),
                    freestream_velocity: p.freestream_velocity_m_s,
                    angular_velocity: rpm_to_rad_s(p.angular_velocity_rpm),
                    design_thrust: p.design_thrust_n,
                    design_power: p.design_power_w,
                    origins: p.origins_m.clone(),
                    ..Propeller::new(&p.tag)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut motors = Vec::with_capacity(config.motors.len());
        for (index, m) in config.motors.iter().enumerate() {
            // Each motor drives the propeller at the same position.
            let driven = propellers.get(index).or(propellers.first());
            let mut motor = size_from_kv(
                Motor {
                    resistance: m.resistance_ohm,
                    no_load_current: m.no_load_current_a,
                    speed_constant: rpm_per_volt_to_rad_s_per_volt(m.speed_constant_rpm_per_v),
                    gear_ratio: m.gear_ratio,
                    gearbox_efficiency: m.gearbox_efficiency,
                    expected_current: m.expected_current_a,
                    propeller_radius: driven.map_or(0.0, |p| p.tip_radius),
                    propeller_cp: driven
                        .and_then(|p| p.design())
                        .map_or(0.0, |d| d.power_coefficient),
                    ..Motor::new(&m.tag)
                },
                config.voltage_v,
            )?;
            if let Some(mass) = m.mass_kg {
                motor.mass = mass;
            }
            motors.push(motor);
        }

        Ok(BatteryPropeller {
            number_of_propeller_engines: config.number_of_engines,
            voltage: config.voltage_v,
            identical_propellers: config.identical_propellers,
            esc: ElectronicSpeedController {
                efficiency: config.esc_efficiency,
            },
            propellers,
            propeller_motors: motors,
            payload: Payload {
                power_draw: config.payload_power_w,
                mass: config.payload_mass_kg,
            },
            avionics: Avionics {
                power_draw: config.avionics_power_w,
            },
            battery: Some(battery_from_config(&config.battery)?),
            ..BatteryPropeller::new(&config.tag)
        })
    }
}

pub mod missions {
    use chrono::NaiveDateTime;
    use log::debug;
    use uav_analyses::BoundAnalyses;
    use uav_config::{MissionConfig, SegmentConfig};
    use uav_core::units::{deg_to_rad, km_to_m, wh_to_j};

    use super::{DefinitionError, by_name};
    use crate::mission::Mission;
    use crate::segment::{BatteryCharge, CruiseProfile, Segment, SegmentExtension, SpeedTarget};

    pub const START_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Build a mission from its definition, extending every segment with the
    /// network of the configuration it flies on.
    pub fn from_config(
        config: &MissionConfig,
        analyses: &BoundAnalyses<'_>,
    ) -> Result<Mission, DefinitionError> {
        let mut mission = Mission::new(&config.name);
        for record in &config.segments {
            let mut segment = segment_from_config(record)?;
            if let Some(bound) = analyses.get(&record.configuration) {
                if let Ok(network) = bound.set.energy.network(bound.vehicle) {
                    segment = network.add_unknowns_and_residuals_to_segment(
                        segment,
                        record.initial_power_coefficient,
                    )?;
                }
            }
            mission.append_segment(segment, analyses)?;
        }
        debug!("mission '{}' built with {} segment(s)", mission.tag, mission.len());
        Ok(mission)
    }

    /// Select a mission by optional name (case-insensitive), defaulting to the first entry.
    pub fn select<'a>(
        configs: &'a [MissionConfig],
        requested: Option<&str>,
    ) -> Result<&'a MissionConfig, DefinitionError> {
        by_name(configs, requested, |c| c.name.as_str())
    }

    fn segment_from_config(record: &SegmentConfig) -> Result<Segment, DefinitionError> {
        let speed = match (record.air_speed_m_s, record.mach) {
            (Some(v), _) => SpeedTarget::AirSpeed(v),
            (None, Some(m)) => SpeedTarget::Mach(m),
            (None, None) => return Err(DefinitionError::MissingSpeed(record.tag.clone())),
        };
        let start_time = NaiveDateTime::parse_from_str(&record.start_time, START_TIME_FORMAT)
            .map_err(|source| DefinitionError::StartTime {
                segment: record.tag.clone(),
                value: record.start_time.clone(),
                source,
            })?;
        let battery = match (record.battery_energy_wh, record.battery_fraction) {
            (Some(wh), _) => Some(BatteryCharge::Absolute(wh_to_j(wh))),
            (None, Some(f)) => Some(BatteryCharge::Fraction(f)),
            (None, None) => None,
        };

        let mut segment = Segment::cruise(
            &record.tag,
            &record.configuration,
            CruiseProfile {
                speed,
                altitude: km_to_m(record.altitude_km),
                distance: km_to_m(record.distance_km),
            },
        );
        segment.control_points = record.control_points;
        segment.start_time = start_time;
        segment.latitude = deg_to_rad(record.latitude_deg);
        segment.longitude = deg_to_rad(record.longitude_deg);
        segment.battery = battery;
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::segment::{BatteryCharge, SpeedTarget};
    use approx::assert_relative_eq;
    use uav_config::{MissionConfig, SegmentConfig};

    fn segment_config(tag: &str) -> SegmentConfig {
        SegmentConfig {
            tag: tag.into(),
            configuration: "cruise".into(),
            control_points: 8,
            start_time: "2023-05-02T11:30:00".into(),
            air_speed_m_s: Some(12.0),
            mach: None,
            altitude_km: 0.12,
            distance_km: 3.0,
            latitude_deg: 47.0,
            longitude_deg: -122.0,
            battery_fraction: Some(0.9),
            battery_energy_wh: None,
            initial_power_coefficient: 0.08,
        }
    }

    #[test]
    fn mission_definitions_become_extended_segments() {
        let configs = fixtures::frozen();
        let analyses = fixtures::analyses().finalize(&configs).unwrap();
        let config = MissionConfig {
            name: "Survey".into(),
            drag_coefficient_increment: 0.0,
            segments: vec![
                segment_config("Outbound"),
                SegmentConfig {
                    battery_fraction: None,
                    ..segment_config("Return")
                },
            ],
        };

        let built = missions::from_config(&config, &analyses).unwrap();
        assert_eq!(built.len(), 2);
        let first = &built.segments()[0];
        assert_eq!(first.extended_by.as_deref(), Some("network"));
        assert_eq!(first.unknowns.len(), 3);
        assert_eq!(first.profile.speed, SpeedTarget::AirSpeed(12.0));
        assert_relative_eq!(first.profile.altitude, 120.0, epsilon = 1e-9);
        assert_relative_eq!(first.latitude, 47.0_f64.to_radians(), epsilon = 1e-12);
        assert_eq!(first.battery, Some(BatteryCharge::Fraction(0.9)));
        assert_eq!(first.start_time.to_string(), "2023-05-02 11:30:00");
        assert_eq!(built.segments()[1].battery, None);
    }

    #[test]
    fn malformed_segments_are_rejected() {
        let configs = fixtures::frozen();
        let analyses = fixtures::analyses().finalize(&configs).unwrap();
        let no_speed = MissionConfig {
            name: "Survey".into(),
            drag_coefficient_increment: 0.0,
            segments: vec![SegmentConfig {
                air_speed_m_s: None,
                ..segment_config("Cruise")
            }],
        };
        assert!(matches!(
            missions::from_config(&no_speed, &analyses),
            Err(DefinitionError::MissingSpeed(_))
        ));

        let bad_time = MissionConfig {
            segments: vec![SegmentConfig {
                start_time: "May 2nd".into(),
                ..segment_config("Cruise")
            }],
            ..no_speed
        };
        assert!(matches!(
            missions::from_config(&bad_time, &analyses),
            Err(DefinitionError::StartTime { .. })
        ));
    }

    #[test]
    fn catalog_selection_is_case_insensitive() {
        let configs = vec![
            MissionConfig {
                name: "Survey".into(),
                drag_coefficient_increment: 0.0,
                segments: Vec::new(),
            },
            MissionConfig {
                name: "Ferry".into(),
                drag_coefficient_increment: 0.0,
                segments: Vec::new(),
            },
        ];
        assert_eq!(missions::select(&configs, Some("FERRY")).unwrap().name, "Ferry");
        assert_eq!(missions::select(&configs, None).unwrap().name, "Survey");
        assert!(matches!(
            missions::select(&configs, Some("Loiter")),
            Err(DefinitionError::NotFound(_))
        ));
        assert!(matches!(
            missions::select(&[], None),
            Err(DefinitionError::EmptyCatalog)
        ));
    }

    #[test]
    fn vehicle_definitions_carry_designed_propellers() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs/vehicles/manx.yaml");
        let configs = uav_config::load_vehicle_configs(path).unwrap();
        let built = vehicle::from_config(vehicle::select(&configs, Some("manx")).unwrap()).unwrap();

        let network = built.network().unwrap();
        assert_eq!(network.propellers.len(), 1);
        let propeller = &network.propellers[0];
        assert_eq!(propeller.origins.len(), 2);
        let design = propeller.design.as_ref().unwrap();
        assert!(design.power_coefficient > 0.0);
        assert_relative_eq!(
            network.propeller_motors[0].propeller_radius,
            propeller.tip_radius,
            epsilon = 1e-12
        );
    }
}
