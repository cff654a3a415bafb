//! Definition-file models and loaders for the UAV Mission Calculator.
//!
//! Field names carry their units (`_m`, `_deg`, `_km`, `_rpm`, `_inches`,
//! `_wh_per_kg`); conversion to SI happens when the records are turned into
//! runtime types.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vehicle definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub name: String,
    pub takeoff_mass_kg: f64,
    #[serde(default)]
    pub operating_empty_mass_kg: Option<f64>,
    #[serde(default)]
    pub max_takeoff_mass_kg: Option<f64>,
    pub reference_area_m2: f64,
    /// Speed defining the maximum dynamic pressure at sea-level density.
    pub max_speed_m_s: f64,
    #[serde(default = "default_configurations")]
    pub configurations: Vec<String>,
    pub wings: Vec<WingConfig>,
    #[serde(default)]
    pub network: Option<NetworkConfig>,
}

fn default_configurations() -> Vec<String> {
    vec!["base".to_string(), "cruise".to_string()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WingRoleConfig {
    Main,
    HorizontalTail,
    VerticalTail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WingConfig {
    pub tag: String,
    pub role: WingRoleConfig,
    pub area_m2: f64,
    /// Either the aspect ratio or the span is required.
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    #[serde(default)]
    pub span_m: Option<f64>,
    #[serde(default)]
    pub sweep_quarter_chord_deg: f64,
    #[serde(default = "one")]
    pub taper: f64,
    pub thickness_to_chord: f64,
    #[serde(default)]
    pub twist_root_deg: f64,
    #[serde(default)]
    pub twist_tip_deg: f64,
    #[serde(default = "one")]
    pub dynamic_pressure_ratio: f64,
    #[serde(default)]
    pub number_ribs: u32,
    #[serde(default)]
    pub number_end_ribs: u32,
    #[serde(default = "yes")]
    pub symmetric: bool,
    #[serde(default)]
    pub vertical: bool,
    #[serde(default)]
    pub t_tail: bool,
    #[serde(default)]
    pub origin_m: [f64; 3],
    #[serde(default)]
    pub aerodynamic_center_m: [f64; 3],
    #[serde(default)]
    pub segments: Vec<WingSegmentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WingSegmentConfig {
    pub tag: String,
    pub percent_span_location: f64,
    #[serde(default)]
    pub twist_deg: f64,
    pub root_chord_percent: f64,
    pub thickness_to_chord: f64,
    #[serde(default)]
    pub sweep_quarter_chord_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub tag: String,
    pub number_of_engines: u32,
    pub voltage_v: f64,
    #[serde(default = "yes")]
    pub identical_propellers: bool,
    pub esc_efficiency: f64,
    pub propellers: Vec<PropellerConfig>,
    pub motors: Vec<MotorConfig>,
    #[serde(default)]
    pub payload_power_w: f64,
    #[serde(default)]
    pub payload_mass_kg: f64,
    #[serde(default)]
    pub avionics_power_w: f64,
    pub battery: BatteryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropellerConfig {
    pub tag: String,
    pub blades: u32,
    pub tip_radius_inches: f64,
    pub hub_radius_inches: f64,
    pub design_cl: f64,
    pub design_altitude_km: f64,
    pub freestream_velocity_m_s: f64,
    pub angular_velocity_rpm: f64,
    #[serde(default)]
    pub design_thrust_n: Option<f64>,
    #[serde(default)]
    pub design_power_w: Option<f64>,
    pub origins_m: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorConfig {
    pub tag: String,
    pub resistance_ohm: f64,
    pub no_load_current_a: f64,
    pub speed_constant_rpm_per_v: f64,
    #[serde(default = "one")]
    pub gear_ratio: f64,
    #[serde(default = "one")]
    pub gearbox_efficiency: f64,
    #[serde(default)]
    pub expected_current_a: f64,
    /// Overrides the mass estimated from the speed constant.
    #[serde(default)]
    pub mass_kg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChemistryConfig {
    LithiumIon,
    LithiumPolymer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    pub chemistry: ChemistryConfig,
    pub mass_kg: f64,
    pub specific_energy_wh_per_kg: f64,
    pub max_voltage_v: f64,
}

/// Mission definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionConfig {
    pub name: String,
    #[serde(default)]
    pub drag_coefficient_increment: f64,
    pub segments: Vec<SegmentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub tag: String,
    /// Configuration whose analyses the segment flies on.
    pub configuration: String,
    pub control_points: usize,
    /// ISO-8601 wall-clock start, e.g. `2023-05-02T11:30:00`.
    pub start_time: String,
    #[serde(default)]
    pub air_speed_m_s: Option<f64>,
    #[serde(default)]
    pub mach: Option<f64>,
    pub altitude_km: f64,
    pub distance_km: f64,
    #[serde(default)]
    pub latitude_deg: f64,
    #[serde(default)]
    pub longitude_deg: f64,
    /// Initial charge as a fraction of the pack's maximum energy.
    #[serde(default)]
    pub battery_fraction: Option<f64>,
    /// Initial charge as an absolute energy.
    #[serde(default)]
    pub battery_energy_wh: Option<f64>,
    #[serde(default = "default_power_coefficient")]
    pub initial_power_coefficient: f64,
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

fn default_power_coefficient() -> f64 {
    0.08
}

/// Errors that can occur while loading definition files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read definition: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Load vehicle definitions from a YAML file, a TOML file, or a directory of TOML files.
pub fn load_vehicle_configs<P: AsRef<Path>>(path: P) -> Result<Vec<VehicleConfig>, ConfigError> {
    load_records(path)
}

/// Load mission definitions from a YAML file, a TOML file, or a directory of TOML files.
pub fn load_mission_configs<P: AsRef<Path>>(path: P) -> Result<Vec<MissionConfig>, ConfigError> {
    load_records(path)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MISSION_TOML: &str = r#"
name = "Survey"

[[segments]]
tag = "Cruise"
configuration = "cruise"
control_points = 16
start_time = "2023-05-02T11:30:00"
air_speed_m_s = 12.0
altitude_km = 0.12
distance_km = 3.0
battery_fraction = 0.3
"#;

    #[test]
    fn toml_mission_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.toml");
        fs::write(&path, MISSION_TOML).unwrap();

        let missions = load_mission_configs(&path).unwrap();
        assert_eq!(missions.len(), 1);
        let segment = &missions[0].segments[0];
        assert_eq!(segment.control_points, 16);
        assert_eq!(segment.mach, None);
        assert_eq!(segment.initial_power_coefficient, 0.08);
        assert_eq!(missions[0].drag_coefficient_increment, 0.0);
    }

    #[test]
    fn directory_records_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.toml"), MISSION_TOML.replace("Survey", "Second")).unwrap();
        fs::write(dir.path().join("a.toml"), MISSION_TOML).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let missions = load_mission_configs(dir.path()).unwrap();
        let names: Vec<_> = missions.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Survey", "Second"]);
    }

    #[test]
    fn yaml_vehicle_list_parses() {
        let yaml = r#"
- name: Glider
  takeoff_mass_kg: 2.0
  reference_area_m2: 0.5
  max_speed_m_s: 15.0
  wings:
    - tag: main_wing
      role: main
      area_m2: 0.5
      span_m: 2.2
      thickness_to_chord: 0.1
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.yaml");
        fs::write(&path, yaml).unwrap();

        let vehicles = load_vehicle_configs(&path).unwrap();
        assert_eq!(vehicles[0].configurations, ["base", "cruise"]);
        let wing = &vehicles[0].wings[0];
        assert_eq!(wing.role, WingRoleConfig::Main);
        assert_eq!(wing.taper, 1.0);
        assert!(wing.symmetric);
        assert!(vehicles[0].network.is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_vehicle_configs("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
