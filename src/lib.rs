//! Conceptual design and mission analysis for small electric UAVs.
//!
//! The workspace crates hold the models; this crate ties them into a
//! pipeline (definitions → configurations → analyses → mission → results),
//! ships the built-in Manx aircraft, and renders result charts. Keeping the
//! pipeline in a library lets the binaries and the tests share it.

pub mod manx;
pub mod plots;

use log::{debug, info};
use thiserror::Error;
use uav_analyses::{
    Analyses, AnalysisError, AnalysisSettings, BoundAnalyses, MassBreakdown, SizingReport,
};
use uav_config::{MissionConfig, VehicleConfig};
use uav_energy::EnergyError;
use uav_mission::{
    DefinitionError, EvaluateError, Mission, MissionError, Results, evaluate, missions, vehicle,
};
use uav_vehicle::{Configs, ConfigsError, FrozenConfigs, Vehicle, VehicleError};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Energy(#[from] EnergyError),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error(transparent)]
    Configs(#[from] ConfigsError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Mission(#[from] MissionError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Evaluate(#[from] EvaluateError),
    #[error("configuration '{0}' has no propulsion network")]
    NoNetwork(String),
}

/// Everything a mission run produces.
#[derive(Debug, Clone)]
pub struct Report {
    pub vehicle: String,
    pub breakdown: MassBreakdown,
    pub sizing: SizingReport,
    pub results: Results,
}

/// Weights of configuration `tag`.
pub fn weight_report(analyses: &BoundAnalyses<'_>, tag: &str) -> Result<MassBreakdown, SetupError> {
    let bound = analyses.require(tag)?;
    let breakdown = bound.set.weights.evaluate(bound.vehicle);
    debug!(
        "'{}': structure {:.3} kg, propulsion {:.3} kg, battery {:.3} kg",
        tag,
        breakdown.structure(),
        breakdown.propulsion,
        breakdown.battery
    );
    Ok(breakdown)
}

/// Loadings and tail volumes of configuration `tag`.
pub fn sizing_report(analyses: &BoundAnalyses<'_>, tag: &str) -> Result<SizingReport, SetupError> {
    let bound = analyses.require(tag)?;
    let report = bound.set.sizing.evaluate(bound.vehicle)?;
    info!(
        "'{}': wing loading {:.1} N/m², tail volumes {:.3} (h) {:.4} (v)",
        tag, report.wing_loading, report.horizontal_tail_volume, report.vertical_tail_volume
    );
    Ok(report)
}

/// Size and weigh the first configuration, then fly the mission.
pub fn fly(
    configs: &FrozenConfigs,
    analyses: &BoundAnalyses<'_>,
    mission: &Mission,
) -> Result<Report, SetupError> {
    let (tag, vehicle) = configs
        .iter()
        .next()
        .ok_or_else(|| ConfigsError::Unknown("base".to_string()))?;
    let breakdown = weight_report(analyses, tag)?;
    let sizing = sizing_report(analyses, tag)?;
    let results = evaluate(configs, analyses, mission)?;
    info!(
        "mission '{}' flown: {} control point(s), final energy {:.1} J",
        results.mission,
        results.control_point_count(),
        results.final_energy().unwrap_or(0.0)
    );
    Ok(Report {
        vehicle: vehicle.tag.clone(),
        breakdown,
        sizing,
        results,
    })
}

/// Run the built-in Manx on its test mission.
pub fn run_manx() -> Result<Report, SetupError> {
    let (configs, analyses) = manx::full_setup()?;
    let analyses = analyses.finalize(&configs)?;
    let mission = manx::mission_setup(&configs, &analyses)?;
    fly(&configs, &analyses, &mission)
}

/// Run a vehicle definition on a mission definition.
pub fn run_definitions(
    vehicle_config: &VehicleConfig,
    mission_config: &MissionConfig,
) -> Result<Report, SetupError> {
    let vehicle = vehicle::from_config(vehicle_config)?;
    run_mission(&vehicle, &vehicle_config.configurations, mission_config)
}

/// Expand `vehicle` into `configurations` and fly a mission definition on
/// them. The mission's drag coefficient increment is applied to every
/// analysis set.
pub fn run_mission<S: AsRef<str>>(
    vehicle: &Vehicle,
    configurations: &[S],
    mission_config: &MissionConfig,
) -> Result<Report, SetupError> {
    let configs = Configs::expand(vehicle, configurations)?;

    let mut settings = AnalysisSettings::default();
    settings.aerodynamics.drag_coefficient_increment = mission_config.drag_coefficient_increment;
    let analyses = Analyses::setup(&configs, &settings);

    let configs = configs.finalize()?;
    let analyses = analyses.finalize(&configs)?;
    let mission = missions::from_config(mission_config, &analyses)?;
    fly(&configs, &analyses, &mission)
}
