//! Sizing report: loadings and tail volume coefficients of a configuration.

use serde::{Deserialize, Serialize};
use uav_core::constants::{G0, SEA_LEVEL_DENSITY};
use uav_geometry::WingRole;
use uav_vehicle::Vehicle;

use crate::AnalysisError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizingReport {
    /// Weight over reference area (N/m²).
    pub wing_loading: f64,
    pub horizontal_tail_volume: f64,
    pub vertical_tail_volume: f64,
    /// Equivalent airspeed at the envelope's maximum dynamic pressure (m/s).
    pub max_equivalent_airspeed: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sizing;

impl Sizing {
    pub fn evaluate(&self, vehicle: &Vehicle) -> Result<SizingReport, AnalysisError> {
        let main = vehicle
            .main_wing()
            .ok_or_else(|| AnalysisError::UnderivedWing(format!("{} main wing", vehicle.tag)))?;
        let main_planform = main
            .planform()
            .ok_or_else(|| AnalysisError::UnderivedWing(main.tag.clone()))?;
        let main_ac = main.aerodynamic_center_from_nose()[0];
        let sref = vehicle.reference_area;

        let volume = |role: WingRole, length: f64| {
            vehicle.wing_with_role(role).map_or(0.0, |tail| {
                let arm = tail.aerodynamic_center_from_nose()[0] - main_ac;
                tail.reference_area * arm / (sref * length)
            })
        };

        Ok(SizingReport {
            wing_loading: vehicle.mass_properties.takeoff * G0 / sref,
            horizontal_tail_volume: volume(
                WingRole::HorizontalTail,
                main_planform.mean_aerodynamic_chord,
            ),
            vertical_tail_volume: volume(WingRole::VerticalTail, main_planform.span),
            max_equivalent_airspeed: (2.0 * vehicle.envelope.maximum_dynamic_pressure
                / SEA_LEVEL_DENSITY)
                .sqrt(),
        })
    }
}
