//! Weight estimation with a pluggable empty-weight correlation.
//!
//! Two correlations ship with the crate: [`HumanPowered`], a component
//! build-up for very light, high aspect ratio airframes (spar, ribs, skin,
//! tail boom), and [`UavFractions`], which splits the structure from the
//! takeoff mass by fixed fractions. Any `Fn(&Vehicle) -> MassBreakdown` can be
//! used in their place.

use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};
use uav_core::constants::G0;
use uav_geometry::{Wing, WingRole};
use uav_vehicle::Vehicle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMass {
    pub tag: String,
    pub mass: f64,
}

/// Masses by group (kg).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassBreakdown {
    pub wings: Vec<ComponentMass>,
    pub fuselage: f64,
    pub propulsion: f64,
    pub systems: f64,
    pub empty: f64,
    pub battery: f64,
    pub payload: f64,
    pub total: f64,
}

impl MassBreakdown {
    pub fn structure(&self) -> f64 {
        self.wings.iter().map(|w| w.mass).sum::<f64>() + self.fuselage
    }

    /// Recompute `empty` and `total` from the group masses.
    pub fn sum(mut self) -> Self {
        self.empty = self.structure() + self.propulsion + self.systems;
        self.total = self.empty + self.battery + self.payload;
        self
    }
}

pub trait EmptyWeightCorrelation {
    fn name(&self) -> &str {
        "custom"
    }

    fn empty(&self, vehicle: &Vehicle) -> MassBreakdown;
}

impl<F> EmptyWeightCorrelation for F
where
    F: Fn(&Vehicle) -> MassBreakdown,
{
    fn empty(&self, vehicle: &Vehicle) -> MassBreakdown {
        self(vehicle)
    }
}

const RIB_AREAL_DENSITY: f64 = 0.25;
const END_RIB_FACTOR: f64 = 3.0;
const SKIN_AREAL_DENSITY: f64 = 0.03;
const LEADING_EDGE_AREAL_DENSITY: f64 = 0.08;
const SPAR_LINEAR_DENSITY: f64 = 0.04;
const SPAR_BENDING_COEFFICIENT: f64 = 5.0e-7;
const TRAILING_EDGE_LINEAR_DENSITY: f64 = 0.01;
const BOOM_LINEAR_DENSITY: f64 = 0.03;
const POD_MASS: f64 = 0.1;
const PROPELLER_MASS: f64 = 0.015;
const AVIONICS_MASS: f64 = 0.05;

/// Component build-up for light sailplane-like airframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanPowered {
    pub ultimate_load_factor: f64,
}

impl Default for HumanPowered {
    fn default() -> Self {
        Self {
            ultimate_load_factor: 3.5,
        }
    }
}

impl HumanPowered {
    fn wing_mass(&self, wing: &Wing, weight: f64) -> f64 {
        let Some(planform) = wing.planform() else {
            return 0.0;
        };
        let span = planform.span;
        let chord = planform.mean_geometric_chord;
        let depth = (planform.chord_root * planform.thickness_to_chord).max(1e-4);
        let carried = match wing.role {
            WingRole::Main => weight,
            WingRole::HorizontalTail | WingRole::VerticalTail => 0.1 * weight,
        };

        let rib = RIB_AREAL_DENSITY * 0.7 * chord * chord * planform.thickness_to_chord;
        let ribs = rib * (wing.number_ribs as f64 + END_RIB_FACTOR * wing.number_end_ribs as f64);
        let skin = SKIN_AREAL_DENSITY * planform.wetted_area;
        let leading_edge = LEADING_EDGE_AREAL_DENSITY * 0.3 * planform.wetted_area;
        let spar = span
            * (SPAR_LINEAR_DENSITY
                + SPAR_BENDING_COEFFICIENT * self.ultimate_load_factor * carried * span / depth);
        let trailing_edge = TRAILING_EDGE_LINEAR_DENSITY * span;
        ribs + skin + leading_edge + spar + trailing_edge
    }
}

impl EmptyWeightCorrelation for HumanPowered {
    fn name(&self) -> &str {
        "human_powered"
    }

    fn empty(&self, vehicle: &Vehicle) -> MassBreakdown {
        let weight = vehicle.mass_properties.takeoff * G0;
        let wings = vehicle
            .wings()
            .map(|w| ComponentMass {
                tag: w.tag.clone(),
                mass: self.wing_mass(w, weight),
            })
            .collect();
        let boom = vehicle
            .wing_with_role(WingRole::HorizontalTail)
            .map_or(0.0, |w| w.origin[0]);
        breakdown_with_network(
            vehicle,
            MassBreakdown {
                wings,
                fuselage: POD_MASS + BOOM_LINEAR_DENSITY * boom,
                ..MassBreakdown::default()
            },
        )
    }
}

/// Structure as fixed fractions of takeoff mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UavFractions {
    pub wing_fraction: f64,
    pub tail_fraction: f64,
    pub fuselage_fraction: f64,
}

impl Default for UavFractions {
    fn default() -> Self {
        Self {
            wing_fraction: 0.12,
            tail_fraction: 0.02,
            fuselage_fraction: 0.08,
        }
    }
}

impl EmptyWeightCorrelation for UavFractions {
    fn name(&self) -> &str {
        "uav_fractions"
    }

    fn empty(&self, vehicle: &Vehicle) -> MassBreakdown {
        let takeoff = vehicle.mass_properties.takeoff;
        let wings = vehicle
            .wings()
            .map(|w| ComponentMass {
                tag: w.tag.clone(),
                mass: match w.role {
                    WingRole::Main => self.wing_fraction,
                    WingRole::HorizontalTail | WingRole::VerticalTail => self.tail_fraction,
                } * takeoff,
            })
            .collect();
        breakdown_with_network(
            vehicle,
            MassBreakdown {
                wings,
                fuselage: self.fuselage_fraction * takeoff,
                ..MassBreakdown::default()
            },
        )
    }
}

/// Fill propulsion, systems, battery and payload from the first network.
fn breakdown_with_network(vehicle: &Vehicle, partial: MassBreakdown) -> MassBreakdown {
    let mut out = partial;
    out.systems = AVIONICS_MASS;
    if let Some(network) = vehicle.network() {
        out.propulsion = network
            .groups()
            .map(|(_, motor, engines)| engines as f64 * (motor.mass + PROPELLER_MASS))
            .sum();
        out.battery = network.battery.as_ref().map_or(0.0, |b| b.mass());
        out.payload = network.payload.mass;
    }
    out.sum()
}

/// Selection of a built-in correlation, for settings and definition files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyWeightMethod {
    #[default]
    HumanPowered,
    UavFractions,
}

pub struct Weights {
    correlation: Box<dyn EmptyWeightCorrelation>,
}

impl fmt::Debug for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weights")
            .field("correlation", &self.correlation.name())
            .finish()
    }
}

impl Weights {
    pub fn new(method: EmptyWeightMethod) -> Self {
        match method {
            EmptyWeightMethod::HumanPowered => Self::with_correlation(HumanPowered::default()),
            EmptyWeightMethod::UavFractions => Self::with_correlation(UavFractions::default()),
        }
    }

    pub fn with_correlation(correlation: impl EmptyWeightCorrelation + 'static) -> Self {
        Self {
            correlation: Box::new(correlation),
        }
    }

    pub fn correlation_name(&self) -> &str {
        self.correlation.name()
    }

    pub fn evaluate(&self, vehicle: &Vehicle) -> MassBreakdown {
        let breakdown = self.correlation.empty(vehicle);
        info!(
            "vehicle '{}' weights ({}): empty {:.3} kg, total {:.3} kg of {:.3} kg takeoff",
            vehicle.tag,
            self.correlation.name(),
            breakdown.empty,
            breakdown.total,
            vehicle.mass_properties.takeoff
        );
        breakdown
    }
}
