//! Mission segments and the contract through which a propulsion network
//! extends a segment with its own solver unknowns and residuals.

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};
use uav_energy::{BatteryPropeller, Unknown};

use crate::MissionError;

/// Speed held through a cruise segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedTarget {
    Mach(f64),
    /// True air speed (m/s).
    AirSpeed(f64),
}

impl SpeedTarget {
    pub fn air_speed(&self, speed_of_sound: f64) -> f64 {
        match *self {
            SpeedTarget::Mach(m) => m * speed_of_sound,
            SpeedTarget::AirSpeed(v) => v,
        }
    }

    fn value(&self) -> f64 {
        match *self {
            SpeedTarget::Mach(v) | SpeedTarget::AirSpeed(v) => v,
        }
    }
}

/// Constant-speed, constant-altitude cruise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CruiseProfile {
    pub speed: SpeedTarget,
    /// Geometric altitude (m).
    pub altitude: f64,
    /// Ground distance (m).
    pub distance: f64,
}

/// Battery energy at the start of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryCharge {
    /// Energy (J).
    Absolute(f64),
    /// Fraction of the pack's maximum energy.
    Fraction(f64),
}

impl BatteryCharge {
    pub fn energy(&self, max_energy: f64) -> f64 {
        match *self {
            BatteryCharge::Absolute(e) => e,
            BatteryCharge::Fraction(f) => f * max_energy,
        }
    }
}

pub const ANGLE_OF_ATTACK: &str = "angle_of_attack";
pub const THROTTLE: &str = "throttle";
pub const FORCE_X: &str = "force_x";
pub const FORCE_Z: &str = "force_z";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub tag: String,
    /// Tag of the analysis set (and configuration) flown.
    pub analyses: String,
    pub profile: CruiseProfile,
    pub control_points: usize,
    pub start_time: NaiveDateTime,
    /// Latitude (rad).
    pub latitude: f64,
    /// Longitude (rad).
    pub longitude: f64,
    /// `None` continues from the previous segment's final state.
    pub battery: Option<BatteryCharge>,
    pub unknowns: Vec<Unknown>,
    pub residuals: Vec<String>,
    /// Network that registered its unknowns with this segment.
    pub extended_by: Option<String>,
}

impl Segment {
    /// Cruise segment carrying the flight-mechanics unknowns (angle of attack
    /// and throttle) and the two force residuals.
    pub fn cruise(
        tag: impl Into<String>,
        analyses: impl Into<String>,
        profile: CruiseProfile,
    ) -> Self {
        Self {
            tag: tag.into(),
            analyses: analyses.into(),
            profile,
            control_points: 16,
            start_time: NaiveDateTime::default(),
            latitude: 0.0,
            longitude: 0.0,
            battery: None,
            unknowns: vec![
                Unknown {
                    name: ANGLE_OF_ATTACK.to_string(),
                    initial: 1.0_f64.to_radians(),
                },
                Unknown {
                    name: THROTTLE.to_string(),
                    initial: 0.5,
                },
            ],
            residuals: vec![FORCE_X.to_string(), FORCE_Z.to_string()],
            extended_by: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), MissionError> {
        let positive = [
            ("speed", self.profile.speed.value()),
            ("distance", self.profile.distance),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(MissionError::InvalidBoundary {
                    segment: self.tag.clone(),
                    field,
                    value,
                });
            }
        }
        // Sea level is a valid cruise altitude.
        if !(self.profile.altitude >= 0.0 && self.profile.altitude.is_finite()) {
            return Err(MissionError::InvalidBoundary {
                segment: self.tag.clone(),
                field: "altitude",
                value: self.profile.altitude,
            });
        }
        if self.control_points < 2 {
            return Err(MissionError::TooFewControlPoints {
                segment: self.tag.clone(),
                count: self.control_points,
            });
        }
        if let Some(BatteryCharge::Fraction(f)) = self.battery {
            if !(f > 0.0 && f <= 1.0) {
                return Err(MissionError::InvalidBoundary {
                    segment: self.tag.clone(),
                    field: "battery fraction",
                    value: f,
                });
            }
        }
        if let Some(BatteryCharge::Absolute(e)) = self.battery {
            if !(e > 0.0) {
                return Err(MissionError::InvalidBoundary {
                    segment: self.tag.clone(),
                    field: "battery energy",
                    value: e,
                });
            }
        }
        if self.unknowns.len() != self.residuals.len() {
            return Err(MissionError::UnbalancedSystem {
                segment: self.tag.clone(),
                unknowns: self.unknowns.len(),
                residuals: self.residuals.len(),
            });
        }
        Ok(())
    }
}

/// Implemented by propulsion networks that need the segment solver to iterate
/// on additional state. Returns the extended segment.
pub trait SegmentExtension {
    fn add_unknowns_and_residuals_to_segment(
        &self,
        segment: Segment,
        initial_power_coefficient: f64,
    ) -> Result<Segment, MissionError>;
}

impl SegmentExtension for BatteryPropeller {
    fn add_unknowns_and_residuals_to_segment(
        &self,
        mut segment: Segment,
        initial_power_coefficient: f64,
    ) -> Result<Segment, MissionError> {
        if let Some(previous) = &segment.extended_by {
            return Err(MissionError::AlreadyExtended {
                segment: segment.tag.clone(),
                network: previous.clone(),
            });
        }
        if !(initial_power_coefficient > 0.0) {
            return Err(MissionError::InvalidBoundary {
                segment: segment.tag.clone(),
                field: "initial power coefficient",
                value: initial_power_coefficient,
            });
        }
        let declared = self.solver_unknowns(Some(initial_power_coefficient));
        debug!(
            "network '{}' added {} unknown(s) to segment '{}'",
            self.tag,
            declared.unknowns.len(),
            segment.tag
        );
        segment.unknowns.extend(declared.unknowns);
        segment.residuals.extend(declared.residuals);
        segment.extended_by = Some(self.tag.clone());
        Ok(segment)
    }
}
