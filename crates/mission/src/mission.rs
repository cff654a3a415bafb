//! Ordered mission segments.

use log::info;
use thiserror::Error;
use uav_analyses::BoundAnalyses;

use crate::segment::{BatteryCharge, Segment};

#[derive(Debug, Error, PartialEq)]
pub enum MissionError {
    #[error("segment '{segment}': {field} out of range (got {value})")]
    InvalidBoundary {
        segment: String,
        field: &'static str,
        value: f64,
    },
    #[error("segment '{segment}' needs at least two control points (got {count})")]
    TooFewControlPoints { segment: String, count: usize },
    #[error("segment '{segment}' has {unknowns} unknown(s) but {residuals} residual(s)")]
    UnbalancedSystem {
        segment: String,
        unknowns: usize,
        residuals: usize,
    },
    #[error("segment '{segment}' was already extended by network '{network}'")]
    AlreadyExtended { segment: String, network: String },
    #[error("segment '{segment}' is bound to unknown analyses '{analyses}'")]
    UnboundAnalyses { segment: String, analyses: String },
    #[error("segment '{segment}' must be extended by network '{network}' before it is appended")]
    NotExtended { segment: String, network: String },
    #[error("first segment '{0}' must specify its initial battery charge")]
    MissingInitialCharge(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mission {
    pub tag: String,
    segments: Vec<Segment>,
}

impl Mission {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            segments: Vec::new(),
        }
    }

    /// Append `segment` after checking its boundary conditions, its analyses
    /// binding, and that the configuration's network has extended it.
    pub fn append_segment(
        &mut self,
        segment: Segment,
        analyses: &BoundAnalyses<'_>,
    ) -> Result<(), MissionError> {
        segment.validate()?;
        let bound = analyses
            .get(&segment.analyses)
            .ok_or_else(|| MissionError::UnboundAnalyses {
                segment: segment.tag.clone(),
                analyses: segment.analyses.clone(),
            })?;
        if let Ok(network) = bound.set.energy.network(bound.vehicle) {
            if segment.extended_by.as_deref() != Some(network.tag.as_str()) {
                return Err(MissionError::NotExtended {
                    segment: segment.tag.clone(),
                    network: network.tag.clone(),
                });
            }
            if let (Some(BatteryCharge::Absolute(energy)), Ok(battery)) =
                (segment.battery, network.battery())
            {
                if energy > battery.max_energy() {
                    return Err(MissionError::InvalidBoundary {
                        segment: segment.tag.clone(),
                        field: "battery energy",
                        value: energy,
                    });
                }
            }
        }
        if self.segments.is_empty() && segment.battery.is_none() {
            return Err(MissionError::MissingInitialCharge(segment.tag.clone()));
        }
        info!(
            "mission '{}': appended segment '{}' ({} control points)",
            self.tag, segment.tag, segment.control_points
        );
        self.segments.push(segment);
        Ok(())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::segment::{CruiseProfile, SegmentExtension, SpeedTarget};

    fn cruise(tag: &str) -> Segment {
        Segment::cruise(
            tag,
            "cruise",
            CruiseProfile {
                speed: SpeedTarget::AirSpeed(12.0),
                altitude: 120.0,
                distance: 3_000.0,
            },
        )
    }

    #[test]
    fn segments_must_be_extended_by_the_configuration_network() {
        let configs = fixtures::frozen();
        let analyses = fixtures::analyses().finalize(&configs).unwrap();
        let mut mission = Mission::new("survey");
        let mut segment = cruise("Cruise");
        segment.battery = Some(BatteryCharge::Fraction(1.0));

        assert!(matches!(
            mission.append_segment(segment.clone(), &analyses),
            Err(MissionError::NotExtended { .. })
        ));

        let network = configs.get("cruise").unwrap().network().unwrap();
        let extended = network
            .add_unknowns_and_residuals_to_segment(segment, 0.08)
            .unwrap();
        mission.append_segment(extended, &analyses).unwrap();
        assert_eq!(mission.len(), 1);
    }

    #[test]
    fn first_segment_needs_an_initial_charge() {
        let configs = fixtures::frozen();
        let analyses = fixtures::analyses().finalize(&configs).unwrap();
        let network = configs.get("cruise").unwrap().network().unwrap();
        let segment = network
            .add_unknowns_and_residuals_to_segment(cruise("Cruise"), 0.08)
            .unwrap();

        let mut mission = Mission::new("survey");
        assert_eq!(
            mission.append_segment(segment, &analyses),
            Err(MissionError::MissingInitialCharge("Cruise".into()))
        );
        assert!(mission.is_empty());
    }

    #[test]
    fn unknown_analyses_are_rejected() {
        let configs = fixtures::frozen();
        let analyses = fixtures::analyses().finalize(&configs).unwrap();
        let mut segment = cruise("Climb");
        segment.analyses = "climb".into();
        segment.battery = Some(BatteryCharge::Fraction(1.0));
        assert!(matches!(
            Mission::new("survey").append_segment(segment, &analyses),
            Err(MissionError::UnboundAnalyses { .. })
        ));
    }

    #[test]
    fn absolute_charge_cannot_exceed_battery_capacity() {
        let configs = fixtures::frozen();
        let analyses = fixtures::analyses().finalize(&configs).unwrap();
        let network = configs.get("cruise").unwrap().network().unwrap();
        let capacity = network.battery().unwrap().max_energy();
        let extended = |energy: f64| {
            let mut segment = cruise("Cruise");
            segment.battery = Some(BatteryCharge::Absolute(energy));
            network
                .add_unknowns_and_residuals_to_segment(segment, 0.08)
                .unwrap()
        };

        let mut mission = Mission::new("survey");
        assert_eq!(
            mission.append_segment(extended(2.0 * capacity), &analyses),
            Err(MissionError::InvalidBoundary {
                segment: "Cruise".into(),
                field: "battery energy",
                value: 2.0 * capacity,
            })
        );
        mission.append_segment(extended(capacity), &analyses).unwrap();
        assert_eq!(mission.len(), 1);
    }

    #[test]
    fn sea_level_cruise_is_accepted() {
        let configs = fixtures::frozen();
        let analyses = fixtures::analyses().finalize(&configs).unwrap();
        let network = configs.get("cruise").unwrap().network().unwrap();
        let mut segment = cruise("Cruise");
        segment.profile.altitude = 0.0;
        segment.battery = Some(BatteryCharge::Fraction(1.0));
        let extended = network
            .add_unknowns_and_residuals_to_segment(segment.clone(), 0.08)
            .unwrap();
        let mut mission = Mission::new("survey");
        mission.append_segment(extended, &analyses).unwrap();

        segment.profile.altitude = -10.0;
        let below = network
            .add_unknowns_and_residuals_to_segment(segment, 0.08)
            .unwrap();
        assert!(matches!(
            mission.append_segment(below, &analyses),
            Err(MissionError::InvalidBoundary { field: "altitude", .. })
        ));
    }
}
