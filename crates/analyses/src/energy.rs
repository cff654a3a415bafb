//! Energy analysis: binds a configuration to the propulsion network it flies on.

use serde::{Deserialize, Serialize};
use uav_energy::BatteryPropeller;
use uav_vehicle::Vehicle;

use crate::AnalysisError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    /// Network tag; the vehicle's first network when unset.
    pub network: Option<String>,
}

impl Energy {
    pub fn network<'v>(&self, vehicle: &'v Vehicle) -> Result<&'v BatteryPropeller, AnalysisError> {
        let found = match &self.network {
            Some(tag) => vehicle.networks().find(|n| &n.tag == tag),
            None => vehicle.network(),
        };
        found.ok_or_else(|| AnalysisError::MissingNetwork {
            vehicle: vehicle.tag.clone(),
            network: self.network.clone(),
        })
    }
}
