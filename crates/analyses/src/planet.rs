//! Planet features shared by the atmosphere and the mission evaluator.

use serde::{Deserialize, Serialize};
use uav_core::atmosphere::EARTH_RADIUS_M;
use uav_core::constants::G0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetFeatures {
    pub name: String,
    /// Radius used for gravity and geopotential altitude (m).
    pub mean_radius: f64,
    /// Surface gravitational acceleration (m/s²).
    pub sea_level_gravity: f64,
}

impl PlanetFeatures {
    pub fn earth() -> Self {
        Self {
            name: "Earth".to_string(),
            mean_radius: EARTH_RADIUS_M,
            sea_level_gravity: G0,
        }
    }

    /// Inverse-square gravity at a geometric altitude (m/s²).
    pub fn gravity(&self, altitude: f64) -> f64 {
        let ratio = self.mean_radius / (self.mean_radius + altitude);
        self.sea_level_gravity * ratio * ratio
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub features: PlanetFeatures,
}

impl Default for Planet {
    fn default() -> Self {
        Self {
            features: PlanetFeatures::earth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gravity_falls_with_altitude() {
        let earth = PlanetFeatures::earth();
        assert_relative_eq!(earth.gravity(0.0), G0);
        assert!(earth.gravity(10_000.0) < G0);
        assert_relative_eq!(earth.gravity(earth.mean_radius), G0 / 4.0, epsilon = 1e-12);
    }
}
