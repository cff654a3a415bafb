//! Standard atmosphere bound to a planet's features.

use serde::{Deserialize, Serialize};
use uav_core::atmosphere::us_standard_1976;

use crate::AnalysisError;
use crate::planet::{Planet, PlanetFeatures};

/// Air and gravity at one altitude.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AtmosphereConditions {
    pub altitude: f64,
    pub pressure: f64,
    pub temperature: f64,
    pub density: f64,
    pub speed_of_sound: f64,
    pub dynamic_viscosity: f64,
    pub kinematic_viscosity: f64,
    pub gravity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    pub features: PlanetFeatures,
    /// Offset from the standard temperature (K).
    pub temperature_deviation: f64,
}

impl Atmosphere {
    /// US 1976 standard atmosphere using `planet`'s radius and gravity.
    pub fn us_standard_1976(planet: &Planet) -> Self {
        Self {
            features: planet.features.clone(),
            temperature_deviation: 0.0,
        }
    }

    pub fn compute_values(&self, altitude: f64) -> Result<AtmosphereConditions, AnalysisError> {
        let state = us_standard_1976(
            altitude,
            self.temperature_deviation,
            self.features.mean_radius,
        )
        .ok_or(AnalysisError::AltitudeOutOfRange(altitude))?;
        Ok(AtmosphereConditions {
            altitude,
            pressure: state.pressure,
            temperature: state.temperature,
            density: state.density,
            speed_of_sound: state.speed_of_sound,
            dynamic_viscosity: state.dynamic_viscosity,
            kinematic_viscosity: state.kinematic_viscosity,
            gravity: self.features.gravity(altitude),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cruise_altitude_conditions() {
        let atmo = Atmosphere::us_standard_1976(&Planet::default());
        let c = atmo.compute_values(120.0).unwrap();
        assert_relative_eq!(c.temperature, 288.15 - 0.0065 * 120.0, epsilon = 0.01);
        assert!(c.density < 1.225 && c.density > 1.2);
        assert!(c.gravity < 9.80665);
    }

    #[test]
    fn out_of_range_altitude_is_an_error() {
        let atmo = Atmosphere::us_standard_1976(&Planet::default());
        assert_eq!(
            atmo.compute_values(200_000.0),
            Err(AnalysisError::AltitudeOutOfRange(200_000.0))
        );
    }

    #[test]
    fn warmer_day_is_thinner() {
        let planet = Planet::default();
        let hot = Atmosphere {
            temperature_deviation: 15.0,
            ..Atmosphere::us_standard_1976(&planet)
        };
        let std = Atmosphere::us_standard_1976(&planet);
        let (hot, std) = (hot.compute_values(0.0).unwrap(), std.compute_values(0.0).unwrap());
        assert!(hot.density < std.density);
    }
}
