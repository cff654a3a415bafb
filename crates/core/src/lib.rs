//! Core units, constants, and shared primitives for the UAV Mission Calculator workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Standard gravity at Earth's surface (m/s²).
    pub const G0: f64 = 9.80665;
    /// Specific gas constant of dry air (J/(kg·K)).
    pub const R_AIR: f64 = 287.0528;
    /// Ratio of specific heats for air.
    pub const GAMMA_AIR: f64 = 1.4;
    /// Seconds per hour.
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;
    /// Joules per watt-hour.
    pub const JOULES_PER_WH: f64 = 3_600.0;
    /// Sea-level density of the standard atmosphere (kg/m³).
    pub const SEA_LEVEL_DENSITY: f64 = 1.225;
    /// Nominal lithium-ion cell voltage (V).
    pub const LI_ION_CELL_NOMINAL_VOLTAGE: f64 = 3.7;
}

/// Stateless unit conversion. Every function maps a value in the named unit
/// onto the canonical SI value (or back).
pub mod units {
    use serde::{Deserialize, Serialize};
    use std::f64::consts::PI;

    /// Units accepted by [`to_si`] and [`from_si`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Unit {
        Meter,
        Kilometer,
        Inch,
        Foot,
        SquareMeter,
        Kilogram,
        Gram,
        Degree,
        Radian,
        MeterPerSecond,
        KilometerPerHour,
        Knot,
        Rpm,
        RpmPerVolt,
        Ampere,
        Watt,
        WattHour,
        WattHourPerKilogram,
        Second,
        Minute,
        Hour,
    }

    impl Unit {
        /// Multiplicative factor from this unit to SI.
        pub const fn factor(self) -> f64 {
            match self {
                Unit::Meter | Unit::SquareMeter | Unit::Kilogram | Unit::Radian => 1.0,
                Unit::MeterPerSecond | Unit::Ampere | Unit::Watt | Unit::Second => 1.0,
                Unit::Kilometer => 1_000.0,
                Unit::Inch => 0.0254,
                Unit::Foot => 0.3048,
                Unit::Gram => 1.0e-3,
                Unit::Degree => PI / 180.0,
                Unit::KilometerPerHour => 1_000.0 / 3_600.0,
                Unit::Knot => 1_852.0 / 3_600.0,
                Unit::Rpm | Unit::RpmPerVolt => 2.0 * PI / 60.0,
                Unit::WattHour | Unit::WattHourPerKilogram => 3_600.0,
                Unit::Minute => 60.0,
                Unit::Hour => 3_600.0,
            }
        }
    }

    /// Convert `value` expressed in `unit` to its SI value.
    #[inline]
    pub fn to_si(value: f64, unit: Unit) -> f64 {
        value * unit.factor()
    }

    /// Convert an SI `value` into `unit`.
    #[inline]
    pub fn from_si(value: f64, unit: Unit) -> f64 {
        value / unit.factor()
    }

    /// Convert degrees to radians.
    #[inline]
    pub fn deg_to_rad(v: f64) -> f64 {
        to_si(v, Unit::Degree)
    }

    /// Convert radians to degrees.
    #[inline]
    pub fn rad_to_deg(v: f64) -> f64 {
        from_si(v, Unit::Degree)
    }

    /// Convert kilometres to metres.
    #[inline]
    pub fn km_to_m(v: f64) -> f64 {
        to_si(v, Unit::Kilometer)
    }

    /// Convert inches to metres.
    #[inline]
    pub fn inches_to_m(v: f64) -> f64 {
        to_si(v, Unit::Inch)
    }

    /// Convert revolutions per minute to rad/s.
    #[inline]
    pub fn rpm_to_rad_s(v: f64) -> f64 {
        to_si(v, Unit::Rpm)
    }

    /// Convert rad/s to revolutions per minute.
    #[inline]
    pub fn rad_s_to_rpm(v: f64) -> f64 {
        from_si(v, Unit::Rpm)
    }

    /// Convert a motor speed constant in rpm/V to (rad/s)/V.
    #[inline]
    pub fn rpm_per_volt_to_rad_s_per_volt(v: f64) -> f64 {
        to_si(v, Unit::RpmPerVolt)
    }

    /// Convert a specific energy in Wh/kg to J/kg.
    #[inline]
    pub fn wh_per_kg_to_j_per_kg(v: f64) -> f64 {
        to_si(v, Unit::WattHourPerKilogram)
    }

    /// Convert watt-hours to joules.
    #[inline]
    pub fn wh_to_j(v: f64) -> f64 {
        to_si(v, Unit::WattHour)
    }

    /// Convert joules to watt-hours.
    #[inline]
    pub fn j_to_wh(v: f64) -> f64 {
        from_si(v, Unit::WattHour)
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres, measured from the vehicle nose.
    pub type Vector3 = [f64; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Mirror a point about the vehicle symmetry plane (y = 0).
    #[inline]
    pub fn mirror_y(v: &Vector3) -> Vector3 {
        [v[0], -v[1], v[2]]
    }
}

/// U.S. Standard Atmosphere 1976 up to the mesopause (84.852 km geopotential).
pub mod atmosphere {
    use super::constants::{G0, GAMMA_AIR, R_AIR};
    use serde::{Deserialize, Serialize};

    /// Mean Earth radius used for the geometric-to-geopotential conversion (m).
    pub const EARTH_RADIUS_M: f64 = 6_356_766.0;
    /// Upper geopotential bound of the tabulated layers (m).
    pub const TOP_GEOPOTENTIAL_M: f64 = 84_852.0;
    const BOTTOM_GEOPOTENTIAL_M: f64 = -5_000.0;

    // (base geopotential altitude m, base temperature K, lapse K/m, base pressure Pa)
    const LAYERS: [(f64, f64, f64, f64); 7] = [
        (0.0, 288.15, -0.0065, 101_325.0),
        (11_000.0, 216.65, 0.0, 22_632.06),
        (20_000.0, 216.65, 0.001, 5_474.889),
        (32_000.0, 228.65, 0.0028, 868.0187),
        (47_000.0, 270.65, 0.0, 110.9063),
        (51_000.0, 270.65, -0.0028, 66.93887),
        (71_000.0, 214.65, -0.002, 3.956_420),
    ];

    /// Thermodynamic state of the air at one altitude.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct AtmosphereState {
        pub pressure: f64,
        pub temperature: f64,
        pub density: f64,
        pub speed_of_sound: f64,
        pub dynamic_viscosity: f64,
        pub kinematic_viscosity: f64,
    }

    /// Evaluate the standard atmosphere at a geometric altitude (m), with an
    /// optional temperature offset (K) applied at constant pressure.
    ///
    /// Returns `None` outside the tabulated range.
    pub fn us_standard_1976(
        altitude_m: f64,
        temperature_deviation: f64,
        planet_radius_m: f64,
    ) -> Option<AtmosphereState> {
        let h = planet_radius_m * altitude_m / (planet_radius_m + altitude_m);
        if !(BOTTOM_GEOPOTENTIAL_M..=TOP_GEOPOTENTIAL_M).contains(&h) {
            return None;
        }
        let (hb, tb, lapse, pb) = LAYERS
            .iter()
            .rev()
            .find(|layer| h >= layer.0)
            .copied()
            .unwrap_or(LAYERS[0]);

        let t_std = tb + lapse * (h - hb);
        let pressure = if lapse == 0.0 {
            pb * (-G0 * (h - hb) / (R_AIR * tb)).exp()
        } else {
            pb * (tb / t_std).powf(G0 / (R_AIR * lapse))
        };
        let temperature = t_std + temperature_deviation;
        let density = pressure / (R_AIR * temperature);
        let dynamic_viscosity = 1.458e-6 * temperature.powf(1.5) / (temperature + 110.4);
        Some(AtmosphereState {
            pressure,
            temperature,
            density,
            speed_of_sound: (GAMMA_AIR * R_AIR * temperature).sqrt(),
            dynamic_viscosity,
            kinematic_viscosity: dynamic_viscosity / density,
        })
    }
}

/// Numerical discretisation shared by the mission solver and exporters.
pub mod numerics {
    use std::f64::consts::PI;

    /// Cosine-spaced (Chebyshev-Gauss-Lobatto) points on `[0, 1]`, clustered at the ends.
    pub fn chebyshev_points(count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![0.0],
            n => (0..n)
                .map(|i| 0.5 * (1.0 - (PI * i as f64 / (n - 1) as f64).cos()))
                .collect(),
        }
    }

    /// Trapezoidal integral of `values` sampled at `times`.
    pub fn trapezoid(times: &[f64], values: &[f64]) -> f64 {
        times
            .windows(2)
            .zip(values.windows(2))
            .map(|(t, v)| 0.5 * (v[0] + v[1]) * (t[1] - t[0]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::numerics::*;
    use super::units::*;
    use approx::assert_relative_eq;

    #[test]
    fn conversions_are_pure_functions_of_value_and_unit() {
        assert_relative_eq!(to_si(4.5, Unit::Inch), 0.1143, epsilon = 1e-12);
        assert_relative_eq!(km_to_m(0.12), 120.0, epsilon = 1e-12);
        assert_relative_eq!(rpm_to_rad_s(5000.0), 523.598_775_598, epsilon = 1e-6);
        assert_relative_eq!(wh_per_kg_to_j_per_kg(187.18), 673_848.0, epsilon = 1e-6);
        assert_relative_eq!(from_si(to_si(-1.5, Unit::Degree), Unit::Degree), -1.5);
    }

    #[test]
    fn chebyshev_points_span_unit_interval() {
        let pts = chebyshev_points(32);
        assert_eq!(pts.len(), 32);
        assert_relative_eq!(pts[0], 0.0);
        assert_relative_eq!(pts[31], 1.0, epsilon = 1e-12);
        assert!(pts.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn standard_atmosphere_matches_reference_values() {
        use super::atmosphere::*;
        let sea = us_standard_1976(0.0, 0.0, EARTH_RADIUS_M).unwrap();
        assert_relative_eq!(sea.density, 1.225, epsilon = 1e-3);
        assert_relative_eq!(sea.speed_of_sound, 340.29, epsilon = 0.05);
        let tropopause = us_standard_1976(11_019.0, 0.0, EARTH_RADIUS_M).unwrap();
        assert_relative_eq!(tropopause.temperature, 216.65, epsilon = 0.05);
        assert_relative_eq!(tropopause.pressure, 22_632.0, epsilon = 10.0);
        assert!(us_standard_1976(120_000.0, 0.0, EARTH_RADIUS_M).is_none());
    }

    #[test]
    fn trapezoid_integrates_linear_exactly() {
        let t = [0.0, 1.0, 3.0];
        let v = [0.0, 2.0, 6.0];
        assert_relative_eq!(trapezoid(&t, &v), 9.0);
    }
}
