//! Brushed/brushless DC motor model with an optional gearbox.
//!
//! Armature current `i = (v - ω/Kv) / R`, shaft torque `Q = (i - i0) / Kv`.
//! The load is a propeller whose torque grows with `Cp ρ D⁵ ω² / (2π)³`.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};
use uav_core::units::rad_s_to_rpm;

use crate::{EnergyError, require_positive};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motor {
    pub tag: String,
    /// Winding resistance (Ω).
    pub resistance: f64,
    /// No-load current (A).
    pub no_load_current: f64,
    /// Speed constant ((rad/s)/V).
    pub speed_constant: f64,
    pub gear_ratio: f64,
    pub gearbox_efficiency: f64,
    /// Expected operating current (A).
    pub expected_current: f64,
    /// Mass (kg).
    pub mass: f64,
    /// Radius of the driven propeller (m).
    pub propeller_radius: f64,
    /// Design power coefficient of the driven propeller.
    pub propeller_cp: f64,
    /// Stall current at the bus voltage (A), set by [`size_from_kv`].
    #[serde(default)]
    pub max_current: f64,
    /// Stall torque at the bus voltage (N·m), set by [`size_from_kv`].
    #[serde(default)]
    pub max_torque: f64,
}

/// Motor operating point for one voltage and propeller load.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorState {
    /// Propeller-side angular velocity (rad/s).
    pub omega: f64,
    /// Propeller-side torque (N·m).
    pub torque: f64,
    pub current: f64,
    pub voltage: f64,
    pub efficiency: f64,
}

impl Motor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            resistance: 0.0,
            no_load_current: 0.0,
            speed_constant: 0.0,
            gear_ratio: 1.0,
            gearbox_efficiency: 1.0,
            expected_current: 0.0,
            mass: 0.0,
            propeller_radius: 0.0,
            propeller_cp: 0.0,
            max_current: 0.0,
            max_torque: 0.0,
        }
    }

    /// Torque constant (N·m/A), the inverse of the speed constant.
    pub fn torque_constant(&self) -> f64 {
        1.0 / self.speed_constant
    }

    pub fn validate(&self) -> Result<(), EnergyError> {
        for (field, value) in [
            ("resistance", self.resistance),
            ("speed constant", self.speed_constant),
            ("gear ratio", self.gear_ratio),
            ("gearbox efficiency", self.gearbox_efficiency),
            ("propeller radius", self.propeller_radius),
        ] {
            require_positive(&self.tag, field, value)?;
        }
        Ok(())
    }

    /// Steady speed when driven at `voltage` against a propeller with power
    /// coefficient `power_coefficient` in air of `density`.
    pub fn omega(&self, voltage: f64, density: f64, power_coefficient: f64) -> MotorState {
        let kv = self.speed_constant;
        let g = self.gear_ratio;
        let eta = self.gearbox_efficiency;
        let d = 2.0 * self.propeller_radius;

        // a ω² + b ω + c = 0 in propeller-side speed
        let a = power_coefficient * density * d.powi(5) / (2.0 * PI).powi(3);
        let b = eta * g * g / (kv * kv * self.resistance);
        let c = -eta * g / kv * (voltage / self.resistance - self.no_load_current);
        let disc = (b * b - 4.0 * a * c).max(0.0);
        let omega = if c < 0.0 { -2.0 * c / (b + disc.sqrt()) } else { 0.0 };

        self.state_at(voltage, omega)
    }

    /// Electrical and mechanical state at a propeller-side speed.
    pub fn state_at(&self, voltage: f64, omega: f64) -> MotorState {
        let kv = self.speed_constant;
        let motor_omega = omega * self.gear_ratio;
        let current = (voltage - motor_omega / kv) / self.resistance;
        let motor_torque = (current - self.no_load_current) / kv;
        let torque = motor_torque * self.gear_ratio * self.gearbox_efficiency;
        let electrical = voltage * current;
        let efficiency = if electrical > 0.0 {
            (torque * omega / electrical).max(0.0)
        } else {
            0.0
        };
        MotorState {
            omega,
            torque,
            current,
            voltage,
            efficiency,
        }
    }
}

/// Size `motor` from its speed constant at `bus_voltage`: stall current and
/// torque follow from the winding constants, mass from a hobby outrunner
/// correlation on Kv.
pub fn size_from_kv(mut motor: Motor, bus_voltage: f64) -> Result<Motor, EnergyError> {
    require_positive(&motor.tag, "speed constant", motor.speed_constant)?;
    require_positive(&motor.tag, "resistance", motor.resistance)?;
    require_positive(&motor.tag, "bus voltage", bus_voltage)?;
    let kv_rpm = rad_s_to_rpm(motor.speed_constant);

    motor.mass = 2.77 * kv_rpm.powf(-0.56);
    motor.max_current = bus_voltage / motor.resistance;
    motor.max_torque = (motor.max_current - motor.no_load_current) * motor.torque_constant();
    debug!(
        "motor '{}' sized from Kv {:.0} rpm/V: mass {:.4} kg, max current {:.1} A, max torque {:.3} N·m",
        motor.tag, kv_rpm, motor.mass, motor.max_current, motor.max_torque
    );
    Ok(motor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uav_core::units::rpm_per_volt_to_rad_s_per_volt;

    fn manx_motor() -> Motor {
        let motor = size_from_kv(
            Motor {
                resistance: 0.0075,
                no_load_current: 0.85,
                speed_constant: rpm_per_volt_to_rad_s_per_volt(1150.0),
                ..Motor::new("motor")
            },
            11.1,
        )
        .unwrap();
        Motor {
            propeller_radius: 0.1143,
            expected_current: 25.0,
            mass: 0.06,
            ..motor
        }
    }

    #[test]
    fn sizing_derives_stall_limits() {
        let motor = manx_motor();
        assert_relative_eq!(motor.torque_constant(), 1.0 / motor.speed_constant);
        assert_relative_eq!(motor.max_current, 11.1 / 0.0075, epsilon = 1e-9);
        assert_relative_eq!(
            motor.max_torque,
            (11.1 / 0.0075 - 0.85) * motor.torque_constant(),
            epsilon = 1e-9
        );
        let sized = size_from_kv(Motor { mass: 0.0, ..manx_motor() }, 11.1).unwrap();
        assert!(sized.mass > 0.02 && sized.mass < 0.2);
    }

    #[test]
    fn sizing_rejects_missing_resistance() {
        let err = size_from_kv(Motor::new("bare"), 11.1).unwrap_err();
        assert!(matches!(err, EnergyError::NonPositive { field: "speed constant", .. }));
    }

    #[test]
    fn omega_balances_propeller_torque() {
        let motor = manx_motor();
        let (rho, cp) = (1.21, 0.04);
        let state = motor.omega(3.5, rho, cp);
        let d: f64 = 2.0 * 0.1143;
        let load = cp * rho * d.powi(5) * state.omega.powi(2) / (2.0 * PI).powi(3);
        assert!(state.omega > 0.0);
        assert_relative_eq!(state.torque, load, epsilon = 1e-9);
        assert!(state.efficiency > 0.0 && state.efficiency < 1.0);
    }

    #[test]
    fn stalled_below_no_load_voltage() {
        let motor = manx_motor();
        let state = motor.omega(0.001, 1.2, 0.05);
        assert_eq!(state.omega, 0.0);
    }

    #[test]
    fn unloaded_speed_approaches_kv_times_voltage() {
        let motor = manx_motor();
        let state = motor.omega(5.0, 1.2, 1e-12);
        let ideal = motor.speed_constant * (5.0 - 0.85 * 0.0075);
        assert_relative_eq!(state.omega, ideal, max_relative = 1e-6);
    }
}
