//! Electric propulsion network: speed controller, propellers, motors,
//! peripherals and battery, plus the battery-propeller network that ties them
//! together and declares the solver unknowns it needs from a mission segment.

pub mod battery;
pub mod motor;
pub mod network;
pub mod propeller;

pub use battery::{Battery, BatteryChemistry, BatteryDesign};
pub use motor::{Motor, MotorState, size_from_kv};
pub use network::{
    BatteryPropeller, GroupOutputs, NetworkInputs, NetworkOutputs, NetworkUnknowns, Unknown,
};
pub use propeller::{Propeller, PropellerDesign, PropellerState, propeller_design};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Electronic speed controller between the battery bus and the motors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectronicSpeedController {
    pub efficiency: f64,
}

impl ElectronicSpeedController {
    /// Voltage delivered to the motors for a throttle setting.
    pub fn voltage_out(&self, throttle: f64, bus_voltage: f64) -> f64 {
        throttle * bus_voltage
    }

    /// Current drawn from the bus for a given motor-side current.
    pub fn current_in(&self, throttle: f64, current_out: f64) -> f64 {
        throttle * current_out / self.efficiency
    }
}

impl Default for ElectronicSpeedController {
    fn default() -> Self {
        Self { efficiency: 0.95 }
    }
}

/// Mission payload drawing constant power.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Power draw (W).
    pub power_draw: f64,
    /// Mass (kg).
    pub mass: f64,
}

/// Flight electronics drawing constant power.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Avionics {
    /// Power draw (W).
    pub power_draw: f64,
}

/// Errors raised while sizing or evaluating propulsion components.
#[derive(Debug, Error, PartialEq)]
pub enum EnergyError {
    #[error("{component}: {field} must be positive (got {value})")]
    NonPositive {
        component: String,
        field: &'static str,
        value: f64,
    },
    #[error("propeller '{0}' needs exactly one of design thrust or design power")]
    DesignTarget(String),
    #[error("propeller '{0}' has not been through propeller design")]
    PropellerNotDesigned(String),
    #[error("design altitude {0} m lies outside the standard atmosphere")]
    DesignAltitude(f64),
    #[error("propeller '{0}' design did not converge on the requested power")]
    DesignConvergence(String),
    #[error("network '{0}' has no battery")]
    MissingBattery(String),
    #[error("network '{0}' has no propellers")]
    NoPropellers(String),
    #[error("network has {propellers} propeller(s) but {motors} motor(s)")]
    PropellerMotorMismatch { propellers: usize, motors: usize },
    #[error("network declares {engines} engine(s) but its propellers have {mounted} mounting position(s)")]
    EngineCount { engines: u32, mounted: usize },
    #[error("identical propellers share one definition, found {0}")]
    IdenticalPropellers(usize),
    #[error("network expects {expected} power coefficient(s), got {got}")]
    UnknownCount { expected: usize, got: usize },
}

pub(crate) fn require_positive(
    component: &str,
    field: &'static str,
    value: f64,
) -> Result<(), EnergyError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(EnergyError::NonPositive {
            component: component.to_string(),
            field,
            value,
        })
    }
}
