//! Battery-propeller network: battery → ESC → motors → propellers, with
//! avionics and payload drawing constant power from the same bus.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    Avionics, Battery, ElectronicSpeedController, EnergyError, Motor, MotorState, Payload,
    Propeller, PropellerState, require_positive,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryPropeller {
    pub tag: String,
    pub number_of_propeller_engines: u32,
    /// Nominal bus voltage (V).
    pub voltage: f64,
    /// Every engine shares the first propeller and motor definition.
    pub identical_propellers: bool,
    pub esc: ElectronicSpeedController,
    pub propellers: Vec<Propeller>,
    pub propeller_motors: Vec<Motor>,
    pub payload: Payload,
    pub avionics: Avionics,
    pub battery: Option<Battery>,
}

/// A solver unknown with its starting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unknown {
    pub name: String,
    pub initial: f64,
}

/// Unknowns and residuals the network needs a segment solver to carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkUnknowns {
    pub unknowns: Vec<Unknown>,
    pub residuals: Vec<String>,
}

/// Operating conditions handed to [`BatteryPropeller::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkInputs {
    pub velocity: f64,
    pub density: f64,
    pub speed_of_sound: f64,
    pub throttle: f64,
    /// Battery terminal voltage feeding the ESC (V).
    pub battery_voltage: f64,
    /// One power coefficient per propeller group, in declaration order.
    pub power_coefficients: Vec<f64>,
}

/// State of one propeller/motor pair, shared by `engines` mounting positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupOutputs {
    pub engines: u32,
    pub propeller: PropellerState,
    pub motor: MotorState,
    /// `(motor torque - propeller torque) / design torque`.
    pub torque_residual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkOutputs {
    /// Total thrust of all engines (N).
    pub thrust: f64,
    pub groups: Vec<GroupOutputs>,
    /// Current drawn from the battery (A).
    pub battery_current: f64,
    /// Electrical power drawn from the battery (W).
    pub power_draw: f64,
    /// Voltage applied to the motors (V).
    pub motor_voltage: f64,
}

impl NetworkOutputs {
    pub fn torque_residuals(&self) -> impl Iterator<Item = f64> + '_ {
        self.groups.iter().map(|g| g.torque_residual)
    }
}

impl BatteryPropeller {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            number_of_propeller_engines: 1,
            voltage: 0.0,
            identical_propellers: true,
            esc: ElectronicSpeedController::default(),
            propellers: Vec::new(),
            propeller_motors: Vec::new(),
            payload: Payload::default(),
            avionics: Avionics::default(),
            battery: None,
        }
    }

    pub fn battery(&self) -> Result<&Battery, EnergyError> {
        self.battery
            .as_ref()
            .ok_or_else(|| EnergyError::MissingBattery(self.tag.clone()))
    }

    /// Propeller/motor pairs with the number of engines each one drives.
    pub fn groups(&self) -> impl Iterator<Item = (&Propeller, &Motor, u32)> + '_ {
        self.propellers
            .iter()
            .zip(&self.propeller_motors)
            .map(|(p, m)| (p, m, p.origins.len() as u32))
    }

    /// Mass carried by the network: battery, motors and payload (kg).
    pub fn mass(&self) -> f64 {
        let motors: f64 = self.groups().map(|(_, m, n)| m.mass * n as f64).sum();
        let battery = self.battery.as_ref().map_or(0.0, Battery::mass);
        motors + battery + self.payload.mass
    }

    /// Check the network is complete and consistent before it is flown.
    pub fn validate(&self) -> Result<(), EnergyError> {
        self.battery()?;
        require_positive(&self.tag, "bus voltage", self.voltage)?;
        require_positive(&self.tag, "ESC efficiency", self.esc.efficiency)?;
        if self.propellers.is_empty() {
            return Err(EnergyError::NoPropellers(self.tag.clone()));
        }
        if self.propeller_motors.len() != self.propellers.len() {
            return Err(EnergyError::PropellerMotorMismatch {
                propellers: self.propellers.len(),
                motors: self.propeller_motors.len(),
            });
        }
        if self.identical_propellers && self.propellers.len() != 1 {
            return Err(EnergyError::IdenticalPropellers(self.propellers.len()));
        }
        let mounted: usize = self.propellers.iter().map(|p| p.origins.len()).sum();
        if mounted != self.number_of_propeller_engines as usize {
            return Err(EnergyError::EngineCount {
                engines: self.number_of_propeller_engines,
                mounted,
            });
        }
        for prop in &self.propellers {
            if prop.design().is_none() {
                return Err(EnergyError::PropellerNotDesigned(prop.tag.clone()));
            }
        }
        for motor in &self.propeller_motors {
            motor.validate()?;
        }
        Ok(())
    }

    /// One power coefficient unknown and one torque residual per propeller
    /// group. `initial_power_coefficient` overrides the motors' design value.
    pub fn solver_unknowns(&self, initial_power_coefficient: Option<f64>) -> NetworkUnknowns {
        let mut out = NetworkUnknowns::default();
        for (prop, motor, _) in self.groups() {
            out.unknowns.push(Unknown {
                name: format!("{}_power_coefficient", prop.tag),
                initial: initial_power_coefficient.unwrap_or(motor.propeller_cp),
            });
            out.residuals.push(format!("{}_motor_torque", prop.tag));
        }
        out
    }

    /// Evaluate every group at one operating point.
    pub fn evaluate(&self, inputs: &NetworkInputs) -> Result<NetworkOutputs, EnergyError> {
        let expected = self.propellers.len();
        if inputs.power_coefficients.len() != expected {
            return Err(EnergyError::UnknownCount {
                expected,
                got: inputs.power_coefficients.len(),
            });
        }

        let motor_voltage = self.esc.voltage_out(inputs.throttle, inputs.battery_voltage);
        let mut thrust = 0.0;
        let mut motor_current = 0.0;
        let mut groups = Vec::with_capacity(expected);

        for ((prop, motor, engines), &cp) in self.groups().zip(&inputs.power_coefficients) {
            let motor_state = motor.omega(motor_voltage, inputs.density, cp);
            let prop_state = prop.spin(
                inputs.velocity,
                inputs.density,
                inputs.speed_of_sound,
                motor_state.omega,
            )?;
            let design_torque = prop
                .design()
                .map_or(1.0, |d| d.torque)
                .max(f64::EPSILON);
            thrust += engines as f64 * prop_state.thrust;
            motor_current += engines as f64 * motor_state.current;
            groups.push(GroupOutputs {
                engines,
                propeller: prop_state,
                motor: motor_state,
                torque_residual: (motor_state.torque - prop_state.torque) / design_torque,
            });
        }

        let peripheral_power = self.avionics.power_draw + self.payload.power_draw;
        let battery_current = self.esc.current_in(inputs.throttle, motor_current)
            + peripheral_power / inputs.battery_voltage;
        let out = NetworkOutputs {
            thrust,
            groups,
            battery_current,
            power_draw: battery_current * inputs.battery_voltage,
            motor_voltage,
        };
        trace!(
            "network '{}': throttle {:.4}, thrust {:.4} N, power {:.3} W",
            self.tag,
            inputs.throttle,
            out.thrust,
            out.power_draw
        );
        Ok(out)
    }
}
