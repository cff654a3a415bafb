//! Fixed-pitch propellers: a design step at one operating point and an
//! off-design model driven by the advance ratio.
//!
//! Thrust and power are split into an actuator-disk (induced) part and a blade
//! profile part. The thrust coefficient falls linearly with advance ratio and
//! reaches zero where the inflow angle at 75 % radius equals the blade angle.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};
use uav_core::atmosphere::{EARTH_RADIUS_M, us_standard_1976};
use uav_core::vector::Vector3;

use crate::{EnergyError, require_positive};

const BLADE_CD_MIN: f64 = 0.008;
const BLADE_CD_CL2: f64 = 0.01;
const LIFT_SLOPE: f64 = 2.0 * PI;

/// A propeller definition. `origins` lists every mounting position sharing this
/// definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Propeller {
    pub tag: String,
    pub number_of_blades: u32,
    /// Tip radius (m).
    pub tip_radius: f64,
    /// Hub radius (m).
    pub hub_radius: f64,
    pub design_cl: f64,
    /// Design altitude (m).
    pub design_altitude: f64,
    /// Design freestream velocity (m/s).
    pub freestream_velocity: f64,
    /// Design angular velocity (rad/s).
    pub angular_velocity: f64,
    /// Design thrust (N); exclusive with `design_power`.
    pub design_thrust: Option<f64>,
    /// Design shaft power (W); exclusive with `design_thrust`.
    pub design_power: Option<f64>,
    pub origins: Vec<Vector3>,
    /// Set by [`propeller_design`]; `None` until the propeller is designed.
    #[serde(skip)]
    pub design: Option<PropellerDesign>,
}

/// Operating point and coefficients fixed by [`propeller_design`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropellerDesign {
    pub density: f64,
    pub thrust: f64,
    pub power: f64,
    pub torque: f64,
    pub thrust_coefficient: f64,
    pub power_coefficient: f64,
    pub profile_power_coefficient: f64,
    pub advance_ratio: f64,
    pub zero_thrust_advance_ratio: f64,
    pub efficiency: f64,
    /// Mean blade chord (m).
    pub mean_blade_chord: f64,
    pub solidity: f64,
    pub tip_mach: f64,
}

/// Propeller state at one operating point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PropellerState {
    pub thrust: f64,
    pub torque: f64,
    pub power: f64,
    pub thrust_coefficient: f64,
    pub power_coefficient: f64,
    pub advance_ratio: f64,
    pub rpm: f64,
    pub tip_mach: f64,
    pub efficiency: f64,
}

impl Propeller {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            number_of_blades: 2,
            tip_radius: 0.1,
            hub_radius: 0.01,
            design_cl: 0.7,
            design_altitude: 0.0,
            freestream_velocity: 10.0,
            angular_velocity: 500.0,
            design_thrust: None,
            design_power: None,
            origins: vec![[0.0; 3]],
            design: None,
        }
    }

    pub fn design(&self) -> Option<&PropellerDesign> {
        self.design.as_ref()
    }

    pub fn diameter(&self) -> f64 {
        2.0 * self.tip_radius
    }

    fn disk_area(&self) -> f64 {
        PI * (self.tip_radius.powi(2) - self.hub_radius.powi(2))
    }

    /// Evaluate the propeller at freestream `velocity`, air `density`,
    /// `speed_of_sound` and shaft `angular_velocity` (rad/s).
    pub fn spin(
        &self,
        velocity: f64,
        density: f64,
        speed_of_sound: f64,
        angular_velocity: f64,
    ) -> Result<PropellerState, EnergyError> {
        let design = self
            .design
            .as_ref()
            .ok_or_else(|| EnergyError::PropellerNotDesigned(self.tag.clone()))?;
        require_positive(&self.tag, "angular velocity", angular_velocity)?;

        let d = self.diameter();
        let n = angular_velocity / (2.0 * PI);
        let j = velocity / (n * d);
        let ct = design.thrust_coefficient * (design.zero_thrust_advance_ratio - j)
            / (design.zero_thrust_advance_ratio - design.advance_ratio);
        let thrust = ct * density * n * n * d.powi(4);
        let induced = if thrust > 0.0 {
            induced_velocity(thrust, velocity, density, self.disk_area())
        } else {
            0.0
        };
        let profile = design.profile_power_coefficient * density * n.powi(3) * d.powi(5);
        let power = thrust * (velocity + induced) + profile;
        let cp = power / (density * n.powi(3) * d.powi(5));
        let tip_speed = angular_velocity * self.tip_radius;

        Ok(PropellerState {
            thrust,
            torque: power / angular_velocity,
            power,
            thrust_coefficient: ct,
            power_coefficient: cp,
            advance_ratio: j,
            rpm: uav_core::units::rad_s_to_rpm(angular_velocity),
            tip_mach: (tip_speed * tip_speed + velocity * velocity).sqrt() / speed_of_sound,
            efficiency: if power > 0.0 { thrust * velocity / power } else { 0.0 },
        })
    }
}

fn induced_velocity(thrust: f64, velocity: f64, density: f64, disk_area: f64) -> f64 {
    0.5 * (-velocity + (velocity * velocity + 2.0 * thrust / (density * disk_area)).sqrt())
}

struct DesignPoint {
    thrust: f64,
    power: f64,
    chord: f64,
    solidity: f64,
    profile_power: f64,
}

fn design_point(prop: &Propeller, density: f64, thrust: f64) -> DesignPoint {
    let r = prop.tip_radius;
    let omega = prop.angular_velocity;
    let v = prop.freestream_velocity;
    let blade_speed = 0.75 * omega * r;
    let relative_sq = v * v + blade_speed * blade_speed;
    let blade_span = r - prop.hub_radius;
    let chord = 2.0 * thrust
        / (density * relative_sq * prop.number_of_blades as f64 * blade_span * prop.design_cl);
    let solidity = prop.number_of_blades as f64 * chord / (PI * r);
    let cd = BLADE_CD_MIN + BLADE_CD_CL2 * prop.design_cl * prop.design_cl;
    let profile_power = solidity * cd / 8.0 * density * PI * r * r * (omega * r).powi(3);
    let induced = induced_velocity(thrust, v, density, prop.disk_area());
    DesignPoint {
        thrust,
        power: thrust * (v + induced) + profile_power,
        chord,
        solidity,
        profile_power,
    }
}

/// Design `prop` at its design altitude for either its design thrust or design power.
pub fn propeller_design(mut prop: Propeller) -> Result<Propeller, EnergyError> {
    for (field, value) in [
        ("tip radius", prop.tip_radius),
        ("design lift coefficient", prop.design_cl),
        ("freestream velocity", prop.freestream_velocity),
        ("angular velocity", prop.angular_velocity),
    ] {
        require_positive(&prop.tag, field, value)?;
    }
    require_positive(&prop.tag, "blade count", prop.number_of_blades as f64)?;
    require_positive(&prop.tag, "blade span", prop.tip_radius - prop.hub_radius)?;

    let atmo = us_standard_1976(prop.design_altitude, 0.0, EARTH_RADIUS_M)
        .ok_or(EnergyError::DesignAltitude(prop.design_altitude))?;
    let rho = atmo.density;

    let point = match (prop.design_thrust, prop.design_power) {
        (Some(thrust), None) => {
            require_positive(&prop.tag, "design thrust", thrust)?;
            design_point(&prop, rho, thrust)
        }
        (None, Some(power)) => {
            require_positive(&prop.tag, "design power", power)?;
            solve_thrust_for_power(&prop, rho, power)?
        }
        _ => return Err(EnergyError::DesignTarget(prop.tag.clone())),
    };

    let d = prop.diameter();
    let omega = prop.angular_velocity;
    let v = prop.freestream_velocity;
    let n = omega / (2.0 * PI);
    let advance_ratio = v / (n * d);
    let phi = (v / (0.75 * omega * prop.tip_radius)).atan();
    let blade_angle = phi + prop.design_cl / LIFT_SLOPE;

    let design = PropellerDesign {
        density: rho,
        thrust: point.thrust,
        power: point.power,
        torque: point.power / omega,
        thrust_coefficient: point.thrust / (rho * n * n * d.powi(4)),
        power_coefficient: point.power / (rho * n.powi(3) * d.powi(5)),
        profile_power_coefficient: point.profile_power / (rho * n.powi(3) * d.powi(5)),
        advance_ratio,
        zero_thrust_advance_ratio: 0.75 * PI * blade_angle.tan(),
        efficiency: point.thrust * v / point.power,
        mean_blade_chord: point.chord,
        solidity: point.solidity,
        tip_mach: ((omega * prop.tip_radius).powi(2) + v * v).sqrt() / atmo.speed_of_sound,
    };
    debug!(
        "propeller '{}' designed: thrust {:.3} N, power {:.3} W, Cp {:.4}, efficiency {:.3}",
        prop.tag, design.thrust, design.power, design.power_coefficient, design.efficiency
    );

    prop.design_thrust = Some(design.thrust);
    prop.design_power = None;
    prop.design = Some(design);
    Ok(prop)
}

fn solve_thrust_for_power(
    prop: &Propeller,
    density: f64,
    power: f64,
) -> Result<DesignPoint, EnergyError> {
    if design_point(prop, density, 0.0).power >= power {
        return Err(EnergyError::DesignConvergence(prop.tag.clone()));
    }
    let mut high = 1.0;
    while design_point(prop, density, high).power < power {
        high *= 2.0;
        if high > 1.0e7 {
            return Err(EnergyError::DesignConvergence(prop.tag.clone()));
        }
    }
    let mut low = 0.0;
    for _ in 0..200 {
        let mid = 0.5 * (low + high);
        if design_point(prop, density, mid).power < power {
            low = mid;
        } else {
            high = mid;
        }
        if (high - low) < 1e-10 * high {
            break;
        }
    }
    Ok(design_point(prop, density, 0.5 * (low + high)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uav_core::units::{inches_to_m, km_to_m, rpm_to_rad_s};

    fn apc_9x6() -> Propeller {
        Propeller {
            number_of_blades: 2,
            freestream_velocity: 12.0,
            angular_velocity: rpm_to_rad_s(5000.0),
            tip_radius: inches_to_m(4.5),
            hub_radius: inches_to_m(0.4),
            design_cl: 0.7,
            design_altitude: km_to_m(0.12),
            design_thrust: Some(2.0),
            ..Propeller::new("propeller")
        }
    }

    #[test]
    fn design_reproduces_design_thrust_on_spin() {
        let prop = propeller_design(apc_9x6()).expect("design");
        let design = prop.design().unwrap().clone();
        assert!(design.efficiency > 0.3 && design.efficiency < 1.0);
        assert!(design.zero_thrust_advance_ratio > design.advance_ratio);

        let state = prop
            .spin(12.0, design.density, 340.0, prop.angular_velocity)
            .expect("spin");
        assert_relative_eq!(state.thrust, 2.0, epsilon = 1e-9);
        assert_relative_eq!(state.power_coefficient, design.power_coefficient, epsilon = 1e-9);
        assert_relative_eq!(state.rpm, 5000.0, epsilon = 1e-9);
    }

    #[test]
    fn design_for_power_matches_thrust_design() {
        let by_thrust = propeller_design(apc_9x6()).unwrap();
        let power = by_thrust.design().unwrap().power;
        let by_power = propeller_design(Propeller {
            design_thrust: None,
            design_power: Some(power),
            ..apc_9x6()
        })
        .unwrap();
        assert_relative_eq!(by_power.design().unwrap().thrust, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn thrust_falls_with_advance_ratio() {
        let prop = propeller_design(apc_9x6()).unwrap();
        let omega = prop.angular_velocity;
        let slow = prop.spin(8.0, 1.2, 340.0, omega).unwrap();
        let fast = prop.spin(16.0, 1.2, 340.0, omega).unwrap();
        assert!(slow.thrust > fast.thrust);
    }

    #[test]
    fn requires_exactly_one_design_target() {
        let both = Propeller {
            design_power: Some(50.0),
            ..apc_9x6()
        };
        assert_eq!(
            propeller_design(both).unwrap_err(),
            EnergyError::DesignTarget("propeller".into())
        );
        let undesigned = apc_9x6();
        assert!(matches!(
            undesigned.spin(12.0, 1.2, 340.0, 500.0),
            Err(EnergyError::PropellerNotDesigned(_))
        ));
    }
}
