//! Mission evaluator.
//!
//! Each segment is discretised on cosine-spaced control points. At every point
//! the segment unknowns (angle of attack, throttle, one power coefficient per
//! propeller group) are found with a damped Newton iteration on a
//! finite-difference Jacobian so that the horizontal and vertical forces and
//! each motor/propeller torque pair balance. Battery energy and cell charge are
//! integrated between points with the trapezoidal rule.

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use thiserror::Error;
use uav_analyses::{
    AeroConditions, AeroResult, AnalysisError, AnalysisSet, AtmosphereConditions, BoundAnalyses,
    DragBreakdown,
};
use uav_core::numerics::chebyshev_points;
use uav_energy::{
    BatteryPropeller, EnergyError, MotorState, NetworkInputs, NetworkOutputs, PropellerState,
};
use uav_vehicle::{ConfigsError, FrozenConfigs, Vehicle};

use crate::mission::Mission;
use crate::segment::{ANGLE_OF_ATTACK, Segment, THROTTLE};

const TOLERANCE: f64 = 1e-8;
const MAX_ITERATIONS: usize = 50;
const FD_STEP: f64 = 1e-7;
const MIN_DAMPING: f64 = 1.0 / 64.0;

#[derive(Debug, Error, PartialEq)]
pub enum EvaluateError {
    #[error(transparent)]
    Configs(#[from] ConfigsError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Energy(#[from] EnergyError),
    #[error("segment '{segment}': no convergence at control point {point} (residual {residual:e})")]
    NotConverged {
        segment: String,
        point: usize,
        residual: f64,
    },
    #[error("segment '{segment}': singular Jacobian at control point {point}")]
    SingularJacobian { segment: String, point: usize },
    #[error("segment '{segment}': battery depleted at t = {time:.1} s")]
    BatteryDepleted { segment: String, time: f64 },
    #[error("segment '{0}' has no initial battery charge")]
    MissingInitialCharge(String),
    #[error("segment '{segment}': unknowns {unknowns:?} do not match network '{network}'")]
    UnknownLayout {
        segment: String,
        network: String,
        unknowns: Vec<String>,
    },
}

/// Battery pack and cell state at one control point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BatteryState {
    /// Remaining energy (J).
    pub energy: f64,
    pub state_of_charge: f64,
    pub voltage_open_circuit: f64,
    pub voltage_under_load: f64,
    /// Pack current (A).
    pub current: f64,
    /// Pack power draw (W).
    pub power_draw: f64,
    pub cell_voltage: f64,
    pub cell_current: f64,
    /// Charge drawn from each cell since the segment start (Ah).
    pub cell_charge_throughput: f64,
}

/// One propeller/motor pair and the engines it stands for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropulsorState {
    pub tag: String,
    pub engines: u32,
    pub propeller: PropellerState,
    pub motor: MotorState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPointState {
    /// Time since mission start (s).
    pub time: f64,
    /// Distance since mission start (m).
    pub distance: f64,
    pub altitude: f64,
    pub air_speed: f64,
    pub mach: f64,
    pub atmosphere: AtmosphereConditions,
    /// Angle of attack (rad).
    pub angle_of_attack: f64,
    pub lift_coefficient: f64,
    pub drag: DragBreakdown,
    /// Lift force (N).
    pub lift: f64,
    /// Drag force (N).
    pub drag_force: f64,
    /// Total thrust (N).
    pub thrust: f64,
    pub throttle: f64,
    pub battery: BatteryState,
    pub propulsors: Vec<PropulsorState>,
    /// Largest scaled residual at convergence.
    pub residual_norm: f64,
    pub iterations: usize,
}

impl ControlPointState {
    pub fn lift_to_drag(&self) -> f64 {
        self.lift_coefficient / self.drag.total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentResults {
    pub tag: String,
    pub start_time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub points: Vec<ControlPointState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Results {
    pub mission: String,
    pub segments: Vec<SegmentResults>,
}

impl Results {
    pub fn points(&self) -> impl Iterator<Item = &ControlPointState> + '_ {
        self.segments.iter().flat_map(|s| s.points.iter())
    }

    pub fn control_point_count(&self) -> usize {
        self.segments.iter().map(|s| s.points.len()).sum()
    }

    /// Battery energy at the last control point (J).
    pub fn final_energy(&self) -> Option<f64> {
        self.points().last().map(|p| p.battery.energy)
    }
}

/// Operating point of one control point; `bus_voltage` is held fixed while
/// the unknowns are solved.
struct PointProblem<'a> {
    vehicle: &'a Vehicle,
    set: &'a AnalysisSet,
    network: &'a BatteryPropeller,
    atmosphere: AtmosphereConditions,
    velocity: f64,
    weight: f64,
    bus_voltage: f64,
}

struct PointSolution {
    x: Vec<f64>,
    aero: AeroResult,
    network: NetworkOutputs,
    residual_norm: f64,
    iterations: usize,
}

impl PointProblem<'_> {
    fn mach(&self) -> f64 {
        self.velocity / self.atmosphere.speed_of_sound
    }

    fn evaluate(&self, x: &[f64]) -> Result<(Vec<f64>, AeroResult, NetworkOutputs), EvaluateError> {
        let alpha = x[0];
        let throttle = x[1];
        let aero = self.set.aerodynamics.evaluate(
            self.vehicle,
            &AeroConditions {
                angle_of_attack: alpha,
                velocity: self.velocity,
                mach: self.mach(),
                kinematic_viscosity: self.atmosphere.kinematic_viscosity,
            },
        )?;
        let network = self.network.evaluate(&NetworkInputs {
            velocity: self.velocity,
            density: self.atmosphere.density,
            speed_of_sound: self.atmosphere.speed_of_sound,
            throttle,
            battery_voltage: self.bus_voltage,
            power_coefficients: x[2..].to_vec(),
        })?;

        let q_s = self.dynamic_pressure() * self.vehicle.reference_area;
        let lift = q_s * aero.lift_coefficient;
        let drag = q_s * aero.drag.total;
        let thrust = network.thrust;
        let mut residuals = Vec::with_capacity(x.len());
        residuals.push((thrust * alpha.cos() - drag) / self.weight);
        residuals.push((lift + thrust * alpha.sin() - self.weight) / self.weight);
        residuals.extend(network.torque_residuals());
        Ok((residuals, aero, network))
    }

    fn residuals(&self, x: &[f64]) -> Result<Vec<f64>, EvaluateError> {
        self.evaluate(x).map(|(r, _, _)| r)
    }

    fn dynamic_pressure(&self) -> f64 {
        0.5 * self.atmosphere.density * self.velocity * self.velocity
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

fn solve(
    problem: &PointProblem<'_>,
    x0: Vec<f64>,
    segment: &str,
    point: usize,
) -> Result<PointSolution, EvaluateError> {
    let n = x0.len();
    let mut x = x0;
    let mut r = problem.residuals(&x)?;
    let mut norm = max_abs(&r);

    for iteration in 0..=MAX_ITERATIONS {
        if norm < TOLERANCE {
            let (_, aero, network) = problem.evaluate(&x)?;
            return Ok(PointSolution {
                x,
                aero,
                network,
                residual_norm: norm,
                iterations: iteration,
            });
        }
        if iteration == MAX_ITERATIONS {
            break;
        }

        let mut jacobian = DMatrix::<f64>::zeros(n, n);
        for j in 0..n {
            let h = FD_STEP * x[j].abs().max(1.0);
            let mut shifted = x.clone();
            shifted[j] += h;
            let rp = problem.residuals(&shifted)?;
            for i in 0..n {
                jacobian[(i, j)] = (rp[i] - r[i]) / h;
            }
        }
        let rhs = -DVector::from_column_slice(&r);
        let step = jacobian
            .lu()
            .solve(&rhs)
            .filter(|s| s.iter().all(|v| v.is_finite()))
            .ok_or_else(|| EvaluateError::SingularJacobian {
                segment: segment.to_string(),
                point,
            })?;

        let mut damping = 1.0;
        loop {
            let trial: Vec<f64> = x
                .iter()
                .zip(step.iter())
                .map(|(xi, di)| xi + damping * di)
                .collect();
            match problem.residuals(&trial) {
                Ok(rt) if max_abs(&rt) < norm || damping <= MIN_DAMPING => {
                    x = trial;
                    norm = max_abs(&rt);
                    r = rt;
                    break;
                }
                Err(e) if damping <= MIN_DAMPING => return Err(e),
                _ => damping *= 0.5,
            }
        }
    }

    Err(EvaluateError::NotConverged {
        segment: segment.to_string(),
        point,
        residual: norm,
    })
}

fn check_layout(segment: &Segment, network: &BatteryPropeller) -> Result<(), EvaluateError> {
    let names: Vec<&str> = segment.unknowns.iter().map(|u| u.name.as_str()).collect();
    let expected = 2 + network.propellers.len();
    let leading_ok = names.first() == Some(&ANGLE_OF_ATTACK) && names.get(1) == Some(&THROTTLE);
    if !leading_ok || names.len() != expected || segment.residuals.len() != expected {
        return Err(EvaluateError::UnknownLayout {
            segment: segment.tag.clone(),
            network: network.tag.clone(),
            unknowns: names.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(())
}

/// Fly every segment of `mission` in order.
pub fn evaluate(
    configs: &FrozenConfigs,
    analyses: &BoundAnalyses<'_>,
    mission: &Mission,
) -> Result<Results, EvaluateError> {
    let mut segments = Vec::with_capacity(mission.len());
    let mut carried_energy: Option<f64> = None;
    let mut time_offset = 0.0;
    let mut distance_offset = 0.0;

    for segment in mission.segments() {
        let vehicle = configs.require(&segment.analyses)?;
        let set = &analyses.require(&segment.analyses)?.set;
        let network = set.energy.network(vehicle)?;
        let battery = network.battery()?;
        check_layout(segment, network)?;

        let atmosphere = set.atmosphere.compute_values(segment.profile.altitude)?;
        let velocity = segment.profile.speed.air_speed(atmosphere.speed_of_sound);
        let duration = segment.profile.distance / velocity;
        let times: Vec<f64> = chebyshev_points(segment.control_points)
            .into_iter()
            .map(|s| s * duration)
            .collect();

        let mut energy = match (segment.battery, carried_energy) {
            (Some(charge), _) => charge.energy(battery.max_energy()),
            (None, Some(e)) => e,
            (None, None) => return Err(EvaluateError::MissingInitialCharge(segment.tag.clone())),
        };
        let initial_energy = energy;
        let mut x: Vec<f64> = segment.unknowns.iter().map(|u| u.initial).collect();
        let weight = vehicle.mass_properties.takeoff * atmosphere.gravity;

        let mut points = Vec::with_capacity(times.len());
        let mut previous: Option<(f64, f64)> = None;
        let mut charge = 0.0;

        for (i, &t) in times.iter().enumerate() {
            let dt = if i == 0 { 0.0 } else { t - times[i - 1] };
            let predicted = energy - previous.map_or(0.0, |(p, _)| p) * dt;
            let bus_voltage = battery.open_circuit_voltage(battery.state_of_charge(predicted));

            let problem = PointProblem {
                vehicle,
                set,
                network,
                atmosphere,
                velocity,
                weight,
                bus_voltage,
            };
            let solution = solve(&problem, x.clone(), &segment.tag, i)?;
            x.clone_from(&solution.x);

            let power = solution.network.power_draw;
            let current = solution.network.battery_current;
            if let Some((p0, i0)) = previous {
                energy -= 0.5 * (p0 + power) * dt;
                charge += 0.5 * (i0 + current) * dt;
            }
            previous = Some((power, current));
            if energy <= 0.0 {
                return Err(EvaluateError::BatteryDepleted {
                    segment: segment.tag.clone(),
                    time: time_offset + t,
                });
            }

            let throttle = solution.x[1];
            if throttle > 1.0 {
                warn!(
                    "segment '{}': throttle {throttle:.3} above full power at control point {i}",
                    segment.tag
                );
            }
            debug!(
                "segment '{}' point {i}: converged in {} iteration(s), residual {:.2e}",
                segment.tag, solution.iterations, solution.residual_norm
            );

            let soc = battery.state_of_charge(energy);
            let under_load = battery.voltage_under_load(soc, current);
            let q_s = problem.dynamic_pressure() * vehicle.reference_area;
            let propulsors = network
                .propellers
                .iter()
                .zip(&solution.network.groups)
                .map(|(prop, g)| PropulsorState {
                    tag: prop.tag.clone(),
                    engines: g.engines,
                    propeller: g.propeller,
                    motor: g.motor,
                })
                .collect();

            points.push(ControlPointState {
                time: time_offset + t,
                distance: distance_offset + velocity * t,
                altitude: segment.profile.altitude,
                air_speed: velocity,
                mach: problem.mach(),
                atmosphere,
                angle_of_attack: solution.x[0],
                lift_coefficient: solution.aero.lift_coefficient,
                lift: q_s * solution.aero.lift_coefficient,
                drag_force: q_s * solution.aero.drag.total,
                drag: solution.aero.drag,
                thrust: solution.network.thrust,
                throttle,
                battery: BatteryState {
                    energy,
                    state_of_charge: soc,
                    voltage_open_circuit: bus_voltage,
                    voltage_under_load: under_load,
                    current,
                    power_draw: power,
                    cell_voltage: battery.cell_voltage(under_load),
                    cell_current: battery.cell_current(current),
                    cell_charge_throughput: battery.cell_charge_ah(charge),
                },
                propulsors,
                residual_norm: solution.residual_norm,
                iterations: solution.iterations,
            });
        }

        info!(
            "segment '{}' evaluated: {:.1} s, {:.2} Wh used, final state of charge {:.3}",
            segment.tag,
            duration,
            uav_core::units::j_to_wh(initial_energy - energy),
            battery.state_of_charge(energy)
        );
        carried_energy = Some(energy);
        time_offset += duration;
        distance_offset += segment.profile.distance;
        segments.push(SegmentResults {
            tag: segment.tag.clone(),
            start_time: segment.start_time,
            latitude: segment.latitude,
            longitude: segment.longitude,
            points,
        });
    }

    Ok(Results {
        mission: mission.tag.clone(),
        segments,
    })
}
