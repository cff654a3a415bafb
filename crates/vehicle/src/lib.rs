//! Vehicle records: mass properties, flight envelope, and the ordered list of
//! components (lifting surfaces and propulsion networks).

pub mod configs;

pub use configs::{Configs, ConfigsError, FrozenConfigs};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uav_core::vector::Vector3;
use uav_energy::{BatteryPropeller, EnergyError};
use uav_geometry::{GeometryError, Wing, WingRole};

/// Vehicle masses (kg).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub takeoff: f64,
    pub operating_empty: f64,
    pub max_takeoff: f64,
    /// Measured from the nose (m).
    pub center_of_gravity: Vector3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Maximum dynamic pressure (Pa).
    pub maximum_dynamic_pressure: f64,
}

/// A part attached to the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    Wing(Wing),
    Network(BatteryPropeller),
}

impl Component {
    pub fn tag(&self) -> &str {
        match self {
            Component::Wing(w) => &w.tag,
            Component::Network(n) => &n.tag,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum VehicleError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Energy(#[from] EnergyError),
    #[error("vehicle '{vehicle}' already has a component tagged '{component}'")]
    DuplicateComponent { vehicle: String, component: String },
    #[error("vehicle '{0}' has no main wing")]
    MissingMainWing(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub tag: String,
    pub mass_properties: MassProperties,
    /// Reference area (m²); synced to the main wing by [`Vehicle::derive`].
    pub reference_area: f64,
    pub envelope: Envelope,
    pub components: Vec<Component>,
}

impl Vehicle {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            mass_properties: MassProperties::default(),
            reference_area: 0.0,
            envelope: Envelope::default(),
            components: Vec::new(),
        }
    }

    /// Append a component. Tags must be unique within the vehicle.
    pub fn append_component(&mut self, component: Component) -> Result<(), VehicleError> {
        if self.components.iter().any(|c| c.tag() == component.tag()) {
            return Err(VehicleError::DuplicateComponent {
                vehicle: self.tag.clone(),
                component: component.tag().to_string(),
            });
        }
        self.components.push(component);
        Ok(())
    }

    pub fn wings(&self) -> impl Iterator<Item = &Wing> + '_ {
        self.components.iter().filter_map(|c| match c {
            Component::Wing(w) => Some(w),
            Component::Network(_) => None,
        })
    }

    pub fn networks(&self) -> impl Iterator<Item = &BatteryPropeller> + '_ {
        self.components.iter().filter_map(|c| match c {
            Component::Network(n) => Some(n),
            Component::Wing(_) => None,
        })
    }

    pub fn wing_with_role(&self, role: WingRole) -> Option<&Wing> {
        self.wings().find(|w| w.role == role)
    }

    pub fn main_wing(&self) -> Option<&Wing> {
        self.wing_with_role(WingRole::Main)
    }

    /// First propulsion network, if any.
    pub fn network(&self) -> Option<&BatteryPropeller> {
        self.networks().next()
    }

    pub fn component_mut(&mut self, tag: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.tag() == tag)
    }

    /// Derive every component and sync the reference area with the main wing.
    pub fn derive(mut self) -> Result<Self, VehicleError> {
        let components = std::mem::take(&mut self.components);
        self.components = components
            .into_iter()
            .map(|c| -> Result<Component, VehicleError> {
                match c {
                    Component::Wing(w) => Ok(Component::Wing(w.derive()?)),
                    Component::Network(n) => {
                        n.validate()?;
                        Ok(Component::Network(n))
                    }
                }
            })
            .collect::<Result<_, _>>()?;

        let area = self
            .main_wing()
            .map(|w| w.reference_area)
            .ok_or_else(|| VehicleError::MissingMainWing(self.tag.clone()))?;
        self.reference_area = area;
        info!("vehicle '{}' derived, reference area {:.4} m²", self.tag, area);
        Ok(self)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use uav_energy::{
        Avionics, BatteryDesign, Motor, Propeller, propeller_design, size_from_kv,
    };
    use uav_geometry::WingSegment;

    pub fn glider() -> Vehicle {
        let mut vehicle = Vehicle::new("glider");
        vehicle.mass_properties.takeoff = 2.0;
        vehicle.reference_area = 0.5;

        let mut wing = Wing::main_wing("main_wing");
        wing.reference_area = 0.5;
        wing.aspect_ratio = 10.0;
        wing.taper = 0.5;
        for (tag, eta, chord) in [("root", 0.0, 1.0), ("tip", 1.0, 0.5)] {
            wing.append_segment(WingSegment {
                root_chord_percent: chord,
                ..WingSegment::new(tag, eta)
            });
        }
        vehicle.append_component(Component::Wing(wing)).unwrap();

        let mut tail = Wing::horizontal_tail("horizontal_stabilizer");
        tail.reference_area = 0.08;
        tail.aspect_ratio = 4.0;
        tail.origin = [1.2, 0.0, 0.0];
        vehicle.append_component(Component::Wing(tail)).unwrap();
        vehicle
    }

    pub fn powered_glider() -> Vehicle {
        let mut vehicle = glider();
        let prop = propeller_design(Propeller {
            freestream_velocity: 12.0,
            angular_velocity: 500.0,
            tip_radius: 0.1,
            design_thrust: Some(1.5),
            ..Propeller::new("propeller")
        })
        .unwrap();
        let motor = size_from_kv(
            Motor {
                resistance: 0.01,
                no_load_current: 0.5,
                speed_constant: 100.0,
                propeller_radius: 0.1,
                ..Motor::new("motor")
            },
            11.1,
        )
        .unwrap();
        let network = BatteryPropeller {
            voltage: 11.1,
            propellers: vec![prop],
            propeller_motors: vec![motor],
            avionics: Avionics { power_draw: 1.0 },
            battery: Some(
                BatteryDesign::lithium_ion(600_000.0, 11.1)
                    .initialize_from_mass(0.5)
                    .unwrap(),
            ),
            ..BatteryPropeller::new("network")
        };
        vehicle.append_component(Component::Network(network)).unwrap();
        vehicle
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derive_syncs_reference_area_and_planforms() {
        let mut vehicle = powered_glider();
        vehicle.reference_area = 0.1;
        let derived = vehicle.derive().unwrap();
        assert_relative_eq!(derived.reference_area, 0.5);
        assert!(derived.wings().all(Wing::is_derived));
        assert!(derived.main_wing().unwrap().segment_properties().is_some());
        assert_eq!(derived.network().unwrap().tag, "network");
    }

    #[test]
    fn duplicate_component_tags_are_rejected() {
        let mut vehicle = glider();
        let err = vehicle
            .append_component(Component::Wing(Wing::main_wing("main_wing")))
            .unwrap_err();
        assert_eq!(
            err,
            VehicleError::DuplicateComponent {
                vehicle: "glider".into(),
                component: "main_wing".into()
            }
        );
    }

    #[test]
    fn derive_requires_main_wing() {
        let mut vehicle = Vehicle::new("kite");
        vehicle
            .append_component(Component::Wing(Wing::vertical_tail("fin")))
            .unwrap();
        assert_eq!(
            vehicle.derive().unwrap_err(),
            VehicleError::MissingMainWing("kite".into())
        );
    }

    #[test]
    fn derive_surfaces_network_errors() {
        let mut vehicle = powered_glider();
        if let Some(Component::Network(n)) = vehicle.component_mut("network") {
            n.battery = None;
        }
        assert!(matches!(
            vehicle.derive(),
            Err(VehicleError::Energy(EnergyError::MissingBattery(_)))
        ));
    }
}
