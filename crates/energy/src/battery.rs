//! Constant-mass battery packs.
//!
//! A pack is described by a [`BatteryDesign`] and only becomes a [`Battery`]
//! through [`BatteryDesign::initialize_from_mass`]. The maximum energy is fixed
//! at that point and has no setter afterwards.

use serde::{Deserialize, Serialize};
use uav_core::constants::{LI_ION_CELL_NOMINAL_VOLTAGE, SECONDS_PER_HOUR};
use uav_core::units::j_to_wh;

use crate::{EnergyError, require_positive};

/// Cell chemistry. Determines the per-cell constants used to lay out the pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryChemistry {
    LithiumIon,
    LithiumPolymer,
}

impl BatteryChemistry {
    fn cell_nominal_voltage(self) -> f64 {
        LI_ION_CELL_NOMINAL_VOLTAGE
    }

    fn cell_capacity_ah(self) -> f64 {
        match self {
            BatteryChemistry::LithiumIon => 3.0,
            BatteryChemistry::LithiumPolymer => 5.0,
        }
    }

    fn cell_resistance_ohm(self) -> f64 {
        match self {
            BatteryChemistry::LithiumIon => 0.03,
            BatteryChemistry::LithiumPolymer => 0.01,
        }
    }
}

/// Battery parameters before the pack is sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryDesign {
    pub chemistry: BatteryChemistry,
    /// Specific energy (J/kg).
    pub specific_energy: f64,
    /// Fully charged pack voltage (V).
    pub max_voltage: f64,
}

impl BatteryDesign {
    pub fn lithium_ion(specific_energy: f64, max_voltage: f64) -> Self {
        Self {
            chemistry: BatteryChemistry::LithiumIon,
            specific_energy,
            max_voltage,
        }
    }

    /// Size the pack from its mass: `max_energy = mass * specific_energy`.
    pub fn initialize_from_mass(self, mass: f64) -> Result<Battery, EnergyError> {
        require_positive("battery", "mass", mass)?;
        require_positive("battery", "specific energy", self.specific_energy)?;
        require_positive("battery", "max voltage", self.max_voltage)?;

        let max_energy = mass * self.specific_energy;
        let cell_voltage = self.chemistry.cell_nominal_voltage();
        let cells_in_series = (self.max_voltage / cell_voltage).round().max(1.0) as u32;
        let cell_energy_wh = cell_voltage * self.chemistry.cell_capacity_ah();
        let cells_in_parallel = (j_to_wh(max_energy) / (cells_in_series as f64 * cell_energy_wh))
            .ceil()
            .max(1.0) as u32;
        let internal_resistance = cells_in_series as f64 * self.chemistry.cell_resistance_ohm()
            / cells_in_parallel as f64;

        Ok(Battery {
            chemistry: self.chemistry,
            mass,
            specific_energy: self.specific_energy,
            max_voltage: self.max_voltage,
            max_energy,
            cells_in_series,
            cells_in_parallel,
            internal_resistance,
        })
    }
}

/// A sized battery pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    chemistry: BatteryChemistry,
    mass: f64,
    specific_energy: f64,
    max_voltage: f64,
    max_energy: f64,
    cells_in_series: u32,
    cells_in_parallel: u32,
    internal_resistance: f64,
}

impl Battery {
    pub fn chemistry(&self) -> BatteryChemistry {
        self.chemistry
    }

    /// Pack mass (kg).
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Specific energy (J/kg).
    pub fn specific_energy(&self) -> f64 {
        self.specific_energy
    }

    pub fn max_voltage(&self) -> f64 {
        self.max_voltage
    }

    /// Energy at full charge (J).
    pub fn max_energy(&self) -> f64 {
        self.max_energy
    }

    pub fn cells_in_series(&self) -> u32 {
        self.cells_in_series
    }

    pub fn cells_in_parallel(&self) -> u32 {
        self.cells_in_parallel
    }

    /// Pack internal resistance (Ω).
    pub fn internal_resistance(&self) -> f64 {
        self.internal_resistance
    }

    pub fn state_of_charge(&self, energy: f64) -> f64 {
        (energy / self.max_energy).clamp(0.0, 1.0)
    }

    /// Open-circuit pack voltage, linear between 80 % and 100 % of `max_voltage`.
    pub fn open_circuit_voltage(&self, state_of_charge: f64) -> f64 {
        self.max_voltage * (0.8 + 0.2 * state_of_charge.clamp(0.0, 1.0))
    }

    pub fn voltage_under_load(&self, state_of_charge: f64, current: f64) -> f64 {
        self.open_circuit_voltage(state_of_charge) - current * self.internal_resistance
    }

    pub fn cell_voltage(&self, pack_voltage: f64) -> f64 {
        pack_voltage / self.cells_in_series as f64
    }

    pub fn cell_current(&self, pack_current: f64) -> f64 {
        pack_current / self.cells_in_parallel as f64
    }

    /// Charge drawn from each cell for a pack-level charge (Ah).
    pub fn cell_charge_ah(&self, pack_charge_coulomb: f64) -> f64 {
        pack_charge_coulomb / SECONDS_PER_HOUR / self.cells_in_parallel as f64
    }
}
