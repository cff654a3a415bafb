//! Per-configuration analysis sets.
//!
//! [`Analyses::setup`] creates one [`AnalysisSet`] per configuration tag. The
//! sets only hold settings until [`Analyses::finalize`] binds each of them to
//! its frozen vehicle, producing [`BoundAnalyses`] that borrow the vehicles.

pub mod aerodynamics;
pub mod atmosphere;
pub mod energy;
pub mod planet;
pub mod sizing;
pub mod weights;

pub use aerodynamics::{
    AeroConditions, AeroResult, Aerodynamics, AerodynamicsSettings, ComponentDrag, DragBreakdown,
};
pub use atmosphere::{Atmosphere, AtmosphereConditions};
pub use energy::Energy;
pub use planet::{Planet, PlanetFeatures};
pub use sizing::{Sizing, SizingReport};
pub use weights::{
    ComponentMass, EmptyWeightCorrelation, EmptyWeightMethod, HumanPowered, MassBreakdown,
    UavFractions, Weights,
};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uav_vehicle::{Configs, FrozenConfigs, Vehicle};

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("analysis set '{0}' already exists")]
    Duplicate(String),
    #[error("analysis set '{0}' has no matching configuration")]
    UnboundConfiguration(String),
    #[error("no analysis set named '{0}'")]
    Unknown(String),
    #[error("altitude {0} m lies outside the standard atmosphere")]
    AltitudeOutOfRange(f64),
    #[error("wing '{0}' has no derived planform")]
    UnderivedWing(String),
    #[error("vehicle '{0}' has no reference area")]
    MissingReferenceArea(String),
    #[error("vehicle '{vehicle}' has no propulsion network (requested {network:?})")]
    MissingNetwork {
        vehicle: String,
        network: Option<String>,
    },
}

/// Settings shared by every set built with [`base_analysis`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub aerodynamics: AerodynamicsSettings,
    pub empty_weight: EmptyWeightMethod,
    /// Offset from the standard atmosphere temperature (K).
    #[serde(default)]
    pub temperature_deviation: f64,
}

/// One of each analysis for the configuration `tag`.
#[derive(Debug)]
pub struct AnalysisSet {
    pub tag: String,
    pub sizing: Sizing,
    pub weights: Weights,
    pub aerodynamics: Aerodynamics,
    pub energy: Energy,
    pub planet: Planet,
    pub atmosphere: Atmosphere,
}

/// Build the analysis set of one configuration. The atmosphere is bound to
/// the planet's features.
pub fn base_analysis(tag: impl Into<String>, settings: &AnalysisSettings) -> AnalysisSet {
    let planet = Planet::default();
    let atmosphere = Atmosphere {
        temperature_deviation: settings.temperature_deviation,
        ..Atmosphere::us_standard_1976(&planet)
    };
    AnalysisSet {
        tag: tag.into(),
        sizing: Sizing,
        weights: Weights::new(settings.empty_weight),
        aerodynamics: Aerodynamics {
            settings: settings.aerodynamics.clone(),
        },
        energy: Energy::default(),
        planet,
        atmosphere,
    }
}

#[derive(Debug, Default)]
pub struct Analyses {
    sets: Vec<AnalysisSet>,
}

impl Analyses {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`base_analysis`] per configuration tag.
    pub fn setup(configs: &Configs, settings: &AnalysisSettings) -> Self {
        let sets = configs
            .tags()
            .map(|tag| base_analysis(tag, settings))
            .collect();
        Self { sets }
    }

    pub fn append(&mut self, set: AnalysisSet) -> Result<(), AnalysisError> {
        if self.get(&set.tag).is_some() {
            return Err(AnalysisError::Duplicate(set.tag));
        }
        self.sets.push(set);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&AnalysisSet> {
        self.sets.iter().find(|s| s.tag == tag)
    }

    pub fn get_mut(&mut self, tag: &str) -> Option<&mut AnalysisSet> {
        self.sets.iter_mut().find(|s| s.tag == tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.sets.iter().map(|s| s.tag.as_str())
    }

    /// Bind every set to its frozen configuration. Sets whose configuration
    /// carries a network must resolve it here.
    pub fn finalize(self, configs: &FrozenConfigs) -> Result<BoundAnalyses<'_>, AnalysisError> {
        let mut bound = Vec::with_capacity(self.sets.len());
        for set in self.sets {
            let vehicle = configs
                .get(&set.tag)
                .ok_or_else(|| AnalysisError::UnboundConfiguration(set.tag.clone()))?;
            if set.energy.network.is_some() {
                set.energy.network(vehicle)?;
            }
            debug!("analysis set '{}' bound to vehicle '{}'", set.tag, vehicle.tag);
            bound.push(BoundAnalysis { set, vehicle });
        }
        info!("{} analysis set(s) finalized", bound.len());
        Ok(BoundAnalyses { sets: bound })
    }
}

/// An analysis set and the frozen vehicle it evaluates.
#[derive(Debug)]
pub struct BoundAnalysis<'a> {
    pub set: AnalysisSet,
    pub vehicle: &'a Vehicle,
}

#[derive(Debug)]
pub struct BoundAnalyses<'a> {
    sets: Vec<BoundAnalysis<'a>>,
}

impl<'a> BoundAnalyses<'a> {
    pub fn get(&self, tag: &str) -> Option<&BoundAnalysis<'a>> {
        self.sets.iter().find(|s| s.set.tag == tag)
    }

    pub fn require(&self, tag: &str) -> Result<&BoundAnalysis<'a>, AnalysisError> {
        self.get(tag)
            .ok_or_else(|| AnalysisError::Unknown(tag.to_string()))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.sets.iter().map(|s| s.set.tag.as_str())
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
