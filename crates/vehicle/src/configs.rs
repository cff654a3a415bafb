//! Named vehicle configurations.
//!
//! Each configuration owns an independent copy of the vehicle so per-variant
//! overrides never leak into the others. [`Configs::finalize`] derives every
//! copy and hands back a read-only [`FrozenConfigs`].

use log::{debug, info};
use thiserror::Error;

use crate::{Vehicle, VehicleError};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigsError {
    #[error("configuration '{0}' already exists")]
    Duplicate(String),
    #[error("no configuration named '{0}'")]
    Unknown(String),
    #[error("configuration '{tag}': {source}")]
    Derive {
        tag: String,
        #[source]
        source: VehicleError,
    },
}

/// Mutable set of named configurations, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configs {
    entries: Vec<(String, Vehicle)>,
}

impl Configs {
    pub fn new() -> Self {
        Self::default()
    }

    /// One independent copy of `vehicle` per tag.
    pub fn expand<S: AsRef<str>>(vehicle: &Vehicle, tags: &[S]) -> Result<Self, ConfigsError> {
        let mut configs = Self::new();
        for tag in tags {
            configs.append(tag.as_ref(), vehicle.clone())?;
        }
        Ok(configs)
    }

    pub fn append(&mut self, tag: impl Into<String>, vehicle: Vehicle) -> Result<(), ConfigsError> {
        let tag = tag.into();
        if self.get(&tag).is_some() {
            return Err(ConfigsError::Duplicate(tag));
        }
        debug!("configuration '{}' added from vehicle '{}'", tag, vehicle.tag);
        self.entries.push((tag, vehicle));
        Ok(())
    }

    /// Apply an override to one configuration only.
    pub fn modify<F>(&mut self, tag: &str, edit: F) -> Result<(), ConfigsError>
    where
        F: FnOnce(&mut Vehicle),
    {
        let vehicle = self
            .entries
            .iter_mut()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v)
            .ok_or_else(|| ConfigsError::Unknown(tag.to_string()))?;
        edit(vehicle);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&Vehicle> {
        self.entries.iter().find(|(t, _)| t == tag).map(|(_, v)| v)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derive every configuration and freeze the set.
    pub fn finalize(self) -> Result<FrozenConfigs, ConfigsError> {
        let entries = self
            .entries
            .into_iter()
            .map(|(tag, vehicle)| match vehicle.derive() {
                Ok(v) => Ok((tag, v)),
                Err(source) => Err(ConfigsError::Derive { tag, source }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!("{} configuration(s) finalized", entries.len());
        Ok(FrozenConfigs { entries })
    }
}

/// Derived, read-only configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenConfigs {
    entries: Vec<(String, Vehicle)>,
}

impl FrozenConfigs {
    pub fn get(&self, tag: &str) -> Option<&Vehicle> {
        self.entries.iter().find(|(t, _)| t == tag).map(|(_, v)| v)
    }

    pub fn require(&self, tag: &str) -> Result<&Vehicle, ConfigsError> {
        self.get(tag)
            .ok_or_else(|| ConfigsError::Unknown(tag.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vehicle)> + '_ {
        self.entries.iter().map(|(t, v)| (t.as_str(), v))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
