use crate::config::backend::Backend;
use crate::config::env_file::EnvFile;
use crate::config::location::Location;
use crate::config::options::{self, Options};
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use derive_more::Display;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[display("backend")]
    Backend,
    #[display("location")]
    Location,
}

/// Root of the config file.
///
/// Backend and location names are the keys of their maps. They are copied
/// into each entity by [`Config::from_yaml_str`] and the admin methods below,
/// and nowhere else.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct Config {
    /// Free-form section, kept as-is.
    extras: Option<serde_yml::Value>,
    #[serde(default)]
    locations: BTreeMap<String, Location>,
    #[serde(default)]
    backends: BTreeMap<String, Backend>,
    #[serde(default)]
    global: Options,
    /// Contents of the env file next to the config, if one was read.
    #[serde(skip)]
    env_file: EnvFile,
}

impl Config {
    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, serde_yml::Error> {
        let mut config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yml::from_str(content)?
        };
        config.assign_names();
        Ok(config)
    }

    fn assign_names(&mut self) {
        for (name, backend) in self.backends.iter_mut() {
            backend.assign_name(name.as_str());
        }
        for (name, location) in self.locations.iter_mut() {
            location.assign_name(name.as_str());
        }
    }

    pub(crate) fn set_env_file(&mut self, env: EnvFile) {
        self.env_file = env;
    }

    pub fn backend(&self, name: &str) -> Result<&Backend> {
        self.backends.get(name).ok_or_else(|| Error::UnknownEntity {
            kind: EntityKind::Backend,
            name: name.to_owned(),
        })
    }

    pub fn location(&self, name: &str) -> Result<&Location> {
        self.locations.get(name).ok_or_else(|| Error::UnknownEntity {
            kind: EntityKind::Location,
            name: name.to_owned(),
        })
    }

    pub fn names(&self, kind: EntityKind) -> Vec<String> {
        match kind {
            EntityKind::Backend => self.backends.keys().cloned().collect(),
            EntityKind::Location => self.locations.keys().cloned().collect(),
        }
    }

    /// Validates every backend, then every location. Stops at the first failure.
    pub fn check(&self) -> Result<()> {
        self.backends.values().try_for_each(Backend::check)?;
        self.locations
            .values()
            .try_for_each(|location| location.check(&self.backends))
    }

    /// Engine flags for `command` on one location/backend pair.
    pub fn combine_options(&self, command: &str, location: &Location, backend: &Backend) -> Vec<String> {
        options::combine(command, &self.global, location, backend)
    }

    pub fn add_backend<S: Into<String>>(&mut self, name: S, mut backend: Backend) -> Result<()> {
        let name = name.into();
        if self.backends.contains_key(&name) {
            return Err(Error::Duplicate {
                kind: EntityKind::Backend,
                name,
            });
        }
        backend.assign_name(name.as_str());
        self.backends.insert(name, backend);
        Ok(())
    }

    pub fn add_location<S: Into<String>>(&mut self, name: S, mut location: Location) -> Result<()> {
        let name = name.into();
        if self.locations.contains_key(&name) {
            return Err(Error::Duplicate {
                kind: EntityKind::Location,
                name,
            });
        }
        location.assign_name(name.as_str());
        self.locations.insert(name, location);
        Ok(())
    }

    /// Removes a backend. Locations still pointing at it fail the next [`Config::check`].
    pub fn remove_backend(&mut self, name: &str) -> Result<Backend> {
        self.backends.remove(name).ok_or_else(|| Error::UnknownEntity {
            kind: EntityKind::Backend,
            name: name.to_owned(),
        })
    }

    pub fn remove_location(&mut self, name: &str) -> Result<Location> {
        self.locations.remove(name).ok_or_else(|| Error::UnknownEntity {
            kind: EntityKind::Location,
            name: name.to_owned(),
        })
    }

    /// Renames a backend and rewrites every `to` reference, keeping qualifiers.
    pub fn rename_backend(&mut self, old: &str, new: &str) -> Result<()> {
        if self.backends.contains_key(new) {
            return Err(Error::Duplicate {
                kind: EntityKind::Backend,
                name: new.to_owned(),
            });
        }
        let backend = self.remove_backend(old)?;
        self.add_backend(new, backend)?;

        for location in self.locations.values_mut() {
            for target in location.to_mut().iter_mut() {
                if target.base() == old {
                    *target = target.with_base(new);
                }
            }
        }
        tracing::info!("Renamed backend {:?} to {:?}", old, new);
        Ok(())
    }
}
