//! Read-only views of the model for the presentation layer.
//!
//! Secrets are replaced with [`REDACTED_SECRET`]; formatting is left to the caller.

use crate::config::backend::Backend;
use crate::config::location::{HookSlot, Location};
use crate::config::model::Config;
use crate::config::options::Options;
use crate::config::redacted::REDACTED_SECRET;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityDescription {
    Location(LocationDescription),
    Backend(BackendDescription),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocationDescription {
    pub name: String,
    pub from: Vec<String>,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    /// Only slots that have commands.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub hooks: BTreeMap<HookSlot, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub options: Options,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackendDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub backend_type: String,
    pub path: String,
    /// Upper-cased variable names, values redacted.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl From<&Location> for LocationDescription {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name().clone(),
            from: location.from().clone(),
            to: location.to().iter().map(ToString::to_string).collect(),
            cron: location.cron().map(str::to_owned),
            hooks: location
                .hooks()
                .slots()
                .into_iter()
                .filter(|(_, commands)| !commands.is_empty())
                .map(|(slot, commands)| (slot, commands.to_vec()))
                .collect(),
            options: location.options().clone(),
        }
    }
}

impl From<&Backend> for BackendDescription {
    fn from(backend: &Backend) -> Self {
        Self {
            name: backend.name().clone(),
            backend_type: backend.backend_type().clone(),
            path: backend.path().clone(),
            env: backend
                .env()
                .keys()
                .map(|k| (k.to_uppercase(), REDACTED_SECRET.to_owned()))
                .collect(),
        }
    }
}

impl Config {
    /// Every location, then every backend, each in name order.
    pub fn describe(&self) -> Vec<EntityDescription> {
        self.locations()
            .values()
            .map(|l| EntityDescription::Location(l.into()))
            .chain(
                self.backends()
                    .values()
                    .map(|b| EntityDescription::Backend(b.into())),
            )
            .collect()
    }
}
