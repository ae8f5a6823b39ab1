use crate::config::model::EntityKind;
use crate::config::options::Options;
use crate::config::path;
use crate::config::redacted::RedactedString;
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use bon::Builder;
use getset::Getters;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::path::Path;
use validator::Validate;

pub const LOCAL_BACKEND_TYPE: &str = "local";

/// A named storage destination for the backup engine.
///
/// The name is the key of the backend in the config file and is assigned
/// when the config is loaded; it is never serialized.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[getset(get = "pub")]
pub struct Backend {
    #[serde(skip)]
    #[builder(default, into)]
    name: String,
    #[serde(rename = "type", default)]
    #[validate(length(min = 1, code = "EmptyType", message = "type must not be empty"))]
    #[builder(into)]
    backend_type: String,
    #[serde(default)]
    #[validate(length(min = 1, code = "EmptyPath", message = "path must not be empty"))]
    #[builder(into)]
    path: String,
    #[builder(into)]
    key: Option<RedactedString>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[builder(default)]
    require_key: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[builder(default)]
    env: BTreeMap<String, RedactedString>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[builder(default)]
    options: Options,
}

impl Backend {
    pub(crate) fn assign_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Structural checks: `type` and `path` must be set.
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(|errors| Error::Validation {
            kind: EntityKind::Backend,
            name: self.name.clone(),
            errors,
        })
    }

    /// Repository address handed to the engine.
    ///
    /// Local repositories are resolved against the config file directory,
    /// every other type is addressed as `type:path`.
    pub fn repository<P: AsRef<Path>>(&self, config_file: P) -> Result<String> {
        if self.backend_type == LOCAL_BACKEND_TYPE {
            path::resolve(&self.path, config_file).map(|p| p.to_string_lossy().into_owned())
        } else {
            Ok(format!("{}:{}", self.backend_type, self.path))
        }
    }

    /// Environment for an engine invocation against this backend.
    ///
    /// User supplied keys are upper-cased. The repository and, when set, the
    /// key are exported under the engine's own variable names.
    pub fn engine_env<P: AsRef<Path>>(&self, config_file: P) -> Result<BTreeMap<String, String>> {
        let mut env: BTreeMap<_, _> = self
            .env
            .iter()
            .map(|(k, v)| (k.to_uppercase(), v.inner().clone()))
            .collect();
        env.insert("RESTIC_REPOSITORY".into(), self.repository(config_file)?);
        if let Some(key) = &self.key {
            env.insert("RESTIC_PASSWORD".into(), key.inner().clone());
        }
        Ok(env)
    }
}
