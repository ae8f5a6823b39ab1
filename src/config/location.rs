use crate::config::backend::Backend;
use crate::config::model::EntityKind;
use crate::config::options::Options;
use crate::config::path;
use crate::config::qualified_name::QualifiedName;
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use bon::Builder;
use derive_more::Display;
use getset::Getters;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError, ValidationErrors};

/// A named backup job: what to back up, where to, when, and the hooks around it.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[getset(get = "pub")]
pub struct Location {
    #[serde(skip)]
    #[builder(default, into)]
    name: String,
    #[serde(default, deserialize_with = "one_or_many")]
    #[validate(length(min = 1, code = "EmptyFrom", message = "from must list at least one path"))]
    from: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    #[validate(length(min = 1, code = "EmptyTo", message = "to must list at least one backend"))]
    to: Vec<QualifiedName>,
    /// Schedule for the external scheduler, stored verbatim.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[builder(default, into)]
    #[getset(skip)]
    cron: String,
    #[serde(default, skip_serializing_if = "Hooks::is_empty")]
    #[builder(default)]
    hooks: Hooks,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[builder(default)]
    options: Options,
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookSlot {
    #[display("before")]
    Before,
    #[display("after")]
    After,
    #[display("success")]
    Success,
    #[display("failure")]
    Failure,
}

/// Commands run around a backup. Executed by the hook runner, only stored here.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct Hooks {
    /// Working directory for hook commands, relative to the config file.
    #[builder(into)]
    dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    before: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    after: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    success: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    failure: Vec<String>,
}

impl Hooks {
    pub fn is_empty(&self) -> bool {
        self.dir.is_none() && self.slots().iter().all(|(_, commands)| commands.is_empty())
    }

    pub fn slots(&self) -> [(HookSlot, &[String]); 4] {
        [
            (HookSlot::Before, self.before.as_slice()),
            (HookSlot::After, self.after.as_slice()),
            (HookSlot::Success, self.success.as_slice()),
            (HookSlot::Failure, self.failure.as_slice()),
        ]
    }

    pub fn commands(&self, slot: HookSlot) -> &[String] {
        match slot {
            HookSlot::Before => self.before.as_slice(),
            HookSlot::After => self.after.as_slice(),
            HookSlot::Success => self.success.as_slice(),
            HookSlot::Failure => self.failure.as_slice(),
        }
    }
}

impl Location {
    pub(crate) fn assign_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub(crate) fn to_mut(&mut self) -> &mut Vec<QualifiedName> {
        &mut self.to
    }

    pub fn cron(&self) -> Option<&str> {
        Some(self.cron.as_str()).filter(|c| !c.is_empty())
    }

    /// Structural checks plus every `to` entry naming a known backend.
    ///
    /// All violations of this location are reported together in one error.
    pub fn check(&self, backends: &BTreeMap<String, Backend>) -> Result<()> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        for target in self.to.iter().filter(|t| !backends.contains_key(t.base())) {
            errors.add(
                "to",
                ValidationError::new("UnknownBackend")
                    .with_message(format!("backend {:?} does not exist", target.base()).into()),
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                kind: EntityKind::Location,
                name: self.name.clone(),
                errors,
            })
        }
    }

    /// Names of the backends this location targets, qualifiers stripped.
    pub fn backend_names(&self) -> impl Iterator<Item = &str> {
        self.to.iter().map(QualifiedName::base)
    }

    pub fn targets(&self, backend: &str) -> bool {
        self.backend_names().any(|b| b == backend)
    }

    /// Source paths resolved against the config file directory.
    pub fn resolved_from<P: AsRef<Path>>(&self, config_file: P) -> Result<Vec<PathBuf>> {
        self.from
            .iter()
            .map(|p| path::resolve(p, config_file.as_ref()))
            .collect()
    }

    pub fn resolved_hook_dir<P: AsRef<Path>>(&self, config_file: P) -> Result<PathBuf> {
        match &self.hooks.dir {
            Some(dir) => path::resolve(dir, config_file),
            None => path::resolve(".", config_file),
        }
    }
}

/// Accepts either a single string or a list of strings.
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(v) => vec![v],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backends(names: &[&str]) -> BTreeMap<String, Backend> {
        names
            .iter()
            .map(|n| {
                let mut b = Backend::builder().backend_type("local").path("/b").build();
                b.assign_name(*n);
                (n.to_string(), b)
            })
            .collect()
    }

    fn location(from: &[&str], to: &[&str]) -> Location {
        let mut l = Location::builder()
            .from(from.iter().map(|s| s.to_string()).collect())
            .to(to.iter().map(|s| QualifiedName::from(*s)).collect())
            .build();
        l.assign_name("home");
        l
    }

    fn assert_invalid(l: &Location, backends: &BTreeMap<String, Backend>, needle: &str) {
        match l.check(backends).unwrap_err() {
            Error::Validation { kind, name, errors } => {
                assert_eq!(kind, EntityKind::Location);
                assert_eq!(name, "home");
                assert!(errors.to_string().contains(needle), "{errors}");
            }
            e => panic!("Expected Validation error, got {e}"),
        }
    }

    #[test]
    fn test_valid_location() {
        let l = location(&["/data"], &["nas", "s3@prod"]);
        assert!(l.check(&backends(&["nas", "s3"])).is_ok());
    }

    #[test]
    fn test_empty_from() {
        assert_invalid(&location(&[], &["nas"]), &backends(&["nas"]), "from must list");
    }

    #[test]
    fn test_empty_to() {
        assert_invalid(&location(&["/data"], &[]), &backends(&["nas"]), "to must list");
    }

    #[test]
    fn test_unknown_backend_reference() {
        assert_invalid(
            &location(&["/data"], &["nas", "ghost@prod"]),
            &backends(&["nas"]),
            "backend \"ghost\" does not exist",
        );
    }

    #[test]
    fn test_qualifier_ignored_for_existence() {
        let l = location(&["/data"], &["nas@staging"]);
        assert!(l.check(&backends(&["nas"])).is_ok());
        assert!(l.targets("nas"));
        assert_eq!(l.to()[0].as_str(), "nas@staging");
    }

    #[test]
    fn test_cron_is_stored_not_checked() {
        let mut l = location(&["/data"], &["nas"]);
        for cron in ["@daily", "0 3 * * *", "not a cron"] {
            l.cron = cron.into();
            assert!(l.check(&backends(&["nas"])).is_ok(), "{cron}");
            assert_eq!(l.cron(), Some(cron));
        }
    }

    #[test]
    fn test_cron_macro_passes_config_check() {
        let config = crate::config::model::Config::from_yaml_str(
            r#"
backends:
  nas: {type: local, path: /srv}
locations:
  home: {from: /h, to: nas, cron: '@daily'}
"#,
        )
        .unwrap();
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_deserialize_single_strings() {
        let l: Location = serde_yml::from_str(
            r#"
from: /data
to: nas
cron: "0 3 * * *"
hooks:
  before:
    - echo start
  failure:
    - echo failed
"#,
        )
        .unwrap();

        assert_eq!(l.from(), &vec!["/data".to_owned()]);
        assert_eq!(l.to(), &vec![QualifiedName::from("nas")]);
        assert_eq!(l.hooks().commands(HookSlot::Before), ["echo start"]);
        assert!(l.hooks().after().is_empty());
        assert!(!l.hooks().is_empty());
    }

    #[test]
    fn test_missing_from_is_validation_error() {
        let mut l: Location = serde_yml::from_str("to: [nas]").unwrap();
        l.assign_name("home");
        assert_invalid(&l, &backends(&["nas"]), "from must list");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_yml::from_str::<Location>("from: /a\nto: nas\nretention: 3").is_err());
    }

    #[test]
    fn test_resolved_paths() {
        let l = location(&["/abs", "rel"], &["nas"]);
        assert_eq!(
            l.resolved_from("/cfg/.autorestic.yml").unwrap(),
            vec![PathBuf::from("/abs"), PathBuf::from("/cfg/rel")]
        );
        assert_eq!(
            l.resolved_hook_dir("/cfg/.autorestic.yml").unwrap(),
            PathBuf::from("/cfg")
        );
    }
}
