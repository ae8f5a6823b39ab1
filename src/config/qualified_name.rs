//! `name@qualifier` references used by location targets and CLI selections.
//!
//! Only the base name takes part in existence checks. The qualifier is opaque
//! and is carried through untouched for downstream consumers.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

const QUALIFIER_SEPARATOR: char = '@';

#[derive(Clone, Debug, Display, From, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the first `@`, or the whole name when unqualified.
    pub fn base(&self) -> &str {
        base_name(&self.0)
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.0
            .split_once(QUALIFIER_SEPARATOR)
            .map(|(_, qualifier)| qualifier)
    }

    /// Same qualifier, different base.
    pub fn with_base(&self, base: &str) -> Self {
        match self.qualifier() {
            Some(qualifier) => Self(format!("{base}{QUALIFIER_SEPARATOR}{qualifier}")),
            None => Self(base.to_owned()),
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for QualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn base_name(name: &str) -> &str {
    name.split_once(QUALIFIER_SEPARATOR)
        .map_or(name, |(base, _)| base)
}
