//! Turns CLI selection flags into the names a command operates on.

use crate::config::model::{Config, EntityKind};
use crate::config::qualified_name::base_name;
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use clap::Args;

/// Resolves the requested names against the config.
///
/// With `all` set, every name of `kind` is returned and `requested` is
/// ignored. Otherwise each requested token must name an existing entity once
/// its `@qualifier` is stripped; tokens are returned as given, qualifier
/// included.
pub fn resolve<S: AsRef<str>>(
    config: &Config,
    requested: &[S],
    all: bool,
    kind: EntityKind,
) -> Result<Vec<String>> {
    let candidates = config.names(kind);
    if all {
        tracing::debug!("Selected all {} {kind}s", candidates.len());
        return Ok(candidates);
    }

    let mut selected = Vec::with_capacity(requested.len());
    for token in requested.iter().map(AsRef::as_ref) {
        let base = base_name(token);
        if !candidates.iter().any(|c| c == base) {
            return Err(Error::selection(format!("invalid {kind} {token:?}")));
        }
        selected.push(token.to_owned());
    }

    if selected.is_empty() {
        return Err(Error::selection("nothing selected, aborting"));
    }
    tracing::debug!("Selected {kind}s: {selected:?}");
    Ok(selected)
}

/// `-a/--all` and `-b/--backend` flags for commands working on backends.
#[derive(Args, Clone, Debug, Default)]
pub struct BackendSelection {
    /// All backends
    #[arg(short, long)]
    pub all: bool,
    /// Select backends
    #[arg(short, long, value_delimiter = ',')]
    pub backend: Vec<String>,
}

impl BackendSelection {
    pub fn resolve(&self, config: &Config) -> Result<Vec<String>> {
        resolve(config, &self.backend, self.all, EntityKind::Backend)
    }
}

/// `-a/--all` and `-l/--location` flags for commands working on locations.
#[derive(Args, Clone, Debug, Default)]
pub struct LocationSelection {
    /// All locations
    #[arg(short, long)]
    pub all: bool,
    /// Select locations
    #[arg(short, long, value_delimiter = ',')]
    pub location: Vec<String>,
}

impl LocationSelection {
    pub fn resolve(&self, config: &Config) -> Result<Vec<String>> {
        resolve(config, &self.location, self.all, EntityKind::Location)
    }
}
