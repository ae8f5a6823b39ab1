//! Validation of the loaded model.
//!
//! Provides [`check_all`], the gate run before anything touches a repository,
//! and a cron lint whose findings are only logged.

use crate::config::engine::EngineProbe;
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::store::ConfigStore;
use chrono::Utc;
use validator::ValidationError;

/// Shorthand schedules understood by common cron daemons.
pub const CRON_MACROS: [&str; 8] = [
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
    "@reboot",
];

/// An empty string means "no schedule" and is accepted.
///
/// Never part of [`Config::check`](crate::config::model::Config::check): the
/// scheduler owns the cron syntax, so [`check_all`] only warns on failure.
pub fn validate_cron_str<S: AsRef<str>>(cron: S) -> std::result::Result<(), ValidationError> {
    let cron = cron.as_ref().trim();
    if cron.is_empty() || CRON_MACROS.contains(&cron) {
        return Ok(());
    }
    if cron_parser::parse(cron, &Utc::now()).is_err() {
        return Err(ValidationError::new("InvalidCron")
            .with_message(format!("Invalid cron string: {cron:?}").into()));
    }

    Ok(())
}

/// Loads the config, checks the engine is callable and validates every
/// backend and location.
///
/// Fails fast with the first invalid entity. Which one is reported when
/// several are invalid is not part of the contract.
pub fn check_all<P: EngineProbe + ?Sized>(store: &ConfigStore, engine: &P) -> Result<()> {
    let config = store.load()?;
    if !engine.is_callable() {
        return Err(Error::EngineUnavailable {
            binary: engine.binary().to_owned(),
        });
    }
    config.check()?;
    for location in config.locations().values() {
        if let Some(Err(e)) = location.cron().map(validate_cron_str) {
            tracing::warn!("Location {:?}: {e}", location.name());
        }
    }
    tracing::debug!(
        "Config valid: {} backends, {} locations",
        config.backends().len(),
        config.locations().len()
    );
    Ok(())
}
