//! The optional `.autorestic.env` file next to the config file.
//!
//! Holds `KEY=value` pairs handed to the engine's environment. Reading it is
//! best effort: a missing file is not an error for the caller of the store.

use crate::config::redacted::RedactedString;
use crate::config::result_error::result::Result;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const ENV_FILE_NAME: &str = ".autorestic.env";

pub type EnvFile = BTreeMap<String, RedactedString>;

pub fn env_file_path<P: AsRef<Path>>(config_file: P) -> PathBuf {
    config_file
        .as_ref()
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(ENV_FILE_NAME)
}

pub fn load_env_file<P: AsRef<Path>>(path: P) -> Result<EnvFile> {
    let file = File::open(path.as_ref())?;
    Ok(parse_env(file))
}

/// Parses dotenv content with `dotenvy`.
///
/// Entries that fail to parse are skipped with a warning, the rest are kept.
pub fn parse_env<R: Read>(reader: R) -> EnvFile {
    let mut env = EnvFile::new();
    for item in dotenvy::from_read_iter(reader) {
        match item {
            Ok((key, value)) => {
                env.insert(key, value.into());
            }
            Err(e) => tracing::warn!("Skipping env file entry: {e}"),
        }
    }
    env
}
