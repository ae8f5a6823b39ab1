//! Path resolution relative to the config file.

use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use std::path::{Path, PathBuf};

const HOME_MARKER: &str = "~";

/// Resolves `path` the way every path in the config file is interpreted.
///
/// * absolute paths are returned unchanged,
/// * a leading `~` is replaced with the home directory,
/// * anything else is relative to the directory holding `config_file`,
///   not to the working directory.
pub fn resolve<P: AsRef<Path>>(path: &str, config_file: P) -> Result<PathBuf> {
    resolve_with_home(path, config_file, dirs::home_dir)
}

pub fn resolve_with_home<P, F>(path: &str, config_file: P, home_dir: F) -> Result<PathBuf>
where
    P: AsRef<Path>,
    F: FnOnce() -> Option<PathBuf>,
{
    if Path::new(path).is_absolute() {
        return Ok(PathBuf::from(path));
    }

    if let Some(rest) = path.strip_prefix(HOME_MARKER) {
        let home = home_dir().ok_or_else(|| Error::HomeResolution {
            path: path.to_owned(),
        })?;
        let rest = rest.trim_start_matches(['/', '\\']);
        return Ok(normalize(home.join(rest)));
    }

    let base = config_file.as_ref().parent().unwrap_or_else(|| Path::new(""));
    Ok(normalize(base.join(path)))
}

// Drops interior `.` components.
fn normalize(path: PathBuf) -> PathBuf {
    path.components().collect()
}
