//! Boundary check for the external backup engine.

use std::env;
use std::path::{Path, PathBuf};

pub const RESTIC_BIN: &str = "restic";

/// Answers whether the backup engine can be invoked on this host.
pub trait EngineProbe {
    fn binary(&self) -> &str;

    fn is_callable(&self) -> bool;
}

/// Finds the engine binary on `PATH`, or at the given path if it has a directory part.
#[derive(Clone, Debug)]
pub struct PathLookup {
    binary: String,
}

impl PathLookup {
    pub fn new<S: Into<String>>(binary: S) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn locate(&self) -> Option<PathBuf> {
        let binary = Path::new(&self.binary);
        if binary.components().count() > 1 {
            return is_executable(binary).then(|| binary.to_path_buf());
        }
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths)
            .flat_map(|dir| candidates(&dir, &self.binary))
            .find(|candidate| is_executable(candidate))
    }
}

impl Default for PathLookup {
    fn default() -> Self {
        Self::new(RESTIC_BIN)
    }
}

impl EngineProbe for PathLookup {
    fn binary(&self) -> &str {
        &self.binary
    }

    fn is_callable(&self) -> bool {
        match self.locate() {
            Some(found) => {
                tracing::debug!("Found {} at {:?}", self.binary, found);
                true
            }
            None => false,
        }
    }
}

#[cfg(windows)]
fn candidates(dir: &Path, binary: &str) -> Vec<PathBuf> {
    vec![dir.join(binary), dir.join(format!("{binary}.exe"))]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, binary: &str) -> Vec<PathBuf> {
    vec![dir.join(binary)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
