//! Loading and saving the config file.
//!
//! A [`ConfigStore`] is built once in `main` and passed by reference to every
//! component that needs the model. The file is parsed at most once per store;
//! every later [`ConfigStore::load`] returns the same model or the same error.

use crate::config::env_file::{env_file_path, load_env_file};
use crate::config::function_path;
use crate::config::model::Config;
use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::result_error::{AddFunctionName, AddMsg};
use function_name::named;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub const CONFIG_FILE_STEM: &str = ".autorestic";
pub const CONFIG_FILE_EXTENSIONS: [&str; 2] = ["yml", "yaml"];
pub const BACKUP_SUFFIX: &str = ".old";

/// Where the config file comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// A path given on the command line. Must exist.
    Explicit(PathBuf),
    /// Candidate paths, first existing one wins.
    Search(Vec<PathBuf>),
}

impl ConfigSource {
    /// `.autorestic.yml` / `.autorestic.yaml` in the working directory, then in the home directory.
    pub fn default_search() -> Self {
        let dirs = std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::home_dir());
        Self::search_in(dirs)
    }

    pub fn search_in<I: IntoIterator<Item = PathBuf>>(dirs: I) -> Self {
        let candidates = dirs
            .into_iter()
            .flat_map(|dir| {
                CONFIG_FILE_EXTENSIONS
                    .iter()
                    .map(move |ext| dir.join(format!("{CONFIG_FILE_STEM}.{ext}")))
            })
            .collect();
        Self::Search(candidates)
    }

    fn locate(&self) -> Result<PathBuf> {
        match self {
            ConfigSource::Explicit(path) => Ok(path.clone()),
            ConfigSource::Search(candidates) => candidates
                .iter()
                .find(|c| c.is_file())
                .cloned()
                .ok_or_else(|| Error::ConfigLoad(format!("no config file found in {candidates:?}"))),
        }
    }
}

#[derive(Debug)]
struct Loaded {
    path: PathBuf,
    config: Config,
}

#[derive(Debug)]
pub struct ConfigStore {
    source: ConfigSource,
    lean: bool,
    loaded: OnceLock<std::result::Result<Loaded, Arc<Error>>>,
}

impl ConfigStore {
    pub fn new(source: ConfigSource) -> Self {
        Self {
            source,
            lean: false,
            loaded: OnceLock::new(),
        }
    }

    /// Lean mode skips the env file, for scheduled runs.
    pub fn lean(mut self, lean: bool) -> Self {
        self.lean = lean;
        self
    }

    /// Parses the config file on first call and returns the cached result afterwards.
    pub fn load(&self) -> Result<&Config> {
        match self.loaded.get_or_init(|| self.read().map_err(Arc::new)) {
            Ok(loaded) => Ok(&loaded.config),
            Err(e) => Err(Error::Shared(e.clone())),
        }
    }

    /// Absolute path of the loaded config file, `None` before a successful load.
    pub fn path(&self) -> Option<&Path> {
        match self.loaded.get() {
            Some(Ok(loaded)) => Some(loaded.path.as_path()),
            _ => None,
        }
    }

    #[named]
    fn read(&self) -> Result<Loaded> {
        let path = self.source.locate()?;
        let path = std::path::absolute(&path)?;
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::ConfigLoad(format!("cannot read {path:?}: {e}")))?;
        let mut config = Config::from_yaml_str(&content).map_err(|error| Error::ConfigParse {
            path: path.clone(),
            error,
        })?;
        tracing::info!("Using config: {:?}", path);

        if !self.lean {
            let env_path = env_file_path(&path);
            match load_env_file(&env_path).add_fn_name(function_path!()) {
                Ok(env) => {
                    tracing::info!("Using env: {:?}", env_path);
                    config.set_env_file(env);
                }
                Err(e) => tracing::debug!("No env file loaded: {e}"),
            }
        }

        Ok(Loaded { path, config })
    }

    /// Writes `config` back to the loaded file, see [`save_to`].
    pub fn save(&self, config: &Config) -> Result<()> {
        let path = self
            .path()
            .ok_or_else(|| Error::ConfigLoad("no config file loaded".into()))?;
        save_to(path, config)
    }
}

pub fn backup_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Copies the current file to `<file>.old`, then replaces its `backends` and
/// `locations` with the in-memory ones. Other top-level keys are kept as they
/// are on disk. If the copy fails the original is left untouched.
#[named]
pub fn save_to<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let path = path.as_ref();
    let backup = backup_path(path);
    fs::copy(path, &backup).map_err(|error| Error::BackupCopy {
        from: path.to_path_buf(),
        to: backup.clone(),
        error,
    })?;
    tracing::info!("Saved a backup copy of {:?} to {:?}", path, backup);

    let on_disk = fs::read_to_string(path)?;
    let mut document = if on_disk.trim().is_empty() {
        serde_yml::Mapping::new()
    } else {
        serde_yml::from_str(&on_disk)?
    };
    document.insert("backends".into(), serde_yml::to_value(config.backends())?);
    document.insert("locations".into(), serde_yml::to_value(config.locations())?);

    fs::write(path, serde_yml::to_string(&document)?)
        .map_err(Error::from)
        .add_msg(format!("Writing config file {path:?} failed"))
        .add_fn_name(function_path!())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::backend::Backend;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
extras:
  note: kept
global:
  forget:
    keep-daily: 7
backends:
  nas:
    type: local
    path: /srv/backup
    env:
      B2_ACCOUNT_KEY: secret
locations:
  home:
    from: [/home/u]
    to: [nas@prod]
    cron: "0 3 * * *"
    hooks:
      before: [echo hi]
    options:
      backup:
        exclude: ["*.tmp", "*.cache"]
        one-file-system: true
"#;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(".autorestic.yml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        fs::write(dir.path().join(".autorestic.env"), "A=1\n").unwrap();
        let store = ConfigStore::new(ConfigSource::Explicit(path.clone()));

        let first = store.load().unwrap();
        fs::write(dir.path().join(".autorestic.env"), "A=2\nB=3\n").unwrap();
        fs::write(&path, "garbage: [").unwrap();
        let second = store.load().unwrap();

        assert!(std::ptr::eq(first, second));
        assert_eq!(second.env_file().len(), 1);
        assert_eq!(second.env_file()["A"].inner(), "1");
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn test_missing_env_file_is_fine() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(ConfigSource::Explicit(write_config(&dir, CONFIG)));
        assert!(store.load().unwrap().env_file().is_empty());
    }

    #[test]
    fn test_lean_skips_env_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        fs::write(dir.path().join(".autorestic.env"), "A=1\n").unwrap();
        let store = ConfigStore::new(ConfigSource::Explicit(path)).lean(true);
        assert!(store.load().unwrap().env_file().is_empty());
    }

    #[test]
    fn test_parse_error_is_cached() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "locations: {}\nunknown: 1\n");
        let store = ConfigStore::new(ConfigSource::Explicit(path.clone()));

        let err = store.load().unwrap_err();
        assert!(matches!(err.root(), Error::ConfigParse { .. }));

        fs::write(&path, CONFIG).unwrap();
        assert!(matches!(store.load().unwrap_err().root(), Error::ConfigParse { .. }));
        assert_eq!(store.path(), None);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(ConfigSource::search_in([dir.path().to_path_buf()]));
        assert!(matches!(store.load().unwrap_err().root(), Error::ConfigLoad(_)));
    }

    #[test]
    fn test_search_prefers_first_candidate() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join(".autorestic.yaml"), CONFIG).unwrap();
        let store = ConfigStore::new(ConfigSource::search_in([
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]));

        assert!(store.load().is_ok());
        assert_eq!(
            store.path(),
            Some(second.path().join(".autorestic.yaml").as_path())
        );
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        let store = ConfigStore::new(ConfigSource::Explicit(path.clone()));
        let config = store.load().unwrap();

        store.save(config).unwrap();

        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), CONFIG);
        let reloaded = ConfigStore::new(ConfigSource::Explicit(path)).lean(true);
        let reloaded = reloaded.load().unwrap();
        assert_eq!(reloaded.backends(), config.backends());
        assert_eq!(reloaded.locations(), config.locations());
        assert_eq!(reloaded.global(), config.global());
        assert_eq!(reloaded.extras(), config.extras());
    }

    #[test]
    fn test_save_mutation() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        let store = ConfigStore::new(ConfigSource::Explicit(path.clone()));
        let mut config = store.load().unwrap().clone();
        config
            .add_backend(
                "usb",
                Backend::builder().backend_type("local").path("/mnt/usb").build(),
            )
            .unwrap();
        config.rename_backend("nas", "server").unwrap();

        store.save(&config).unwrap();

        let reloaded = ConfigStore::new(ConfigSource::Explicit(path));
        let reloaded = reloaded.load().unwrap();
        assert_eq!(reloaded.names(crate::config::model::EntityKind::Backend), vec!["server", "usb"]);
        assert_eq!(reloaded.locations()["home"].to()[0].as_str(), "server@prod");
        assert!(reloaded.check().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_backup_leaves_original() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        // A directory where the backup file should go makes the copy fail.
        fs::create_dir(backup_path(&path)).unwrap();

        let config = Config::from_yaml_str("").unwrap();
        let err = save_to(&path, &config).unwrap_err();

        assert!(matches!(err, Error::BackupCopy { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG);
    }

    #[test]
    fn test_save_without_load() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(ConfigSource::Explicit(dir.path().join("x.yml")));
        assert!(store.save(&Config::default()).is_err());
    }
}
