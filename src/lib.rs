//! # restic-orchestra
//!
//! Configuration and option-resolution engine for a restic backup orchestrator.
//!
//! ## Features
//!
//! - **Declarative Model**: Named backends and locations loaded from a single YAML file
//! - **Option Merging**: Global, backend and location flags flattened into engine arguments
//! - **Validation**: Structural checks and backend references resolved before anything runs
//! - **Selection**: CLI names, the `--all` shortcut and `name@qualifier` references
//! - **Safe Saves**: A backup copy of the previous file is written before every save
//!
//! ## Quick Start
//!
//! ```no_run
//! use restic_orchestra::config::engine::PathLookup;
//! use restic_orchestra::config::store::{ConfigSource, ConfigStore};
//! use restic_orchestra::config::validate::check_all;
//!
//! let store = ConfigStore::new(ConfigSource::default_search());
//! check_all(&store, &PathLookup::default())?;
//!
//! let config = store.load()?;
//! let location = &config.locations()["home"];
//! let backend = &config.backends()["nas"];
//! let args = config.combine_options("backup", location, backend);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod sysexits;
