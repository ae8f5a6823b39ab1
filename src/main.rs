use clap::{Parser, Subcommand};
use restic_orchestra::config::engine::PathLookup;
use restic_orchestra::config::result_error::error::Error;
use restic_orchestra::config::result_error::result::Result;
use restic_orchestra::config::selector::{BackendSelection, LocationSelection};
use restic_orchestra::config::store::{ConfigSource, ConfigStore};
use restic_orchestra::config::validate::check_all;
use std::path::PathBuf;
use std::process::exit;
use tracing::error;

/// Configuration driven orchestrator for restic backups
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file, searched in the working and home directory if omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Skip the env file, for scheduled runs
    #[arg(long, global = true)]
    lean: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the config file and that the backup engine is installed
    Check,
    /// Show the parsed config
    Info {
        /// Print JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Print the selected backends
    Backends {
        #[command(flatten)]
        selection: BackendSelection,
    },
    /// Print the selected locations
    Locations {
        #[command(flatten)]
        selection: LocationSelection,
    },
    /// Print the engine flags for one command on a location/backend pair
    Options {
        /// Engine command, e.g. backup or forget
        command: String,
        #[arg(short, long)]
        location: String,
        #[arg(short, long)]
        backend: String,
    },
    /// Rename a backend and every reference to it, then save
    RenameBackend { old: String, new: String },
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let source = match &args.config {
        Some(path) => ConfigSource::Explicit(path.clone()),
        None => ConfigSource::default_search(),
    };
    let store = ConfigStore::new(source).lean(args.lean);

    if let Err(e) = run(&args.command, &store) {
        error!("{e}");
        if matches!(e.root(), Error::ConfigParse { .. }) {
            error!("Could not parse config file!");
        }
        exit(e.exit_code());
    }
}

fn run(command: &Command, store: &ConfigStore) -> Result<()> {
    match command {
        Command::Check => {
            check_all(store, &PathLookup::default())?;
            println!("Everything is fine.");
        }
        Command::Info { json } => {
            let described = store.load()?.describe();
            if *json {
                let out = serde_json::to_string_pretty(&described)
                    .map_err(|e| Error::Io(e.into()))?;
                println!("{out}");
            } else {
                print!("{}", serde_yml::to_string(&described)?);
            }
        }
        Command::Backends { selection } => {
            selection.resolve(store.load()?)?.iter().for_each(|n| println!("{n}"));
        }
        Command::Locations { selection } => {
            selection.resolve(store.load()?)?.iter().for_each(|n| println!("{n}"));
        }
        Command::Options {
            command,
            location,
            backend,
        } => {
            let config = store.load()?;
            let location = config.location(location)?;
            let backend = config.backend(backend)?;
            if !location.targets(backend.name()) {
                tracing::warn!(
                    "Location {:?} does not back up to {:?}",
                    location.name(),
                    backend.name()
                );
            }
            println!("{}", config.combine_options(command, location, backend).join(" "));
        }
        Command::RenameBackend { old, new } => {
            let mut config = store.load()?.clone();
            config.rename_backend(old, new)?;
            config.check()?;
            store.save(&config)?;
        }
    }
    Ok(())
}
