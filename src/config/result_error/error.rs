use crate::config::model::EntityKind;
use crate::config::result_error::{AddFunctionName, AddMsg};
use crate::sysexits;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error("config could not be loaded/found: {0}")]
    ConfigLoad(String),
    #[error("could not parse config file {path:?}:\n{}", indent::indent_all_with("  ", error.to_string()))]
    ConfigParse {
        path: PathBuf,
        #[source]
        error: serde_yml::Error,
    },
    #[error("cannot resolve {path:?}: home directory is unknown")]
    HomeResolution { path: String },
    #[error("{kind} {name:?} is invalid:\n{}", indent::indent_all_with("  ", errors.to_string()))]
    Validation {
        kind: EntityKind,
        name: String,
        errors: validator::ValidationErrors,
    },
    #[error("{0}")]
    Selection(String),
    #[error("could not write backup copy {to:?} of {from:?}: {error}")]
    BackupCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("{binary} was not found. Install it or add it to PATH")]
    EngineUnavailable { binary: String },
    #[error("{kind} {name:?} already exists")]
    Duplicate { kind: EntityKind, name: String },
    #[error("{kind} {name:?} does not exist")]
    UnknownEntity { kind: EntityKind, name: String },
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{} failed:\n{}", fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithFnName { fn_name: String, error: Box<Error> },
    #[error(transparent)]
    Shared(Arc<Error>),
}

impl<S: Into<String>> AddFunctionName<S> for Error {
    fn add_fn_name(self, fn_name: S) -> Self {
        Error::WithFnName {
            fn_name: fn_name.into(),
            error: Box::new(self),
        }
    }
}

impl<S: Into<String>> AddMsg<S> for Error {
    fn add_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    pub fn selection<S: Into<String>>(msg: S) -> Self {
        Self::Selection(msg.into())
    }

    /// Innermost error, with context wrappers and shared caches peeled off.
    pub fn root(&self) -> &Error {
        match self {
            Error::WithMsg { error, .. } | Error::WithFnName { error, .. } => error.root(),
            Error::Shared(error) => error.root(),
            e => e,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.root() {
            Error::ConfigParse { .. } => sysexits::EX_CONFIG,
            Error::ConfigLoad(_) => sysexits::EX_NOINPUT,
            Error::Validation { .. } | Error::Duplicate { .. } => sysexits::EX_DATAERR,
            Error::Selection(_) | Error::UnknownEntity { .. } => sysexits::EX_USAGE,
            Error::EngineUnavailable { .. } => sysexits::EX_UNAVAILABLE,
            Error::BackupCopy { .. } => sysexits::EX_CANTCREAT,
            Error::Io(_) | Error::SerdeYml(_) => sysexits::EX_IOERR,
            Error::HomeResolution { .. } => sysexits::EX_FAILURE,
            Error::WithMsg { .. } | Error::WithFnName { .. } | Error::Shared(_) => {
                sysexits::EX_FAILURE
            }
        }
    }
}
