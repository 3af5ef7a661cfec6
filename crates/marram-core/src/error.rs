use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the engine.
pub type PackResult<T> = Result<T, PackError>;

/// Core error type for packager operations.
///
/// The enum is `Clone` because a settled cache entry hands the same error to
/// every caller that requested the asset, now or later (see
/// [`crate::cache::AssetCache`]). `Io` therefore carries a rendered message
/// instead of the non-cloneable `std::io::Error`.
#[derive(Error, Debug, Clone)]
pub enum PackError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot resolve '{id}' from {basedir}: no matching file under registered extensions (tried {tried:?})")]
    Resolution {
        id: String,
        basedir: PathBuf,
        tried: Vec<PathBuf>,
    },

    #[error("compile error in {path}: {message}")]
    Compile { path: PathBuf, message: String },

    #[error("analyze error in {path}: {message}")]
    Analyze { path: PathBuf, message: String },

    #[error("[{plugin}] {message}")]
    Plugin { plugin: String, message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl PackError {
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    #[must_use]
    pub fn compile(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Compile {
            path: path.into(),
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn analyze(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Analyze {
            path: path.into(),
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn plugin(plugin: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
