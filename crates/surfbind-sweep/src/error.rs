//! Sweep-level errors. Per-case failures are recorded in the case outcome,
//! never raised here.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Sweep root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("No cases under {} match prefix `{prefix}`", root.display())]
    NoCases { root: PathBuf, prefix: String },

    #[error("Cannot read sweep configuration {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid sweep configuration {}: {source}", path.display())]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid sweep configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
