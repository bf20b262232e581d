//! Error types for surfbind-model

use std::io;
use std::path::PathBuf;

use surfbind_inp::{ParseError, ParseErrorKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{}: {source}", origin.display())]
    Parse {
        origin: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Export failed for {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Error category used in sweep reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    Validation,
    MissingFile,
    Export,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::MissingFile => "MissingFileError",
            ErrorKind::Export => "ExportError",
        }
    }
}

impl ModelError {
    pub fn parse(origin: impl Into<PathBuf>, source: ParseError) -> Self {
        ModelError::Parse {
            origin: origin.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ModelError::Validation(message.into())
    }

    /// A declared-count mismatch is a validation failure even though the
    /// parser detects it. An input that exists but cannot be read (permission
    /// denied, a directory in place of a file) is reported with missing files,
    /// unless its bytes are not text, which is a parse failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::Parse { source, .. } if source.kind == ParseErrorKind::CountMismatch => {
                ErrorKind::Validation
            }
            ModelError::Parse { .. } => ErrorKind::Parse,
            ModelError::Validation(_) => ErrorKind::Validation,
            ModelError::Io { source, .. } if source.kind() == io::ErrorKind::InvalidData => {
                ErrorKind::Parse
            }
            ModelError::MissingFile(_) | ModelError::Io { .. } => ErrorKind::MissingFile,
            ModelError::Export { .. } => ErrorKind::Export,
        }
    }
}

/// Read a text input, mapping an absent file to [`ModelError::MissingFile`].
pub fn read_input(path: impl Into<PathBuf>) -> Result<String> {
    let path = path.into();
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ModelError::MissingFile(path)),
        Err(source) => Err(ModelError::Io { path, source }),
    }
}
