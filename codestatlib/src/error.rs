//! Error types for codestatlib

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while analyzing a single file.
///
/// These never abort a run: the pipeline turns them into an
/// [`AnalysisFailure`](crate::AnalysisFailure) and delivers it to the listener.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Failed to open or read the file
    #[error("failed to read file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File content is not valid UTF-8
    #[error("failed to decode '{path}' at line {line}: not valid UTF-8")]
    Decode { path: PathBuf, line: u64 },

    /// The analyzer panicked while processing the file
    #[error("analyzer panicked on '{path}': {message}")]
    Panicked { path: PathBuf, message: String },
}

impl AnalysisError {
    /// Path of the file the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. } | Self::Decode { path, .. } | Self::Panicked { path, .. } => {
                path
            }
        }
    }
}

/// Errors that can occur while configuring or running a scan
#[derive(Error, Debug)]
pub enum CodeStatError {
    /// A directory entry could not be listed or inspected
    #[error("cannot traverse '{}': {message}", display_path(path))]
    Traversal {
        path: Option<PathBuf>,
        message: String,
    },

    /// Invalid glob pattern
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// Code type definitions could not be parsed
    #[error("invalid code type definitions: {0}")]
    InvalidCodeTypes(String),

    /// A pipeline thread could not be started
    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: String,
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

impl From<walkdir::Error> for CodeStatError {
    fn from(err: walkdir::Error) -> Self {
        Self::Traversal {
            path: err.path().map(|p| p.to_path_buf()),
            message: err
                .io_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| err.to_string()),
        }
    }
}
