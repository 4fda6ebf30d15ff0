//! Error types.
//!
//! Library code returns one of two typed errors:
//!
//! - [`ConfigurationError`]: the portfolio root is unusable (fatal at startup)
//! - [`DataFormatError`]: a single file could not be parsed (recovered by the caller)
//!
//! The binary boundary converts everything into [`AppError`], which carries the
//! process exit code and a one-line user-facing message.

use std::path::PathBuf;

use thiserror::Error;

/// The portfolio root cannot be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Portfolio root '{}' not found. Expected layout: <root>/<Site>/<Generation|Price|Price_da|Revenue>/", .0.display())]
    RootNotFound(PathBuf),

    #[error("Portfolio root '{}' is not a directory.", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("Failed to read portfolio root '{}': {message}", .path.display())]
    RootUnreadable { path: PathBuf, message: String },
}

/// A single data file could not be turned into a table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataFormatError {
    #[error("failed to open '{}': {message}", .path.display())]
    Open { path: PathBuf, message: String },

    #[error("'{}' has no header row", .path.display())]
    MissingHeader { path: PathBuf },

    #[error("'{}' line {line}: CSV parse error: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("'{}' line {line}: column `{column}` value '{value}' is not a valid {column}", .path.display())]
    TimeColumn {
        path: PathBuf,
        line: usize,
        column: String,
        value: String,
    },

    #[error("'{}': {message}", .path.display())]
    Content { path: PathBuf, message: String },
}

impl DataFormatError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            DataFormatError::Open { path, .. }
            | DataFormatError::MissingHeader { path }
            | DataFormatError::Parse { path, .. }
            | DataFormatError::TimeColumn { path, .. }
            | DataFormatError::Content { path, .. } => path,
        }
    }
}

/// Process-level error: exit code plus message.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ConfigurationError> for AppError {
    fn from(err: ConfigurationError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl From<DataFormatError> for AppError {
    fn from(err: DataFormatError) -> Self {
        AppError::new(3, format!("Visualization unavailable: {err}"))
    }
}
