// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanner

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera backend errors
    Backend(BackendError),
    /// Configuration errors
    Config(ConfigError),
    /// Terminal or filesystem I/O errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Configuration file errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// No per-user configuration directory on this system
    NoConfigDir,
    /// Reading or writing the file failed
    Io(String),
    /// The file is not valid JSON for [`crate::Config`]
    Parse(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Backend(e) => write!(f, "Camera error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "No configuration directory available"),
            ConfigError::Io(msg) => write!(f, "{}", msg),
            ConfigError::Parse(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ConfigError {}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
