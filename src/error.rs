//! Domain-specific error types for neuroml-widgets

use thiserror::Error;

/// Main error type for the widget library
#[derive(Error, Debug)]
pub enum WidgetsError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("XML error: {message}")]
    Xml { message: String },

    #[error("Unit error: cannot split quantity '{value}'")]
    Unit { value: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Runner error: {runner} failed on {file}: {message}")]
    Runner {
        runner: String,
        file: String,
        message: String,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl WidgetsError {
    /// Wrap an I/O failure together with the path it happened on
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        WidgetsError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// quick-xml reports reader, attribute and writer failures with
    /// different types; all of them end up here
    pub fn xml(err: impl std::fmt::Display) -> Self {
        WidgetsError::Xml {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for WidgetsError {
    fn from(err: anyhow::Error) -> Self {
        WidgetsError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for WidgetsError {
    fn from(err: std::io::Error) -> Self {
        WidgetsError::Io {
            path: "<unknown>".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for WidgetsError {
    fn from(err: serde_json::Error) -> Self {
        WidgetsError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WidgetsError {
    fn from(err: toml::de::Error) -> Self {
        WidgetsError::Config {
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for WidgetsError {
    fn from(err: quick_xml::Error) -> Self {
        WidgetsError::xml(err)
    }
}

/// Result type alias for widget operations
pub type Result<T> = std::result::Result<T, WidgetsError>;
