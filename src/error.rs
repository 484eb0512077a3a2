//! Error handling module for toolbox
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Expected resolver conditions (empty selection, unknown package, missing
//! platform mapping) are NOT errors here; they travel as structured results.

use thiserror::Error;

use crate::logic::resolver::InvalidSelection;

/// Main error type for toolbox
#[derive(Error, Debug)]
pub enum ToolboxError {
    /// IO errors (catalog, selection and config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog shape or content errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Selection import/export errors
    #[error("Selection error: {0}")]
    Selection(String),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Install command execution errors
    #[error("Execution failed: {0}")]
    Execution(String),

    /// HTTP transport errors (winget.run lookups)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected winget.run responses
    #[error("Winget lookup failed: {0}")]
    Winget(String),

    /// The caller asked for a resolution that cannot be attempted
    #[error(transparent)]
    InvalidSelection(#[from] InvalidSelection),
}

/// Result type alias for toolbox operations
pub type Result<T> = std::result::Result<T, ToolboxError>;

impl ToolboxError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a selection error
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a winget lookup error
    pub fn winget(msg: impl Into<String>) -> Self {
        Self::Winget(msg.into())
    }
}
