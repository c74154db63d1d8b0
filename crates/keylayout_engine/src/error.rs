//! Unified error types for keylayout_engine

use thiserror::Error;

/// Main error type for layout operations
#[derive(Debug, Error)]
pub enum LayoutError {
    // === Config Parsing Errors ===
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration at '{path}': {message}")]
    InvalidConfig { path: String, message: String },

    #[error("Anchor of '{zone}' references unknown key '{reference}'")]
    UnknownReference { zone: String, reference: String },

    // === Validation Errors ===
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    // === Edit Errors ===
    #[error("Edit rejected: {0}")]
    Rejected(String),

    // === Generation Engine Errors ===
    #[error("Generation engine error: {0}")]
    Engine(String),

    #[error("{0}")]
    Generic(String),
}

impl LayoutError {
    pub(crate) fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        LayoutError::InvalidConfig {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        LayoutError::Rejected(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LayoutError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
}
