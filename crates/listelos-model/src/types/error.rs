// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for model construction and trial execution
//!
//! Only setup can fail. Once integration starts a trial always runs to
//! completion; anomalies during the run are recorded as diagnostics.

use listelos_config::ConfigError;

/// Error types for model operations
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Array size mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: ModelError = ConfigError::ValidationError("cues.onsets".to_string()).into();
        assert!(matches!(err, ModelError::Config(_)));
        assert!(err.to_string().contains("cues.onsets"));
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = ModelError::ShapeMismatch {
            expected: 3896,
            actual: 12,
        };
        assert_eq!(err.to_string(), "Array size mismatch: expected 3896, got 12");
    }
}
