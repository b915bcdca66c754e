//! Error types for the fantasy ETL engine.
//!
//! The normalization core (extractor, stat translator, transformers,
//! validator) is total and reports problems through
//! [`crate::result::TransformResult`] and [`crate::result::ValidationResult`].
//! The types here cover the fallible edges around it:
//!
//! - [`ConfigError`] - loading configuration files and env overrides
//! - [`ExportError`] - CSV export of accepted records
//! - [`SinkError`] - persistence hand-off
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading [`crate::config::EtlConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON for the expected shape.
    #[error("Invalid config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value '{value}' for {key}")]
    InvalidOverride { key: String, value: String },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors during CSV export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Underlying CSV writer failed.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// IO error while writing.
    #[error("Export IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Records in one export do not share a column layout.
    #[error("Record {index} has columns [{found}], expected [{expected}]")]
    HeaderMismatch { index: usize, expected: String, found: String },

    /// Buffered output could not be flushed or decoded.
    #[error("Failed to finish CSV output: {0}")]
    Finish(String),
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors raised by a [`crate::sink::RecordSink`] implementation.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Record has no usable natural key.
    #[error("Record has an empty natural key")]
    EmptyKey,

    /// Storage backend refused the write.
    #[error("Sink backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the error type returned by [`crate::pipeline`] entry points that
/// touch the outside world. Per-record problems never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Sink error.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Input is not JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope contains no container with the expected key.
    #[error("No '{container}' or '{item}' found in input")]
    ContainerNotFound { container: String, item: String },

    /// Batch was refused because some items were rejected.
    #[error("Batch blocked: {rejected} of {total} records rejected")]
    Blocked { rejected: usize, total: usize },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let sink_err = SinkError::Backend("disk full".into());
        let pipeline_err: PipelineError = sink_err.into();
        assert!(pipeline_err.to_string().contains("disk full"));

        let config_err = ConfigError::InvalidOverride {
            key: "FANTASY_ETL_REFERENCE_YEAR".into(),
            value: "soon".into(),
        };
        let pipeline_err: PipelineError = config_err.into();
        assert!(pipeline_err.to_string().contains("FANTASY_ETL_REFERENCE_YEAR"));
    }

    #[test]
    fn test_blocked_message() {
        let err = PipelineError::Blocked { rejected: 2, total: 9 };
        assert_eq!(err.to_string(), "Batch blocked: 2 of 9 records rejected");
    }
}
