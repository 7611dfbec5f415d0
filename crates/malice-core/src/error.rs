//! Error types for the malice image pipeline.
//!
//! Only input and configuration problems are fatal. Overlay and metadata
//! stages carry their own error types (`overlay::OverlayError`,
//! `metadata::MetadataError`) and recover locally, so they never show up here.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for malice operations.
#[derive(Error, Debug)]
pub enum MaliceError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Writing the output container failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for malice results.
pub type Result<T> = std::result::Result<T, MaliceError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_messages_include_path() {
        let err = PipelineError::UnsupportedFormat {
            path: PathBuf::from("scan.tiff"),
            format: "tiff".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("scan.tiff"));
        assert!(msg.contains("tiff"));

        let err = PipelineError::ImageTooLarge {
            path: PathBuf::from("huge.png"),
            width: 20000,
            height: 100,
            max_dim: 10000,
        };
        assert!(err.to_string().contains("20000x100"));
    }

    #[test]
    fn test_top_level_wraps_pipeline_error() {
        let err: MaliceError = PipelineError::FileNotFound(PathBuf::from("gone.jpg")).into();
        assert!(err.to_string().starts_with("Pipeline error"));
        assert!(err.to_string().contains("gone.jpg"));
    }
}
