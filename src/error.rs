//! Fluid subsystem error handling

use thiserror::Error;

use crate::fluid::{FlowKind, TexelFormat};

/// Type alias for fluid operation results
pub type FluidResult<T> = Result<T, FluidError>;

#[derive(Debug, Error)]
pub enum FluidError {
    #[error("Resolution mismatch for {kind}: expected {expected:?}, got {actual:?}")]
    ResolutionMismatch {
        kind: FlowKind,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions {
        width: usize,
        height: usize,
    },

    #[error("Unsupported texel format {format:?}: {reason}")]
    UnsupportedFormat {
        format: TexelFormat,
        reason: &'static str,
    },

    #[error("Field data length mismatch: expected {expected} values, got {actual}")]
    DataLength {
        expected: usize,
        actual: usize,
    },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for FluidError {
    fn from(err: toml::de::Error) -> Self {
        FluidError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FluidError {
    fn from(err: toml::ser::Error) -> Self {
        FluidError::Config(err.to_string())
    }
}
