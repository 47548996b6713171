//! Error types for isosurface extraction

use thiserror::Error;

use glam::IVec3;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, CmsError>;

/// Errors that abort an extraction run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CmsError {
    /// Configuration rejected before any sampling work
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sample grid too coarse to be usable
    #[error("Insufficient resolution: {samples} samples per axis, need at least {minimum}")]
    InsufficientResolution { samples: usize, minimum: usize },

    /// The scalar field produced NaN or infinity while sampling
    #[error("Non-finite field value {value} at ({}, {}, {})", position[0], position[1], position[2])]
    NonFiniteSample { position: [f64; 3], value: f64 },

    /// Face sign code missing from the disambiguation table
    #[error("Unmapped face sign code: {0:#06b}")]
    UnmappedSignCode(u8),

    /// A face edge selected by the table carries no sign change
    #[error("No sign change between {from} and {to}")]
    MissingSignChange { from: IVec3, to: IVec3 },

    /// Expression field failed to compile
    #[error("Expression error: {0}")]
    Expression(String),
}
