//! Error types for terrain-overlay configuration.

use thiserror::Error;

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Construction-time configuration errors.
///
/// These are fatal: a provider or renderer refuses to build with an invalid
/// configuration. Per-tile runtime failures are handled elsewhere and never
/// surface through this type.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("gradient requires at least 2 stops, got {0}")]
    GradientStops(usize),

    #[error("tile size must be nonzero")]
    TileSize,

    #[error("value grid size must be at least 2, got {0}")]
    GridSize(usize),

    #[error("mask grid size must be at least 2, got {0}")]
    MaskSize(usize),

    #[error("{name} must be within [0, 1], got {value}")]
    AmountRange { name: &'static str, value: f32 },

    #[error("contour intervals must be positive, got major={major} minor={minor}")]
    ContourInterval { major: f32, minor: f32 },

    #[error("invalid gradient definition: {0}")]
    GradientParse(#[from] serde_json::Error),

    #[error("failed to read gradient file: {0}")]
    GradientFile(#[from] std::io::Error),
}
