//! Error types for tile rendering.

use terrain_common::ConfigError;
use thiserror::Error;

/// Errors raised by the shading stage.
///
/// `Setup` is fatal for the renderer instance; there is no fallback rendering
/// path. Shape errors indicate the caller handed sample buffers that do not
/// match the declared grid sizes.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer setup failed: {0}")]
    Setup(#[from] ConfigError),

    #[error("sample buffer holds {got} values, expected {expected} for a {side}x{side} grid")]
    SampleShape {
        side: usize,
        expected: usize,
        got: usize,
    },

    #[error("could not assemble a {width}x{height} output raster")]
    Surface { width: u32, height: u32 },
}
