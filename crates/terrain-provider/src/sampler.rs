//! Sampling abstraction: the injected elevation and mask data sources.
//!
//! Both samplers are opaque to the pipeline; no interpolation, unit
//! conversion, or coordinate translation happens on their inputs or outputs.

use async_trait::async_trait;
use terrain_common::GeoPoint;
use thiserror::Error;

/// Errors surfaced by external samplers.
///
/// `Clone` so a failure can be fanned out to every caller sharing one
/// in-flight request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("sampler failed: {0}")]
    Source(String),

    #[error("sampler returned {got} samples, expected {expected}")]
    ShapeMismatch { expected: usize, got: usize },
}

/// Asynchronous elevation source.
#[async_trait]
pub trait ValueSampler: Send + Sync {
    /// Sample one height (meters) per input coordinate, same order.
    async fn sample_values(
        &self,
        coordinates: &[GeoPoint],
        level: u32,
    ) -> Result<Vec<f32>, SampleError>;
}

/// Asynchronous mask source: per-coordinate weights in [0, 1].
#[async_trait]
pub trait MaskSampler: Send + Sync {
    /// Sample one weight per input coordinate, same order.
    async fn sample_mask(&self, coordinates: &[GeoPoint]) -> Result<Vec<f32>, SampleError>;
}

/// Default mask sampler: every coordinate fully opaque/valid.
pub struct OpaqueMask;

#[async_trait]
impl MaskSampler for OpaqueMask {
    async fn sample_mask(&self, coordinates: &[GeoPoint]) -> Result<Vec<f32>, SampleError> {
        Ok(vec![1.0; coordinates.len()])
    }
}
