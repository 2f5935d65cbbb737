//! Tile request orchestration for terrain elevation overlays.
//!
//! The [`TileProvider`] is the entry point of the pipeline: it culls tile
//! requests by level and extent, drives the external elevation/mask samplers,
//! caches sample results, and hands the grids to the shading stage and label
//! placer.

pub mod cache;
pub mod provider;
pub mod sampler;
pub mod scheme;

pub use cache::{CacheStats, TileSampleCache, TileSamples};
pub use provider::{
    CacheConfig, Capabilities, LabelFormatter, PickedFeature, TileProvider, TileProviderOptions,
};
pub use sampler::{MaskSampler, OpaqueMask, SampleError, ValueSampler};
pub use scheme::{GeographicTilingScheme, TilingScheme};
