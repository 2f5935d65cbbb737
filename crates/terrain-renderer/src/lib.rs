//! Tile raster rendering for terrain elevation overlays.
//!
//! Turns per-tile elevation and mask sample grids into colored raster tiles:
//! - Byte-packed height encoding with a fractional-remainder channel
//! - Per-pixel shading: gradient ramp + hillshade + contour bands
//! - Contour label planning and stamping
//! - Reusable render surfaces pooled by size

pub mod encoder;
pub mod error;
pub mod font;
pub mod labels;
pub mod pipeline;
pub mod shader;
pub mod surface;
pub mod texture;

pub use error::RenderError;
pub use font::load_label_font;
pub use labels::{format_label_meters, plan_label, stamp_label, LabelPlacement, LabelStyle};
pub use pipeline::TileRenderer;
pub use surface::{PoolStats, SurfacePool};
