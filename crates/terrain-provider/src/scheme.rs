//! Tiling scheme abstraction.
//!
//! The host viewer owns the real tiling scheme; the provider only needs the
//! tile-address-to-rectangle mapping and the scheme's overall rectangle.

use terrain_common::GeoRect;

/// Maps tile addresses to geographic rectangles.
pub trait TilingScheme: Send + Sync {
    /// The geographic rectangle covered by one tile.
    fn tile_rectangle(&self, x: u32, y: u32, level: u32) -> GeoRect;

    /// The rectangle covered by the scheme as a whole.
    fn scheme_rectangle(&self) -> GeoRect;
}

/// Plain geographic (equirectangular) scheme.
///
/// Level 0 splits the world into a 2x1 grid; each level doubles both axes.
/// Latitude/longitude map linearly, top-left origin at (-180, 90).
#[derive(Debug, Clone, Copy, Default)]
pub struct GeographicTilingScheme;

impl TilingScheme for GeographicTilingScheme {
    fn tile_rectangle(&self, x: u32, y: u32, level: u32) -> GeoRect {
        let cols = 2u64 << level; // 2^(level+1)
        let rows = 1u64 << level;

        let tile_width = 360.0 / cols as f64;
        let tile_height = 180.0 / rows as f64;

        let west = -180.0 + x as f64 * tile_width;
        let north = 90.0 - y as f64 * tile_height;

        GeoRect::new(west, north - tile_height, west + tile_width, north)
    }

    fn scheme_rectangle(&self) -> GeoRect {
        GeoRect::new(-180.0, -90.0, 180.0, 90.0)
    }
}
