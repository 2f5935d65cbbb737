//! Sample grid construction and geodesic tile dimensions.

use crate::rect::GeoRect;
use geo::{GeodesicDistance, Point};
use serde::{Deserialize, Serialize};

/// A geographic sample coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Physical dimensions of a tile in meters, derived from geodesic distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilePhysicalSize {
    pub width: f64,
    pub height: f64,
}

/// Build a regular `grid_size x grid_size` grid of coordinates across a
/// rectangle, row-major with row 0 on the north edge.
///
/// Corner points coincide exactly with the rectangle's corners. Requires
/// `grid_size >= 2` (enforced by provider configuration).
pub fn sample_grid(rect: &GeoRect, grid_size: usize) -> Vec<GeoPoint> {
    debug_assert!(grid_size >= 2);

    let n = grid_size;
    let step = (n - 1) as f64;
    let mut points = Vec::with_capacity(n * n);

    for y in 0..n {
        for x in 0..n {
            let nx = x as f64 / step;
            let ny = 1.0 - y as f64 / step;

            let lon = (1.0 - nx) * rect.west + nx * rect.east;
            let lat = (1.0 - ny) * rect.south + ny * rect.north;

            points.push(GeoPoint::new(lon, lat));
        }
    }

    points
}

/// Compute a rectangle's physical width/height in meters.
///
/// Width is the geodesic surface distance along the north edge (NW to NE),
/// height along the west edge (SW to NW).
pub fn geodesic_size(rect: &GeoRect) -> TilePhysicalSize {
    let north_west = Point::new(rect.west, rect.north);
    let north_east = Point::new(rect.east, rect.north);
    let south_west = Point::new(rect.west, rect.south);

    TilePhysicalSize {
        width: north_west.geodesic_distance(&north_east),
        height: south_west.geodesic_distance(&north_west),
    }
}
