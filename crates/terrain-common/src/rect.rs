//! Geographic rectangle type and operations.

use serde::{Deserialize, Serialize};

/// A geographic rectangle in degrees.
///
/// `west`/`east` are longitudes, `south`/`north` latitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRect {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoRect {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Check if this rectangle intersects another.
    pub fn intersects(&self, other: &GeoRect) -> bool {
        self.west < other.east
            && self.east > other.west
            && self.south < other.north
            && self.north > other.south
    }

    /// Compute the intersection of two rectangles.
    pub fn intersection(&self, other: &GeoRect) -> Option<GeoRect> {
        if !self.intersects(other) {
            return None;
        }

        Some(GeoRect {
            west: self.west.max(other.west),
            south: self.south.max(other.south),
            east: self.east.min(other.east),
            north: self.north.min(other.north),
        })
    }
}
