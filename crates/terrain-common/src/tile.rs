//! Tile addressing for the quadtree tiling scheme.

use serde::{Deserialize, Serialize};

/// Address of one tile in a quadtree tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
    /// Zoom level
    pub level: u32,
}

impl TileAddress {
    pub fn new(x: u32, y: u32, level: u32) -> Self {
        Self { x, y, level }
    }

    /// Generate the cache key string for this address.
    pub fn cache_key(&self) -> String {
        format!("{}:{}:{}", self.x, self.y, self.level)
    }
}
