//! Byte-packed height encoding for the shading stage.
//!
//! Elevations are normalized by the tile's own min/max to [0, 255] and split
//! into four bytes per sample. Byte 0 carries the integer part, byte 1 the
//! fractional remainder scaled to [0, 255], which preserves sub-byte
//! precision through the 8-bit texels. Bytes 2 and 3 carry the value offset
//! by +0.5 and +0.75.
//!
//! Note: the offset channels are incorrect but reduce visual artefacts;
//! they are kept bit-for-bit because the shading stage's decode was derived
//! against them.

/// Tiles whose min/max span is below this are treated as flat.
pub const FLAT_THRESHOLD: f32 = 0.001;

/// A height grid packed into 4-byte texels, plus the tile's value range.
#[derive(Debug, Clone)]
pub struct EncodedHeights {
    /// 4 bytes per sample: (floor, frac * 255, value + 0.5, value + 0.75).
    pub texels: Vec<u8>,
    /// Minimum height in the tile, meters.
    pub min: f32,
    /// Maximum height in the tile, meters.
    pub max: f32,
}

impl EncodedHeights {
    /// Whether the tile is effectively flat (normalization was forced to 0).
    pub fn is_flat(&self) -> bool {
        self.max - self.min < FLAT_THRESHOLD
    }
}

/// Pack a height sequence into the 4-channel byte encoding.
///
/// Near-flat tiles (max - min < 0.001) normalize every sample to 0, avoiding
/// division blow-up and noise amplification on flat terrain.
pub fn encode_heights(heights: &[f32]) -> EncodedHeights {
    if heights.is_empty() {
        return EncodedHeights {
            texels: Vec::new(),
            min: 0.0,
            max: 0.0,
        };
    }

    let (min, max) = heights
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        });
    let delta = max - min;

    let mut texels = Vec::with_capacity(heights.len() * 4);
    for &height in heights {
        let n = if delta < FLAT_THRESHOLD {
            0.0
        } else {
            (height - min) / delta
        };
        let value = n * 255.0;

        let floor = value.floor();
        let frac = value - floor;

        texels.push(value as u8);
        texels.push((frac * 255.0) as u8);
        texels.push((value + 0.5) as u8);
        texels.push((value + 0.75) as u8);
    }

    EncodedHeights { texels, min, max }
}

/// Reconstruct the normalized value in [0, 1] from the first two channels.
pub fn decode_normalized(b0: u8, b1: u8) -> f32 {
    (b0 as f32 + b1 as f32 / 255.0) / 255.0
}

/// Quantize a mask grid of [0, 1] weights to single-channel bytes.
pub fn encode_mask(mask: &[f32]) -> Vec<u8> {
    mask.iter()
        .map(|&m| (m.clamp(0.0, 1.0) * 255.0) as u8)
        .collect()
}
