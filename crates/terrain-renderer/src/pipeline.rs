//! The tile shading pipeline: textures in, private raster out.

use crate::encoder::{decode_normalized, encode_heights, encode_mask};
use crate::error::RenderError;
use crate::shader::{shade_fragment, FragmentInput};
use crate::surface::{PoolStats, SurfacePool};
use crate::texture::Texture2D;
use image::RgbaImage;
use rayon::prelude::*;
use terrain_common::{ConfigError, Gradient, Illumination, RenderParameters, TilePhysicalSize};
use tracing::info;

/// Renders elevation/mask sample grids into colored raster tiles.
///
/// Construction validates the whole shading configuration up front; a
/// renderer that failed to build has no fallback path. One renderer instance
/// is shared across all tile renders of its provider; its scratch surface is
/// pooled per size and every call returns an independently owned copy.
pub struct TileRenderer {
    tile_size: u32,
    gradient: Gradient,
    params: RenderParameters,
    illumination: Illumination,
    pool: SurfacePool,
}

impl TileRenderer {
    pub fn new(
        tile_size: u32,
        gradient: Gradient,
        params: RenderParameters,
        illumination: Illumination,
    ) -> Result<Self, ConfigError> {
        if tile_size == 0 {
            return Err(ConfigError::TileSize);
        }

        let amounts = [
            ("gradient_amount", params.gradient_amount),
            ("hillshade_amount", params.hillshade_amount),
            ("contour_amount", params.contour_amount),
            ("contour_opacity_threshold", params.contour_opacity_threshold),
        ];
        for (name, value) in amounts {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::AmountRange { name, value });
            }
        }

        if params.major_contour_interval <= 0.0 || params.minor_contour_interval <= 0.0 {
            return Err(ConfigError::ContourInterval {
                major: params.major_contour_interval,
                minor: params.minor_contour_interval,
            });
        }

        info!(
            tile_size,
            gradient_stops = gradient.stops().len(),
            "shading pipeline ready"
        );

        Ok(Self {
            tile_size,
            gradient,
            params,
            illumination,
            pool: SurfacePool::new(),
        })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    /// Scratch surface pool counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Render one tile.
    ///
    /// `values` must hold `grid_size^2` elevations and `mask` must hold
    /// `mask_size^2` weights, both row-major with row 0 on the north edge.
    /// The two grids may have different resolutions.
    pub fn render(
        &self,
        values: &[f32],
        mask: &[f32],
        grid_size: usize,
        mask_size: usize,
        physical: TilePhysicalSize,
    ) -> Result<RgbaImage, RenderError> {
        if grid_size < 2 {
            return Err(ConfigError::GridSize(grid_size).into());
        }
        if mask_size < 2 {
            return Err(ConfigError::MaskSize(mask_size).into());
        }
        if values.len() != grid_size * grid_size {
            return Err(RenderError::SampleShape {
                side: grid_size,
                expected: grid_size * grid_size,
                got: values.len(),
            });
        }
        if mask.len() != mask_size * mask_size {
            return Err(RenderError::SampleShape {
                side: mask_size,
                expected: mask_size * mask_size,
                got: mask.len(),
            });
        }

        // Upload: pack the heights, quantize the mask, then decode into the
        // two sampled textures. Going through the byte encoding keeps the
        // shading stage working on exactly the values an 8-bit texture holds.
        let encoded = encode_heights(values);
        let flat = encoded.is_flat();

        let normalized: Vec<f32> = encoded
            .texels
            .chunks_exact(4)
            .map(|texel| decode_normalized(texel[0], texel[1]))
            .collect();
        let value_texture = Texture2D::new(normalized, grid_size);

        let mask_levels: Vec<f32> = encode_mask(mask)
            .into_iter()
            .map(|byte| byte as f32 / 255.0)
            .collect();
        let mask_texture = Texture2D::new(mask_levels, mask_size);

        let width = self.tile_size;
        let height = self.tile_size;

        let input = FragmentInput {
            value_texture: &value_texture,
            mask_texture: &mask_texture,
            gradient: &self.gradient,
            params: &self.params,
            illumination: &self.illumination,
            min_height: encoded.min,
            height_span: encoded.max - encoded.min,
            flat,
            cell_width: (physical.width as f32 / (grid_size - 1) as f32).max(f32::MIN_POSITIVE),
            cell_height: (physical.height as f32 / (grid_size - 1) as f32).max(f32::MIN_POSITIVE),
            pixel_width: physical.width as f32 / width as f32,
            pixel_height: physical.height as f32 / height as f32,
            texel_step: 1.0 / grid_size as f32,
        };

        // The quad is inset by half a texel so pixel centers interpolate
        // between samples instead of clamping at the borders.
        let inset = 0.5 / (grid_size as f32 - 1.0);
        let uv_span = 1.0 - 2.0 * inset;

        let raster = self.pool.with_surface(width, height, |buf| {
            let row_bytes = width as usize * 4;
            buf.par_chunks_mut(row_bytes).enumerate().for_each(|(py, row)| {
                let v = inset + (py as f32 + 0.5) / height as f32 * uv_span;
                for px in 0..width as usize {
                    let u = inset + (px as f32 + 0.5) / width as f32 * uv_span;
                    let rgba = shade_fragment(&input, u, v);
                    row[px * 4..px * 4 + 4].copy_from_slice(&rgba);
                }
            });

            RgbaImage::from_raw(width, height, buf.to_vec())
        });

        raster.ok_or(RenderError::Surface { width, height })
    }
}
