//! The per-pixel shading program.
//!
//! Combines three independently weighted contributions:
//! gradient color ramp (by absolute elevation), hillshade (finite-difference
//! slope against a configured sun position), and contour bands at multiples
//! of the major/minor intervals. The mask texture multiplies the final
//! alpha.

use crate::texture::Texture2D;
use terrain_common::{Gradient, Illumination, RenderParameters};

/// Everything the fragment function reads, fixed for one tile render.
pub struct FragmentInput<'a> {
    pub value_texture: &'a Texture2D,
    pub mask_texture: &'a Texture2D,
    pub gradient: &'a Gradient,
    pub params: &'a RenderParameters,
    pub illumination: &'a Illumination,
    /// Minimum height in the tile, meters.
    pub min_height: f32,
    /// Tile min-max span, meters.
    pub height_span: f32,
    /// Flat tile: hillshade and contour contributions are disabled.
    pub flat: bool,
    /// Meters between adjacent value samples, west-east.
    pub cell_width: f32,
    /// Meters between adjacent value samples, north-south.
    pub cell_height: f32,
    /// Meters covered by one output pixel, west-east.
    pub pixel_width: f32,
    /// Meters covered by one output pixel, north-south.
    pub pixel_height: f32,
    /// One value texel step in UV space.
    pub texel_step: f32,
}

/// Relative strength of minor contour bands versus major ones.
const MINOR_BAND_STRENGTH: f32 = 0.45;

/// Evaluate the shading model at one UV coordinate, returning RGBA bytes.
pub fn shade_fragment(input: &FragmentInput, u: f32, v: f32) -> [u8; 4] {
    let params = input.params;
    let illum = input.illumination;

    let elevation_at = |du: f32, dv: f32| {
        input.min_height + input.height_span * input.value_texture.sample(u + du, v + dv)
    };

    let z = elevation_at(0.0, 0.0);

    // Finite-difference slope from the four neighboring texture samples.
    // v grows southward, so dzdy is south minus north.
    let step = input.texel_step;
    let east = elevation_at(step, 0.0);
    let west = elevation_at(-step, 0.0);
    let south = elevation_at(0.0, step);
    let north = elevation_at(0.0, -step);

    let dzdx = (east - west) / (2.0 * input.cell_width);
    let dzdy = (south - north) / (2.0 * input.cell_height);

    let slope = (illum.z_factor * dzdx.hypot(dzdy)).atan();
    let aspect = dzdy.atan2(-dzdx);

    let shade = if input.flat {
        1.0
    } else {
        (illum.zenith.cos() * slope.cos()
            + illum.zenith.sin() * slope.sin() * (illum.azimuth - aspect).cos())
        .clamp(0.0, 1.0)
    };

    let gradient_color = input.gradient.color_at(z);

    // Contour bands, suppressed on flat tiles and where the ramp is too
    // transparent at this elevation.
    let mut contour = 0.0f32;
    if params.contour_amount > 0.0
        && !input.flat
        && gradient_color[3] >= params.contour_opacity_threshold
    {
        let (driver, major_halfwidth, minor_halfwidth) = if params.use_slope_shading {
            let slope_deg = slope.to_degrees();
            (
                slope_deg,
                params.major_contour_interval * 0.075,
                params.minor_contour_interval * 0.05,
            )
        } else {
            // Halfwidth tracks the elevation change across one output pixel,
            // keeping line width roughly constant on screen.
            let per_pixel = (dzdx * input.pixel_width)
                .hypot(dzdy * input.pixel_height)
                .max(1e-4);
            (z, per_pixel * 0.75, per_pixel * 0.5)
        };

        let major = band_strength(driver, params.major_contour_interval, major_halfwidth);
        let minor =
            band_strength(driver, params.minor_contour_interval, minor_halfwidth) * MINOR_BAND_STRENGTH;
        contour = major.max(minor);
    }

    // Compose: gradient fades toward white as its weight drops, hillshade
    // darkens, contours draw over the top, mask gates the final alpha.
    let ga = params.gradient_amount;
    let lit = 1.0 - params.hillshade_amount * (1.0 - shade);
    let strength = contour * params.contour_amount;
    let contour_color = params.contour_color.to_f32();

    let mut rgb = [0.0f32; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let base = 1.0 - ga * (1.0 - gradient_color[i]);
        let shaded = base * lit;
        *channel = shaded + strength * (contour_color[i] - shaded);
    }

    let mask = input.mask_texture.sample(u, v);
    let alpha = gradient_color[3].max(strength * contour_color[3]) * mask;

    [
        to_byte(rgb[0]),
        to_byte(rgb[1]),
        to_byte(rgb[2]),
        to_byte(alpha),
    ]
}

/// 1.0 when `value` lies within `halfwidth` of a multiple of `interval`.
fn band_strength(value: f32, interval: f32, halfwidth: f32) -> f32 {
    if interval <= 0.0 {
        return 0.0;
    }
    let nearest = (value / interval).round() * interval;
    if (value - nearest).abs() <= halfwidth {
        1.0
    } else {
        0.0
    }
}

fn to_byte(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_strength_at_multiples() {
        assert_eq!(band_strength(100.0, 50.0, 1.0), 1.0);
        assert_eq!(band_strength(101.5, 50.0, 1.0), 0.0);
        assert_eq!(band_strength(99.2, 50.0, 1.0), 1.0);
        assert_eq!(band_strength(0.0, 50.0, 1.0), 1.0);
    }

    #[test]
    fn test_band_strength_invalid_interval() {
        assert_eq!(band_strength(10.0, 0.0, 1.0), 0.0);
        assert_eq!(band_strength(10.0, -5.0, 1.0), 0.0);
    }

    #[test]
    fn test_to_byte_rounds() {
        assert_eq!(to_byte(0.0), 0);
        assert_eq!(to_byte(1.0), 255);
        assert_eq!(to_byte(0.5), 128);
        assert_eq!(to_byte(2.0), 255);
        assert_eq!(to_byte(-1.0), 0);
    }
}
