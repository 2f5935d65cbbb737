//! Contour label placement and stamping.
//!
//! At most one label is placed per tile: the heuristic picks a contour value
//! near the tile's median elevation, finds the closest matching sample away
//! from the tile edges, and orients the text along the local elevation
//! contour.

use image::{imageops::overlay, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_text_mut};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use rusttype::{point, Font, Scale};
use std::cmp::Ordering;
use std::f32::consts::FRAC_PI_2;
use terrain_common::Color;

/// Fraction of the grid excluded on each edge when searching for a label
/// site; labels placed at tile edges clash visually across tile boundaries.
const BORDER: f32 = 0.25;

/// Central-difference offset for the orientation estimate, as a fraction of
/// the grid size.
const DELTA_SIZE: f32 = 0.2;

/// Minimum mask weight under a label site.
const MASK_OPAQUE_MIN: f32 = 0.9;

/// A chosen label site within a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    /// Pixel coordinates in the rendered tile.
    pub px: f32,
    pub py: f32,
    /// Text rotation in radians; runs along the local contour.
    pub angle: f32,
    /// The contour value the label names.
    pub value: f32,
}

/// Text styling for stamped labels.
#[derive(Debug, Clone, Copy)]
pub struct LabelStyle {
    pub font_size: f32,
    pub text_color: Color,
    pub outline_color: Color,
    /// Draw a marker dot at the placement point.
    pub debug_marker: bool,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            text_color: Color::new(255, 255, 255, 255),
            outline_color: Color::new(0, 0, 0, 128),
            debug_marker: false,
        }
    }
}

/// Default label formatter: whole meters, e.g. `"10 m"`.
pub fn format_label_meters(value: f32) -> String {
    format!("{} m", value.round() as i64)
}

/// Decide whether and where to place a contour label.
///
/// `values` is the `grid_size^2` elevation grid, `mask` the `mask_size^2`
/// mask grid (resolutions may differ). `should_render` is the caller's
/// visibility predicate for the candidate value. Returns `None` when no
/// acceptable site exists.
pub fn plan_label(
    values: &[f32],
    grid_size: usize,
    mask: &[f32],
    mask_size: usize,
    major_interval: f32,
    minor_interval: f32,
    tile_size: u32,
    should_render: impl Fn(f32) -> bool,
) -> Option<LabelPlacement> {
    let n = grid_size;
    if n < 2 || values.len() != n * n {
        return None;
    }
    if mask_size == 0 || mask.len() != mask_size * mask_size {
        return None;
    }
    if major_interval <= 0.0 || minor_interval <= 0.0 {
        return None;
    }

    let median = approx_median(values);
    let candidate = (median / major_interval).round() * major_interval;

    // Restrict the search to the central 50% of the grid.
    let lo = n as f32 * BORDER;
    let hi = n as f32 * (1.0 - BORDER);
    let restricted: Vec<(usize, f32)> = values
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            let x = (i % n) as f32;
            let y = (i / n) as f32;
            x > lo && x < hi && y > lo && y < hi
        })
        .map(|(i, &value)| (i, value))
        .collect();

    let (min_value, max_value) = restricted
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, v)| {
            (lo.min(v), hi.max(v))
        });

    if candidate < min_value || candidate > max_value || !should_render(candidate) {
        return None;
    }

    let (best_index, best_value) = restricted.into_iter().min_by(|a, b| {
        (a.1 - candidate)
            .abs()
            .partial_cmp(&(b.1 - candidate).abs())
            .unwrap_or(Ordering::Equal)
    })?;

    if (best_value - candidate).abs() > minor_interval * 0.5 {
        return None;
    }

    let gx = best_index % n;
    let gy = best_index / n;

    let px = gx as f32 * tile_size as f32 / n as f32;
    let py = gy as f32 * tile_size as f32 / n as f32;

    // Map the site onto the (possibly different-resolution) mask grid by
    // proportional index rounding.
    let mx = ((gx as f32 * mask_size as f32 / n as f32).round() as usize).min(mask_size - 1);
    let my = ((gy as f32 * mask_size as f32 / n as f32).round() as usize).min(mask_size - 1);
    if mask[my * mask_size + mx] < MASK_OPAQUE_MIN {
        return None;
    }

    let angle = gradient_angle(values, n, gx, gy);

    Some(LabelPlacement {
        px,
        py,
        angle,
        value: candidate,
    })
}

/// Approximate median: sort, take the middle element.
fn approx_median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted[sorted.len() / 2]
}

/// Local elevation gradient direction, rotated a quarter turn so the label
/// runs along the contour rather than across it.
fn gradient_angle(values: &[f32], n: usize, gx: usize, gy: usize) -> f32 {
    let delta = ((n as f32 * DELTA_SIZE).floor() as isize).max(1);
    let max = n as isize - 1;

    let value_at = |dx: isize, dy: isize| {
        let x = (gx as isize + dx).clamp(0, max) as usize;
        let y = (gy as isize + dy).clamp(0, max) as usize;
        values[y * n + x]
    };

    let dx = value_at(delta, 0) - value_at(-delta, 0);
    let dy = value_at(0, delta) - value_at(0, -delta);

    dy.atan2(dx) + FRAC_PI_2
}

/// Stamp a label onto the rendered tile: outline pass, then fill pass,
/// rotated to the placement angle.
pub fn stamp_label(
    raster: &mut RgbaImage,
    placement: &LabelPlacement,
    text: &str,
    font: &Font<'_>,
    style: &LabelStyle,
) {
    let scale = Scale::uniform(style.font_size);
    let v_metrics = font.v_metrics(scale);
    let text_height = v_metrics.ascent - v_metrics.descent;

    let text_width = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .last()
        .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0);
    if text_width <= 0.0 {
        return;
    }

    // Square canvas wide enough to hold the text at any rotation, plus room
    // for the outline offsets.
    let pad = 3.0;
    let side = ((text_width + 2.0 * pad)
        .hypot(text_height + 2.0 * pad))
    .ceil() as u32;
    let mut canvas = RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 0]));

    let tx = ((side as f32 - text_width) / 2.0) as i32;
    let ty = ((side as f32 - text_height) / 2.0) as i32;

    let outline = rgba(style.outline_color);
    for (dx, dy) in [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ] {
        draw_text_mut(&mut canvas, outline, tx + dx, ty + dy, scale, font, text);
    }
    draw_text_mut(&mut canvas, rgba(style.text_color), tx, ty, scale, font, text);

    let rotated = rotate_about_center(
        &canvas,
        placement.angle,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    );

    let half = side as i64 / 2;
    overlay(
        raster,
        &rotated,
        placement.px as i64 - half,
        placement.py as i64 - half,
    );

    if style.debug_marker {
        draw_filled_circle_mut(
            raster,
            (placement.px as i32, placement.py as i32),
            3,
            Rgba([255, 0, 0, 255]),
        );
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}
