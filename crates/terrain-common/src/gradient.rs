//! Elevation color gradient: ordered stops and piecewise-linear evaluation.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Channels as floats in [0, 1].
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Parse a "#RRGGBB" or "#RRGGBBAA" hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        let a = if hex.len() == 8 {
            u8::from_str_radix(&hex[6..8], 16).ok()?
        } else {
            255
        };

        Some(Self { r, g, b, a })
    }
}

/// A single gradient stop: a data value and the color at that value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub value: f32,
    pub color: Color,
}

impl GradientStop {
    pub fn new(value: f32, color: Color) -> Self {
        Self { value, color }
    }
}

/// An ordered-by-value color ramp.
///
/// Values below the first stop clamp to the first stop's color, values above
/// the last clamp to the last. Two stops sharing a value form a hard color
/// edge (step function at that value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    /// Build a gradient from a stop list. Requires at least two stops.
    ///
    /// Stops are sorted by value; the sort is stable, so the declared order
    /// of duplicate-value stops is preserved.
    pub fn new(mut stops: Vec<GradientStop>) -> ConfigResult<Self> {
        if stops.len() < 2 {
            return Err(ConfigError::GradientStops(stops.len()));
        }
        stops.sort_by(|a, b| {
            a.value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(Self { stops })
    }

    /// Load a gradient from a JSON stop list.
    pub fn from_json(json_str: &str) -> ConfigResult<Self> {
        let stops: Vec<GradientStop> = serde_json::from_str(json_str)?;
        Self::new(stops)
    }

    /// Load a gradient from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// A neutral grayscale hypsometric ramp from 0 m to 4000 m.
    pub fn grayscale_elevation() -> Self {
        Self {
            stops: vec![
                GradientStop::new(0.0, Color::new(40, 40, 40, 255)),
                GradientStop::new(4000.0, Color::new(255, 255, 255, 255)),
            ],
        }
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Evaluate the ramp at `value`, returning RGBA channels in [0, 1].
    ///
    /// Alpha interpolates like the color channels.
    pub fn color_at(&self, value: f32) -> [f32; 4] {
        let stops = &self.stops;

        if value <= stops[0].value {
            return stops[0].color.to_f32();
        }
        let last = stops[stops.len() - 1];
        if value >= last.value {
            return last.color.to_f32();
        }

        for i in 1..stops.len() {
            if value <= stops[i].value {
                let a = stops[i - 1];
                let b = stops[i];
                let span = b.value - a.value;
                if span <= 0.0 {
                    return b.color.to_f32();
                }
                let t = (value - a.value) / span;
                let ca = a.color.to_f32();
                let cb = b.color.to_f32();
                if t <= 0.0 {
                    return ca;
                }
                if t >= 1.0 {
                    return cb;
                }
                return [
                    ca[0] + t * (cb[0] - ca[0]),
                    ca[1] + t * (cb[1] - ca[1]),
                    ca[2] + t * (cb[2] - ca[2]),
                    ca[3] + t * (cb[3] - ca[3]),
                ];
            }
        }

        last.color.to_f32()
    }

    /// Alpha channel of the ramp at `value`, in [0, 1].
    pub fn alpha_at(&self, value: f32) -> f32 {
        self.color_at(value)[3]
    }
}
