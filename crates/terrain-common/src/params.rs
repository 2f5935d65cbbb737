//! Shading parameters shared by one provider across all tile renders.

use crate::gradient::Color;
use serde::{Deserialize, Serialize};

/// Per-provider shading configuration.
///
/// The three `*_amount` fields are blend weights in [0, 1], not booleans;
/// partially blended visuals are supported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderParameters {
    /// Interval between emphasized (major) contours, in data units.
    pub major_contour_interval: f32,
    /// Interval between minor contours, in data units.
    pub minor_contour_interval: f32,
    /// Weight of the gradient color ramp contribution.
    pub gradient_amount: f32,
    /// Weight of the hillshade contribution.
    pub hillshade_amount: f32,
    /// Weight of the contour band contribution.
    pub contour_amount: f32,
    /// Contours and labels are suppressed where the gradient alpha at the
    /// local value falls below this threshold.
    pub contour_opacity_threshold: f32,
    /// Drive contour bands by local slope magnitude instead of elevation.
    pub use_slope_shading: bool,
    /// Color of contour bands.
    pub contour_color: Color,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            major_contour_interval: 100.0,
            minor_contour_interval: 20.0,
            gradient_amount: 1.0,
            hillshade_amount: 1.0,
            contour_amount: 0.0,
            contour_opacity_threshold: 0.5,
            use_slope_shading: false,
            contour_color: Color::new(0, 0, 0, 255),
        }
    }
}

/// Hillshade illumination configuration.
///
/// Defaults reproduce the historically fixed sun position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Illumination {
    /// Sun zenith angle in radians.
    pub zenith: f32,
    /// Sun azimuth angle in radians.
    pub azimuth: f32,
    /// Vertical exaggeration applied to slopes.
    pub z_factor: f32,
}

impl Default for Illumination {
    fn default() -> Self {
        Self {
            zenith: 0.785_714_3,
            azimuth: 2.357_142_9,
            z_factor: 0.75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_illumination() {
        let illum = Illumination::default();
        assert!((illum.zenith - 0.7857143).abs() < 1e-6);
        assert!((illum.azimuth - 2.3571429).abs() < 1e-6);
        assert!((illum.z_factor - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_default_parameters_have_no_contours() {
        let params = RenderParameters::default();
        assert_eq!(params.contour_amount, 0.0);
        assert!(params.major_contour_interval > params.minor_contour_interval);
    }
}
