//! Label font loading.
//!
//! The label font is loaded once at provider construction. When no explicit
//! path is configured, a few common system font locations are probed;
//! labeling degrades to a no-op when nothing loads.

use rusttype::Font;
use std::path::Path;
use tracing::{debug, warn};

const FALLBACK_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// Load the label font from `path`, or probe the fallback locations.
pub fn load_label_font(path: Option<&Path>) -> Option<Font<'static>> {
    if let Some(path) = path {
        return match load_font_file(path) {
            Some(font) => Some(font),
            None => {
                warn!(path = %path.display(), "could not load configured label font");
                None
            }
        };
    }

    for candidate in FALLBACK_FONT_PATHS {
        if let Some(font) = load_font_file(Path::new(candidate)) {
            debug!(path = candidate, "loaded label font");
            return Some(font);
        }
    }

    warn!("no label font found; contour labels disabled");
    None
}

fn load_font_file(path: &Path) -> Option<Font<'static>> {
    let bytes = std::fs::read(path).ok()?;
    Font::try_from_vec(bytes)
}
