//! The tile request orchestrator.
//!
//! Composes culling, sampling, caching, shading, and labeling into the
//! per-tile `request_image` entry point. Every per-tile failure resolves to
//! the blank tile; only construction errors surface to the caller.

use crate::cache::{CacheStats, TileSampleCache, TileSamples};
use crate::sampler::{MaskSampler, OpaqueMask, SampleError, ValueSampler};
use crate::scheme::TilingScheme;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use image::{Rgba, RgbaImage};
use rusttype::Font;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use terrain_common::{
    geodesic_size, sample_grid, Color, ConfigError, ConfigResult, GeoPoint, GeoRect, Gradient,
    GradientStop, Illumination, RenderParameters, TileAddress,
};
use terrain_renderer::{
    format_label_meters, load_label_font, plan_label, stamp_label, LabelStyle, PoolStats,
    TileRenderer,
};
use tracing::{debug, info, warn};

/// Formats a contour value into label text.
pub type LabelFormatter = Arc<dyn Fn(f32) -> String + Send + Sync>;

/// Sample cache sizing.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum number of cached tiles.
    pub capacity: NonZeroUsize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(512).expect("nonzero"),
        }
    }
}

/// Construction-time provider configuration.
///
/// One struct covers all historical provider variants; the capability flags
/// derived from it at construction tell which features are active.
#[derive(Clone)]
pub struct TileProviderOptions {
    /// Rendered tile width/height in pixels.
    pub tile_size: u32,
    /// Elevation sampling resolution per tile axis.
    pub grid_size: usize,
    /// Mask sampling resolution per tile axis.
    pub mask_size: usize,
    /// Requests below this level resolve to the blank tile without sampling.
    pub minimum_tile_level: u32,
    /// Contour intervals in meters.
    pub major_contour: f32,
    pub minor_contour: f32,
    /// Color ramp stops, ordered by value.
    pub gradient: Vec<GradientStop>,
    /// Hard cull: tiles outside this extent resolve to the blank tile.
    pub extent: Option<GeoRect>,
    /// Blend weights in [0, 1].
    pub gradient_amount: f32,
    pub hillshade_amount: f32,
    pub contour_amount: f32,
    /// Drive contour bands by slope magnitude instead of elevation.
    pub use_slope: bool,
    pub contour_color: Color,
    pub contour_opacity_threshold: f32,
    pub illumination: Illumination,
    /// Contour label text size in pixels.
    pub font_size: f32,
    /// Label font file; falls back to probing system locations.
    pub label_font: Option<PathBuf>,
    pub text_color: Color,
    pub text_outline_color: Color,
    /// Draw a marker dot at label placement points.
    pub debug_labels: bool,
    /// Custom label text formatter; defaults to whole meters ("10 m").
    pub format_contour_label: Option<LabelFormatter>,
    /// Sample cache; `None` disables caching.
    pub cache: Option<CacheConfig>,
}

impl Default for TileProviderOptions {
    fn default() -> Self {
        Self {
            tile_size: 256,
            grid_size: 65,
            mask_size: 65,
            minimum_tile_level: 10,
            major_contour: 100.0,
            minor_contour: 20.0,
            gradient: Gradient::grayscale_elevation().stops().to_vec(),
            extent: None,
            gradient_amount: 1.0,
            hillshade_amount: 1.0,
            contour_amount: 0.0,
            use_slope: false,
            contour_color: Color::new(0, 0, 0, 255),
            contour_opacity_threshold: 0.5,
            illumination: Illumination::default(),
            font_size: 24.0,
            label_font: None,
            text_color: Color::new(255, 255, 255, 255),
            text_outline_color: Color::new(0, 0, 0, 128),
            debug_labels: false,
            format_contour_label: None,
            cache: Some(CacheConfig::default()),
        }
    }
}

/// Which optional features ended up active at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub labels: bool,
    pub mask: bool,
    pub hillshade: bool,
}

/// A feature picked from a rendered tile. Picking is not supported by this
/// provider; the type documents the interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickedFeature {
    pub location: GeoPoint,
    pub value: f64,
}

type SharedSamples = Shared<BoxFuture<'static, Result<Arc<TileSamples>, SampleError>>>;

/// Renders terrain elevation overlay tiles on request.
///
/// Each `request_image` call is independent; many may be in flight at once.
/// Concurrent requests for the same tile address share one sampling pass.
pub struct TileProvider {
    tile_size: u32,
    grid_size: usize,
    mask_size: usize,
    minimum_tile_level: u32,
    extent: Option<GeoRect>,
    scheme: Arc<dyn TilingScheme>,
    value_sampler: Arc<dyn ValueSampler>,
    mask_sampler: Arc<dyn MaskSampler>,
    renderer: TileRenderer,
    gradient: Gradient,
    params: RenderParameters,
    blank: RgbaImage,
    cache: Option<Arc<TileSampleCache>>,
    in_flight: Mutex<HashMap<String, SharedSamples>>,
    font: Option<Font<'static>>,
    label_style: LabelStyle,
    formatter: LabelFormatter,
    capabilities: Capabilities,
}

impl TileProvider {
    /// Build a provider. The value sampler is required; the mask sampler
    /// defaults to fully opaque. Fails on invalid configuration.
    pub fn new(
        options: TileProviderOptions,
        scheme: Arc<dyn TilingScheme>,
        value_sampler: Arc<dyn ValueSampler>,
        mask_sampler: Option<Arc<dyn MaskSampler>>,
    ) -> ConfigResult<Self> {
        if options.grid_size < 2 {
            return Err(ConfigError::GridSize(options.grid_size));
        }
        if options.mask_size < 2 {
            return Err(ConfigError::MaskSize(options.mask_size));
        }

        let gradient = Gradient::new(options.gradient.clone())?;

        let params = RenderParameters {
            major_contour_interval: options.major_contour,
            minor_contour_interval: options.minor_contour,
            gradient_amount: options.gradient_amount,
            hillshade_amount: options.hillshade_amount,
            contour_amount: options.contour_amount,
            contour_opacity_threshold: options.contour_opacity_threshold,
            use_slope_shading: options.use_slope,
            contour_color: options.contour_color,
        };

        let renderer = TileRenderer::new(
            options.tile_size,
            gradient.clone(),
            params,
            options.illumination,
        )?;

        let has_mask = mask_sampler.is_some();
        let mask_sampler = mask_sampler.unwrap_or_else(|| Arc::new(OpaqueMask));

        // Labels ride on the contour configuration; without a font they
        // degrade to plain contour rendering.
        let font = if options.contour_amount > 0.0 {
            load_label_font(options.label_font.as_deref())
        } else {
            None
        };

        let capabilities = Capabilities {
            labels: options.contour_amount > 0.0 && font.is_some(),
            mask: has_mask,
            hillshade: options.hillshade_amount > 0.0,
        };

        let label_style = LabelStyle {
            font_size: options.font_size,
            text_color: options.text_color,
            outline_color: options.text_outline_color,
            debug_marker: options.debug_labels,
        };

        let formatter = options
            .format_contour_label
            .unwrap_or_else(|| Arc::new(format_label_meters));

        let cache = options
            .cache
            .map(|config| Arc::new(TileSampleCache::new(config.capacity)));

        let blank = RgbaImage::from_pixel(options.tile_size, options.tile_size, Rgba([0, 0, 0, 0]));

        info!(
            tile_size = options.tile_size,
            grid_size = options.grid_size,
            mask_size = options.mask_size,
            minimum_tile_level = options.minimum_tile_level,
            labels = capabilities.labels,
            cached = cache.is_some(),
            "tile provider ready"
        );

        Ok(Self {
            tile_size: options.tile_size,
            grid_size: options.grid_size,
            mask_size: options.mask_size,
            minimum_tile_level: options.minimum_tile_level,
            extent: options.extent,
            scheme,
            value_sampler,
            mask_sampler,
            renderer,
            gradient,
            params,
            blank,
            cache,
            in_flight: Mutex::new(HashMap::new()),
            font,
            label_style,
            formatter,
            capabilities,
        })
    }

    /// Render the tile at `(x, y, level)`.
    ///
    /// Resolves to the blank tile when the request is culled or either
    /// sampler fails; never errors. The returned raster is owned by the
    /// caller.
    pub async fn request_image(&self, x: u32, y: u32, level: u32) -> RgbaImage {
        if level < self.minimum_tile_level {
            debug!(x, y, level, "below minimum tile level");
            return self.blank.clone();
        }

        let rect = self.scheme.tile_rectangle(x, y, level);
        if let Some(extent) = &self.extent {
            if !extent.intersects(&rect) {
                debug!(x, y, level, "outside configured extent");
                return self.blank.clone();
            }
        }

        let address = TileAddress::new(x, y, level);
        let samples = match self.fetch_samples(&address, &rect, level).await {
            Ok(samples) => samples,
            Err(err) => {
                warn!(x, y, level, error = %err, "sampling failed, returning blank tile");
                return self.blank.clone();
            }
        };

        let physical = geodesic_size(&rect);
        let mut tile = match self.renderer.render(
            &samples.values,
            &samples.mask,
            self.grid_size,
            self.mask_size,
            physical,
        ) {
            Ok(tile) => tile,
            Err(err) => {
                warn!(x, y, level, error = %err, "render failed, returning blank tile");
                return self.blank.clone();
            }
        };

        if self.capabilities.labels {
            self.apply_label(&mut tile, &samples);
        }

        tile
    }

    /// Picking features is not supported; always "no features".
    pub fn pick_features(
        &self,
        _x: u32,
        _y: u32,
        _level: u32,
        _longitude: f64,
        _latitude: f64,
    ) -> Option<Vec<PickedFeature>> {
        None
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_size
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_size
    }

    pub fn minimum_tile_level(&self) -> u32 {
        self.minimum_tile_level
    }

    /// The rectangle covered by the provider's tiling scheme.
    pub fn rectangle(&self) -> GeoRect {
        self.scheme.scheme_rectangle()
    }

    pub fn tiling_scheme(&self) -> &dyn TilingScheme {
        self.scheme.as_ref()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Sample cache counters, when a cache is configured.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Render surface pool counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.renderer.pool_stats()
    }

    /// Obtain the tile's samples from the cache, an in-flight request, or
    /// the external samplers.
    ///
    /// Concurrent callers for the same tile address share a single sampling
    /// future; a joint success is stored in the cache before any rendering.
    async fn fetch_samples(
        &self,
        address: &TileAddress,
        rect: &GeoRect,
        level: u32,
    ) -> Result<Arc<TileSamples>, SampleError> {
        let key = address.cache_key();

        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.get(&key) {
                debug!(key, "sample cache hit");
                return Ok(entry);
            }
        }

        let future = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match in_flight.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let future = self.sampling_future(rect, level, key.clone());
                    in_flight.insert(key.clone(), future.clone());
                    future
                }
            }
        };

        let result = future.await;

        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);

        result
    }

    fn sampling_future(&self, rect: &GeoRect, level: u32, key: String) -> SharedSamples {
        let value_grid: Vec<GeoPoint> = sample_grid(rect, self.grid_size);
        let mask_grid: Vec<GeoPoint> = sample_grid(rect, self.mask_size);

        let value_sampler = Arc::clone(&self.value_sampler);
        let mask_sampler = Arc::clone(&self.mask_sampler);
        let cache = self.cache.clone();
        let expected_values = self.grid_size * self.grid_size;
        let expected_mask = self.mask_size * self.mask_size;

        async move {
            // Both samplers run concurrently; either failure fails the tile.
            let (values, mask) = tokio::try_join!(
                value_sampler.sample_values(&value_grid, level),
                mask_sampler.sample_mask(&mask_grid),
            )?;

            if values.len() != expected_values {
                return Err(SampleError::ShapeMismatch {
                    expected: expected_values,
                    got: values.len(),
                });
            }
            if mask.len() != expected_mask {
                return Err(SampleError::ShapeMismatch {
                    expected: expected_mask,
                    got: mask.len(),
                });
            }

            let samples = Arc::new(TileSamples { values, mask });
            if let Some(cache) = cache {
                cache.insert(key, Arc::clone(&samples));
            }
            Ok(samples)
        }
        .boxed()
        .shared()
    }

    fn apply_label(&self, tile: &mut RgbaImage, samples: &TileSamples) {
        let Some(font) = &self.font else {
            return;
        };

        let gradient = &self.gradient;
        let threshold = self.params.contour_opacity_threshold;

        let placement = plan_label(
            &samples.values,
            self.grid_size,
            &samples.mask,
            self.mask_size,
            self.params.major_contour_interval,
            self.params.minor_contour_interval,
            self.tile_size,
            |value| gradient.alpha_at(value) >= threshold,
        );

        if let Some(placement) = placement {
            let text = (self.formatter)(placement.value);
            stamp_label(tile, &placement, &text, font, &self.label_style);
        }
    }
}
