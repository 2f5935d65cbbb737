//! Tests for the tile request orchestrator.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use terrain_common::{Color, ConfigError, GeoPoint, GeoRect, GradientStop};
use terrain_provider::{
    GeographicTilingScheme, MaskSampler, SampleError, TileProvider, TileProviderOptions,
    TilingScheme, ValueSampler,
};

/// Value sampler backed by a closure over the coordinate, with an invocation
/// counter and optional artificial latency.
struct FnSampler {
    calls: AtomicUsize,
    delay: Option<Duration>,
    f: Box<dyn Fn(&GeoPoint) -> f32 + Send + Sync>,
}

impl FnSampler {
    fn new(f: impl Fn(&GeoPoint) -> f32 + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: None,
            f: Box::new(f),
        })
    }

    fn slow(f: impl Fn(&GeoPoint) -> f32 + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Some(Duration::from_millis(30)),
            f: Box::new(f),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValueSampler for FnSampler {
    async fn sample_values(
        &self,
        coordinates: &[GeoPoint],
        _level: u32,
    ) -> Result<Vec<f32>, SampleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(coordinates.iter().map(|c| (self.f)(c)).collect())
    }
}

struct FailingValueSampler {
    calls: AtomicUsize,
}

#[async_trait]
impl ValueSampler for FailingValueSampler {
    async fn sample_values(
        &self,
        _coordinates: &[GeoPoint],
        _level: u32,
    ) -> Result<Vec<f32>, SampleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SampleError::Source("no data".to_string()))
    }
}

struct FailingMaskSampler;

#[async_trait]
impl MaskSampler for FailingMaskSampler {
    async fn sample_mask(&self, _coordinates: &[GeoPoint]) -> Result<Vec<f32>, SampleError> {
        Err(SampleError::Source("mask outage".to_string()))
    }
}

struct TruncatingSampler;

#[async_trait]
impl ValueSampler for TruncatingSampler {
    async fn sample_values(
        &self,
        coordinates: &[GeoPoint],
        _level: u32,
    ) -> Result<Vec<f32>, SampleError> {
        Ok(vec![0.0; coordinates.len() / 2])
    }
}

/// Elevation rising from 0 m at 90S to 1800 m at 90N.
fn by_latitude(point: &GeoPoint) -> f32 {
    ((point.lat + 90.0) * 10.0) as f32
}

fn options() -> TileProviderOptions {
    TileProviderOptions {
        tile_size: 64,
        grid_size: 9,
        mask_size: 9,
        minimum_tile_level: 8,
        gradient: vec![
            GradientStop::new(0.0, Color::new(0, 0, 120, 255)),
            GradientStop::new(2000.0, Color::new(200, 40, 40, 255)),
        ],
        hillshade_amount: 0.0,
        ..TileProviderOptions::default()
    }
}

fn provider_with(options: TileProviderOptions, sampler: Arc<FnSampler>) -> TileProvider {
    TileProvider::new(options, Arc::new(GeographicTilingScheme), sampler, None).unwrap()
}

fn is_blank(tile: &image::RgbaImage) -> bool {
    tile.pixels().all(|p| p.0 == [0, 0, 0, 0])
}

#[tokio::test]
async fn test_below_minimum_level_resolves_blank_without_sampling() {
    let sampler = FnSampler::new(by_latitude);
    let provider = provider_with(options(), Arc::clone(&sampler));

    let tile = provider.request_image(0, 0, 3).await;

    assert!(is_blank(&tile));
    assert_eq!(tile.width(), 64);
    assert_eq!(sampler.calls(), 0);
}

#[tokio::test]
async fn test_outside_extent_resolves_blank_without_sampling() {
    let sampler = FnSampler::new(by_latitude);
    let opts = TileProviderOptions {
        // Far from the (0, 0, 10) tile in the north-west
        extent: Some(GeoRect::new(100.0, -50.0, 110.0, -40.0)),
        ..options()
    };
    let provider = provider_with(opts, Arc::clone(&sampler));

    let tile = provider.request_image(0, 0, 10).await;

    assert!(is_blank(&tile));
    assert_eq!(sampler.calls(), 0);
}

#[tokio::test]
async fn test_successful_request_renders_opaque_tile() {
    let sampler = FnSampler::new(by_latitude);
    let provider = provider_with(options(), Arc::clone(&sampler));

    let tile = provider.request_image(100, 200, 10).await;

    assert_eq!(sampler.calls(), 1);
    assert!(!is_blank(&tile));
    assert!(tile.pixels().all(|p| p.0[3] == 255));
}

#[tokio::test]
async fn test_value_sampler_failure_resolves_blank() {
    let sampler = Arc::new(FailingValueSampler {
        calls: AtomicUsize::new(0),
    });
    let provider = TileProvider::new(
        options(),
        Arc::new(GeographicTilingScheme),
        Arc::clone(&sampler) as Arc<dyn ValueSampler>,
        None,
    )
    .unwrap();

    let tile = provider.request_image(100, 200, 10).await;

    assert!(is_blank(&tile));
    assert_eq!(sampler.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_mask_sampler_failure_resolves_blank() {
    let sampler = FnSampler::new(by_latitude);
    let provider = TileProvider::new(
        options(),
        Arc::new(GeographicTilingScheme),
        Arc::clone(&sampler) as Arc<dyn ValueSampler>,
        Some(Arc::new(FailingMaskSampler)),
    )
    .unwrap();

    let tile = provider.request_image(100, 200, 10).await;
    assert!(is_blank(&tile));
}

#[tokio::test]
async fn test_short_sampler_result_resolves_blank() {
    let provider = TileProvider::new(
        options(),
        Arc::new(GeographicTilingScheme),
        Arc::new(TruncatingSampler),
        None,
    )
    .unwrap();

    let tile = provider.request_image(100, 200, 10).await;
    assert!(is_blank(&tile));
}

#[tokio::test]
async fn test_cache_prevents_resampling() {
    let sampler = FnSampler::new(by_latitude);
    let provider = provider_with(options(), Arc::clone(&sampler));

    let first = provider.request_image(100, 200, 10).await;
    let second = provider.request_image(100, 200, 10).await;

    assert_eq!(sampler.calls(), 1);
    assert_eq!(first.as_raw(), second.as_raw());

    let stats = provider.cache_stats().unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.inserts, 1);
}

#[tokio::test]
async fn test_distinct_tiles_sample_independently() {
    let sampler = FnSampler::new(by_latitude);
    let provider = provider_with(options(), Arc::clone(&sampler));

    provider.request_image(100, 200, 10).await;
    provider.request_image(101, 200, 10).await;

    assert_eq!(sampler.calls(), 2);
}

#[tokio::test]
async fn test_disabled_cache_resamples() {
    let sampler = FnSampler::new(by_latitude);
    let opts = TileProviderOptions {
        cache: None,
        ..options()
    };
    let provider = provider_with(opts, Arc::clone(&sampler));

    provider.request_image(100, 200, 10).await;
    provider.request_image(100, 200, 10).await;

    assert_eq!(sampler.calls(), 2);
    assert!(provider.cache_stats().is_none());
}

#[tokio::test]
async fn test_concurrent_identical_requests_share_one_sampling() {
    let sampler = FnSampler::slow(by_latitude);
    let opts = TileProviderOptions {
        cache: None,
        ..options()
    };
    let provider = provider_with(opts, Arc::clone(&sampler));

    let (a, b) = tokio::join!(
        provider.request_image(100, 200, 10),
        provider.request_image(100, 200, 10),
    );

    assert_eq!(sampler.calls(), 1);
    assert_eq!(a.as_raw(), b.as_raw());
}

#[tokio::test]
async fn test_pick_features_unsupported() {
    let provider = provider_with(options(), FnSampler::new(by_latitude));
    assert!(provider.pick_features(100, 200, 10, 0.0, 45.0).is_none());
}

#[tokio::test]
async fn test_metadata_accessors() {
    let provider = provider_with(options(), FnSampler::new(by_latitude));

    assert_eq!(provider.tile_width(), 64);
    assert_eq!(provider.tile_height(), 64);
    assert_eq!(provider.minimum_tile_level(), 8);
    assert_eq!(
        provider.rectangle(),
        GeographicTilingScheme.scheme_rectangle()
    );

    let caps = provider.capabilities();
    assert!(!caps.labels);
    assert!(!caps.mask);
    assert!(!caps.hillshade);
}

#[tokio::test]
async fn test_capability_flags_follow_configuration() {
    let opts = TileProviderOptions {
        hillshade_amount: 0.8,
        ..options()
    };
    let sampler = FnSampler::new(by_latitude);
    let provider = TileProvider::new(
        opts,
        Arc::new(GeographicTilingScheme),
        sampler,
        Some(Arc::new(terrain_provider::OpaqueMask)),
    )
    .unwrap();

    let caps = provider.capabilities();
    assert!(caps.mask);
    assert!(caps.hillshade);
}

#[tokio::test]
async fn test_construction_rejects_tiny_grid() {
    let opts = TileProviderOptions {
        grid_size: 1,
        ..options()
    };
    let result = TileProvider::new(
        opts,
        Arc::new(GeographicTilingScheme),
        FnSampler::new(by_latitude),
        None,
    );
    assert!(matches!(result, Err(ConfigError::GridSize(1))));
}

#[tokio::test]
async fn test_construction_rejects_single_stop_gradient() {
    let opts = TileProviderOptions {
        gradient: vec![GradientStop::new(0.0, Color::new(0, 0, 0, 255))],
        ..options()
    };
    let result = TileProvider::new(
        opts,
        Arc::new(GeographicTilingScheme),
        FnSampler::new(by_latitude),
        None,
    );
    assert!(matches!(result, Err(ConfigError::GradientStops(1))));
}

#[tokio::test]
async fn test_two_band_tile_gets_contour_label() {
    // Elevation bands of 0 m and 10 m split across the tile; the 10 m band
    // covers the median, so the label should read "10 m".
    let scheme = GeographicTilingScheme;
    let rect = scheme.tile_rectangle(100, 200, 10);
    let mid_lat = (rect.north + rect.south) / 2.0;

    let sampler = FnSampler::new(move |point| if point.lat > mid_lat { 0.0 } else { 10.0 });

    let opts = TileProviderOptions {
        tile_size: 256,
        grid_size: 11,
        mask_size: 11,
        contour_amount: 1.0,
        major_contour: 10.0,
        minor_contour: 2.0,
        contour_opacity_threshold: 0.0,
        ..options()
    };
    let provider = provider_with(opts, Arc::clone(&sampler));

    if !provider.capabilities().labels {
        eprintln!("SKIPPED: no system font available for label rendering");
        return;
    }

    let tile = provider.request_image(100, 200, 10).await;

    // Label text is white over the dark gradient/contour colors.
    let white_pixels = tile
        .pixels()
        .filter(|p| p.0[0] > 200 && p.0[1] > 200 && p.0[2] > 200 && p.0[3] > 0)
        .count();
    assert!(white_pixels > 0, "expected stamped label text");
}
