//! Runtime configuration for the feed and the viewer.
//!
//! Feed settings can be overridden through the environment:
//! - `GALLERY_SERVER_URL` - base url of the image server
//! - `GALLERY_REQUEST_TIMEOUT_SECS` - per-request timeout in seconds

use std::time::Duration;

use tracing::warn;

use crate::viewer::Viewport;

/// Server used when `GALLERY_SERVER_URL` is not set.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
/// Number of items the server returns for a full page.
pub const PAGE_SIZE: usize = 50;
/// How long an accumulated feed snapshot may be reused without refetching.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub page_size: usize,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            page_size: PAGE_SIZE,
            cache_ttl: CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: concat!("gallery-feed/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FeedConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds the configuration from defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("GALLERY_SERVER_URL") {
            let url = url.trim();
            if url.is_empty() {
                warn!("GALLERY_SERVER_URL is empty, using {}", config.base_url);
            } else {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }

        if let Ok(raw) = std::env::var("GALLERY_REQUEST_TIMEOUT_SECS") {
            match parse_timeout_secs(&raw) {
                Some(timeout) => config.request_timeout = timeout,
                None => warn!(value = %raw, "Ignoring invalid GALLERY_REQUEST_TIMEOUT_SECS"),
            }
        }

        config
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

fn parse_timeout_secs(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Tunables for the full-screen viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Area the image is centered in; bounds are computed against it.
    pub viewport: Viewport,
    pub min_scale: f64,
    pub max_scale: f64,
    pub double_tap_scale: f64,
    /// Horizontal release distance that commits a swipe.
    pub swipe_distance: f64,
    /// Horizontal release velocity (px/s) that commits a swipe.
    pub swipe_velocity: f64,
    /// Factor applied to unzoomed horizontal drags.
    pub pan_damping: f64,
    /// Width fraction of the left and right tap zones.
    pub tap_zone: f64,
    pub double_tap_window: Duration,
    /// Max distance between the two taps of a double tap.
    pub double_tap_slop: f64,
    pub animation_duration: Duration,
    /// Request another page once fewer items than this remain after the current one.
    pub prefetch_threshold: usize,
    /// Thumbnails shown on each side of the current item.
    pub thumbnail_radius: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1080.0, 1344.0),
            min_scale: 1.0,
            max_scale: 4.0,
            double_tap_scale: 2.5,
            swipe_distance: 100.0,
            swipe_velocity: 500.0,
            pan_damping: 0.3,
            tap_zone: 0.3,
            double_tap_window: Duration::from_millis(250),
            double_tap_slop: 40.0,
            animation_duration: Duration::from_millis(150),
            prefetch_threshold: 50,
            thumbnail_radius: 10,
        }
    }
}

impl ViewerConfig {
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}
