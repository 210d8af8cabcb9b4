//! HTTP access to the image server.
//!
//! `GET {base}/api/images?page=N` returns a JSON array of
//! `{name, url, thumb?, isVideo?}` records; `url` and `thumb` are paths
//! relative to the server root. `GET {base}/api/stats` reports totals.

use std::future::Future;

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::config::FeedConfig;
use crate::error::{GalleryError, Result};
use crate::models::{Dimensions, ImageItem, MediaKind};

/// One record as sent by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default, rename = "isVideo")]
    pub is_video: Option<bool>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, rename = "uploadDate")]
    pub upload_date: Option<i64>,
}

/// A fetched page after mapping.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub page: u32,
    pub items: Vec<ImageItem>,
    /// Number of records the server sent, before any were dropped in mapping.
    /// Compared against the page size to detect the last page.
    pub received: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FeedStats {
    pub images: u64,
    pub thumbs: u64,
}

/// Source of feed pages.
pub trait FeedClient: Send + Sync + 'static {
    /// Fetches and maps one page (1-based).
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<FeedPage>> + Send;

    fn fetch_stats(&self) -> impl Future<Output = Result<FeedStats>> + Send {
        async { Err(GalleryError::Unsupported("feed stats")) }
    }
}

pub struct HttpFeedClient {
    http: reqwest::Client,
    base: Url,
    timeout: std::time::Duration,
}

impl HttpFeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let base = parse_base(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        debug!(base = %base, "Created feed client");
        Ok(Self {
            http,
            base,
            timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = join(&self.base, "api/images")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GalleryError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&body).map_err(|e| GalleryError::Decode(e.to_string()))
    }

    fn classify(&self, e: reqwest::Error) -> GalleryError {
        if e.is_timeout() {
            GalleryError::Timeout(self.timeout)
        } else {
            GalleryError::Network(e)
        }
    }
}

impl FeedClient for HttpFeedClient {
    async fn fetch_page(&self, page: u32) -> Result<FeedPage> {
        let url = self.page_url(page)?;
        trace!(%url, "Fetching feed page");

        let records: Vec<RawRecord> = self.get_json(url).await?;
        let received = records.len();
        let items = map_records(&self.base, records);

        Ok(FeedPage {
            page,
            items,
            received,
        })
    }

    async fn fetch_stats(&self) -> Result<FeedStats> {
        let url = join(&self.base, "api/stats")?;
        self.get_json(url).await
    }
}

/// Maps server records to items, resolving locations against `base`.
/// Records with unusable locations are dropped.
pub fn map_records(base: &Url, records: Vec<RawRecord>) -> Vec<ImageItem> {
    records
        .into_iter()
        .filter_map(|record| match map_record(base, record) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, "Skipping feed record");
                None
            }
        })
        .collect()
}

fn map_record(base: &Url, record: RawRecord) -> Result<ImageItem> {
    let uri = resolve(base, &record.url)?;
    // A thumbnail that fails to resolve only costs the preview.
    let thumb = record
        .thumb
        .as_deref()
        .filter(|t| !t.is_empty())
        .and_then(|t| resolve(base, t).ok());

    let dimensions = match (record.width, record.height) {
        (Some(width), Some(height)) => Some(Dimensions { width, height }),
        _ => None,
    };

    Ok(ImageItem {
        name: record.name,
        uri,
        thumb,
        kind: MediaKind::from_flag(record.is_video.unwrap_or(false)),
        size: record.size,
        dimensions,
        upload_date: record.upload_date,
    })
}

/// Resolves a server path against the base url, keeping any base path prefix.
/// Absolute urls pass through unchanged.
pub fn resolve(base: &Url, location: &str) -> Result<String> {
    if let Ok(absolute) = Url::parse(location) {
        return Ok(absolute.into());
    }
    Ok(join(base, location.trim_start_matches('/'))?.into())
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|e| GalleryError::InvalidUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })
}

fn parse_base(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| GalleryError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(GalleryError::Config(format!("{raw} cannot be used as a base url")));
    }
    Ok(url)
}
