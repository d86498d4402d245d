//! Image asset probing.
//!
//! `AssetProbe` downloads each image a render list references and checks that
//! it decodes. Anything that does not (404, server error, HTML error page,
//! truncated file) is reported missing so the preview can paint a visible
//! placeholder instead of a blank region.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use crate::compositor::Composition;
use crate::config::EditorConfig;
use crate::error::CardstockError;

/// Outcome of probing one image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AssetStatus {
    Available { width: u32, height: u32 },
    Missing { reason: String },
}

impl AssetStatus {
    pub fn is_missing(&self) -> bool {
        matches!(self, AssetStatus::Missing { .. })
    }
}

/// Probe results keyed by URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssetReport {
    pub assets: BTreeMap<String, AssetStatus>,
}

impl AssetReport {
    pub fn is_missing(&self, url: &str) -> bool {
        self.assets.get(url).is_some_and(AssetStatus::is_missing)
    }

    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.assets
            .iter()
            .filter(|(_, status)| status.is_missing())
            .map(|(url, _)| url.as_str())
    }

    /// Record the status of `url`.
    pub fn insert(&mut self, url: impl Into<String>, status: AssetStatus) {
        self.assets.insert(url.into(), status);
    }
}

/// How long a successful probe is trusted before the asset is checked again.
pub const AVAILABLE_TTL: Duration = Duration::from_secs(300);

/// Upper bound on remembered successful probes.
pub const AVAILABLE_CAPACITY: usize = 1024;

/// Pixel sizes of recently available assets, bounded in age and count.
#[derive(Debug)]
struct AvailabilityCache {
    entries: HashMap<String, ((u32, u32), Instant)>,
    ttl: Duration,
    capacity: usize,
}

impl AvailabilityCache {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
        }
    }

    fn get(&self, url: &str, now: Instant) -> Option<(u32, u32)> {
        self.entries
            .get(url)
            .filter(|(_, seen)| now.duration_since(*seen) < self.ttl)
            .map(|(dims, _)| *dims)
    }

    fn insert(&mut self, url: &str, dims: (u32, u32), now: Instant) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(url) && self.entries.len() >= self.capacity {
            let ttl = self.ttl;
            self.entries.retain(|_, (_, seen)| now.duration_since(*seen) < ttl);
            if self.entries.len() >= self.capacity {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, (_, seen))| *seen)
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    self.entries.remove(&key);
                }
            }
        }
        self.entries.insert(url.to_string(), (dims, now));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Downloads and validates image assets, caching the ones that load.
#[derive(Clone)]
pub struct AssetProbe {
    client: reqwest::Client,
    available: Arc<RwLock<AvailabilityCache>>,
}

impl AssetProbe {
    pub fn new(config: &EditorConfig) -> Result<Self, CardstockError> {
        let client = reqwest::Client::builder()
            .user_agent("cardstock/0.1")
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CardstockError::Asset(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            available: Arc::new(RwLock::new(AvailabilityCache::new(
                AVAILABLE_TTL,
                AVAILABLE_CAPACITY,
            ))),
        })
    }

    /// Probe a single URL. Only successful probes are cached, and only for
    /// [`AVAILABLE_TTL`]; a missing asset is retried on the next call so a late
    /// upload shows up, and a deleted one is noticed once its entry expires.
    pub async fn probe(&self, url: &str) -> AssetStatus {
        if let Some((width, height)) = self.available.read().await.get(url, Instant::now()) {
            return AssetStatus::Available { width, height };
        }

        match self.fetch_dimensions(url).await {
            Ok((width, height)) => {
                self.available
                    .write()
                    .await
                    .insert(url, (width, height), Instant::now());
                AssetStatus::Available { width, height }
            }
            Err(e) => {
                log::warn!("[assets] missing image {}: {}", url, e);
                AssetStatus::Missing {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Probe every image referenced by `composition` concurrently.
    pub async fn probe_composition(&self, composition: &Composition) -> AssetReport {
        let mut tasks = JoinSet::new();
        let mut seen = std::collections::BTreeSet::new();
        for url in composition.image_sources() {
            if seen.insert(url.to_string()) {
                let probe = self.clone();
                let url = url.to_string();
                tasks.spawn(async move {
                    let status = probe.probe(&url).await;
                    (url, status)
                });
            }
        }

        let mut report = AssetReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, status)) => report.insert(url, status),
                Err(e) => log::error!("[assets] probe task failed: {}", e),
            }
        }
        report
    }

    async fn fetch_dimensions(&self, url: &str) -> Result<(u32, u32), CardstockError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CardstockError::Asset(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(CardstockError::Asset(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CardstockError::Asset(format!("Failed to read image data: {}", e)))?;
        image_dimensions(&bytes)
    }
}

/// Decode just enough of `bytes` to learn the image's pixel size.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), CardstockError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CardstockError::Asset(format!("Failed to read image: {}", e)))?
        .into_dimensions()
        .map_err(|e| CardstockError::Asset(format!("Failed to decode image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbImage::new(width, height)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn dimensions_of_valid_png() {
        assert_eq!(image_dimensions(&png(7, 3)).unwrap(), (7, 3));
    }

    #[test]
    fn html_error_page_is_not_an_image() {
        let err = image_dimensions(b"<html><body>Not Found</body></html>").unwrap_err();
        assert!(matches!(err, CardstockError::Asset(_)));
    }

    #[test]
    fn report_lists_missing_urls() {
        let mut report = AssetReport::default();
        report.insert("a", AssetStatus::Available { width: 1, height: 1 });
        report.insert("b", AssetStatus::Missing { reason: "404".into() });
        assert!(report.is_missing("b"));
        assert!(!report.is_missing("a"));
        assert!(!report.is_missing("never-probed"));
        assert_eq!(report.missing().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn cached_sizes_expire() {
        let start = Instant::now();
        let mut cache = AvailabilityCache::new(Duration::from_secs(60), 8);
        cache.insert("a", (4, 3), start);
        assert_eq!(cache.get("a", start + Duration::from_secs(59)), Some((4, 3)));
        assert_eq!(cache.get("a", start + Duration::from_secs(60)), None);
    }

    #[test]
    fn cache_is_bounded() {
        let start = Instant::now();
        let mut cache = AvailabilityCache::new(Duration::from_secs(60), 2);
        cache.insert("a", (1, 1), start);
        cache.insert("b", (2, 2), start + Duration::from_secs(1));
        cache.insert("c", (3, 3), start + Duration::from_secs(2));
        assert_eq!(cache.len(), 2);
        // The oldest entry made room.
        assert_eq!(cache.get("a", start + Duration::from_secs(2)), None);
        assert_eq!(cache.get("c", start + Duration::from_secs(2)), Some((3, 3)));

        // Expired entries are dropped before live ones.
        let later = start + Duration::from_millis(61_500);
        cache.insert("d", (4, 4), later);
        assert_eq!(cache.get("b", later), None);
        assert_eq!(cache.get("c", later), Some((3, 3)));
        assert_eq!(cache.get("d", later), Some((4, 4)));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn unreachable_host_is_missing() {
        let probe = AssetProbe::new(&EditorConfig {
            request_timeout: std::time::Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();
        let status = probe.probe("http://127.0.0.1:9/nothing.png").await;
        assert!(status.is_missing());
    }
}
