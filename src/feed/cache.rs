//! Short-lived memo of the accumulated feed.
//!
//! A snapshot is reusable only while it is younger than the TTL and already
//! covers the requested page. `refresh` replaces it wholesale.

use std::time::{Duration, Instant};

use crate::models::ImageItem;

#[derive(Debug, Clone)]
pub struct FeedCache {
    items: Vec<ImageItem>,
    timestamp: Instant,
    last_page: u32,
}

impl FeedCache {
    /// Starts a new snapshot from a first page.
    pub fn new(items: Vec<ImageItem>, page: u32, now: Instant) -> Self {
        Self {
            items,
            timestamp: now,
            last_page: page,
        }
    }

    /// Records an appended page; the snapshot holds the merged item list.
    pub fn extend(&mut self, merged: Vec<ImageItem>, page: u32, now: Instant) {
        self.items = merged;
        self.timestamp = now;
        self.last_page = self.last_page.max(page);
    }

    /// Returns the cached items if `page` can be served without a fetch.
    pub fn lookup(&self, page: u32, ttl: Duration, now: Instant) -> Option<&[ImageItem]> {
        let fresh = now.saturating_duration_since(self.timestamp) < ttl;
        (fresh && page <= self.last_page).then_some(self.items.as_slice())
    }

    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    fn items(n: usize) -> Vec<ImageItem> {
        (0..n)
            .map(|i| ImageItem::new(format!("{i}.png"), format!("http://h/{i}.png")))
            .collect()
    }

    #[test]
    fn test_hit_within_ttl_and_page() {
        let now = Instant::now();
        let mut cache = FeedCache::new(items(50), 1, now);
        cache.extend(items(100), 2, now);

        assert_eq!(cache.lookup(1, TTL, now).map(<[_]>::len), Some(100));
        assert_eq!(cache.lookup(2, TTL, now + Duration::from_secs(10)).map(<[_]>::len), Some(100));
    }

    #[test]
    fn test_miss_beyond_last_page() {
        let now = Instant::now();
        let cache = FeedCache::new(items(50), 1, now);
        assert!(cache.lookup(2, TTL, now).is_none());
    }

    #[test]
    fn test_miss_after_ttl() {
        let now = Instant::now();
        let cache = FeedCache::new(items(50), 1, now);
        assert!(cache.lookup(1, TTL, now + TTL).is_none());
    }

    #[test]
    fn test_last_page_never_decreases() {
        let now = Instant::now();
        let mut cache = FeedCache::new(items(50), 3, now);
        cache.extend(items(60), 2, now);
        assert_eq!(cache.last_page(), 3);
        assert_eq!(cache.len(), 60);
    }
}
