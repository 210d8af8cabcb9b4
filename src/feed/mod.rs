//! Remote image feed: HTTP client, short-lived cache and the pagination
//! controller that ties them together.

pub mod cache;
pub mod client;
pub mod controller;

pub use cache::FeedCache;
pub use client::{FeedClient, FeedPage, FeedStats, HttpFeedClient, RawRecord};
pub use controller::{FeedController, FeedSnapshot, LoadOutcome, PrefetchHandle, ServerStatus};
