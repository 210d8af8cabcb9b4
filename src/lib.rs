//! Client core for a paginated remote media gallery.
//!
//! - `feed` - HTTP feed client, short-lived cache and pagination controller
//! - `projection` - search, kind filter and sort over the loaded items
//! - `store` - persisted favorites and display settings
//! - `viewer` - full-screen viewer state machine with zoom, pan and swipe
//! - `layout` - grid/list card sizing and visible-range math
//! - `share` - download and share intents

pub mod config;
pub mod error;
pub mod feed;
pub mod layout;
pub mod models;
pub mod projection;
pub mod share;
pub mod store;
pub mod viewer;

pub use error::{GalleryError, Result};
