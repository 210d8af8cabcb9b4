//! Local persistence for favorites and settings.
//!
//! - `KeyValueStore` - minimal get/set/remove contract
//! - `MemoryStore` - in-process map, used by tests and as a fallback
//! - `SqliteStore` - durable store in the user's config directory
//! - `FavoritesStore` / `SettingsStore` - owned stores built on top

pub mod favorites;
pub mod kv;
pub mod settings;
pub mod sqlite;

pub use favorites::FavoritesStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use settings::SettingsStore;
pub use sqlite::SqliteStore;

pub const FAVORITES_KEY: &str = "gallery.favorites";
pub const THEME_KEY: &str = "gallery.theme";
pub const VIEW_MODE_KEY: &str = "gallery.view_mode";
pub const COLUMNS_KEY: &str = "gallery.columns";
pub const SORT_KEY: &str = "gallery.sort";
pub const FILTER_KEY: &str = "gallery.filter";
