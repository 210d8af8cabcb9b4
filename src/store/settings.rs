use tracing::{debug, warn};

use super::kv::KeyValueStore;
use super::{COLUMNS_KEY, FILTER_KEY, SORT_KEY, THEME_KEY, VIEW_MODE_KEY};
use crate::models::{clamp_columns, FilterType, Settings, SortType, Theme, ViewMode};

const ALL_KEYS: [&str; 5] = [THEME_KEY, VIEW_MODE_KEY, COLUMNS_KEY, SORT_KEY, FILTER_KEY];

/// Display settings, persisted one key per field on every change.
pub struct SettingsStore<S: KeyValueStore> {
    settings: Settings,
    backend: S,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Loads each field independently; missing or malformed values fall back
    /// to the default for that field only.
    pub fn load(backend: S) -> Self {
        let defaults = Settings::default();

        let settings = Settings {
            theme: read_field(&backend, THEME_KEY, Theme::from_key).unwrap_or(defaults.theme),
            view_mode: read_field(&backend, VIEW_MODE_KEY, ViewMode::from_key)
                .unwrap_or(defaults.view_mode),
            columns: read_field(&backend, COLUMNS_KEY, |s| {
                s.trim().parse::<i64>().ok().map(clamp_columns)
            })
            .unwrap_or(defaults.columns),
            sort: read_field(&backend, SORT_KEY, SortType::from_key).unwrap_or(defaults.sort),
            filter: read_field(&backend, FILTER_KEY, FilterType::from_key)
                .unwrap_or(defaults.filter),
        };

        debug!(?settings, "Loaded settings");
        Self { settings, backend }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.write(THEME_KEY, theme.as_key());
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.settings.theme.toggled();
        self.set_theme(theme);
        theme
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.settings.view_mode = view_mode;
        self.write(VIEW_MODE_KEY, view_mode.as_key());
    }

    /// Sets the grid column count, clamped to the supported range.
    pub fn set_columns(&mut self, columns: i64) -> u8 {
        let columns = clamp_columns(columns);
        self.settings.columns = columns;
        self.write(COLUMNS_KEY, &columns.to_string());
        columns
    }

    pub fn set_sort(&mut self, sort: SortType) {
        self.settings.sort = sort;
        self.write(SORT_KEY, sort.as_key());
    }

    pub fn set_filter(&mut self, filter: FilterType) {
        self.settings.filter = filter;
        self.write(FILTER_KEY, filter.as_key());
    }

    /// Restores defaults and drops every persisted setting.
    pub fn reset(&mut self) {
        self.settings = Settings::default();
        if let Err(e) = self.backend.remove_many(&ALL_KEYS) {
            warn!(error = %e, "Failed to clear settings");
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.backend.set(key, value) {
            warn!(key, error = %e, "Failed to save setting");
        }
    }
}

fn read_field<S, T>(backend: &S, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T>
where
    S: KeyValueStore,
{
    match backend.get(key) {
        Ok(Some(raw)) => {
            let parsed = parse(&raw);
            if parsed.is_none() {
                warn!(key, value = %raw, "Ignoring malformed setting");
            }
            parsed
        }
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "Failed to load setting");
            None
        }
    }
}
