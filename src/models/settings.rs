//! User-facing display settings and their persisted string forms.

pub const MIN_COLUMNS: u8 = 2;
pub const MAX_COLUMNS: u8 = 6;
pub const DEFAULT_COLUMNS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Self::Light => Palette {
                background: "#ffffff",
                surface: "#f5f5f5",
                text: "#000000",
                text_secondary: "rgba(0,0,0,0.5)",
                border: "rgba(0,0,0,0.1)",
                accent: "#3b82f6",
                accent_hover: "#2563eb",
                card_background: "#ffffff",
                overlay: "rgba(0,0,0,0.05)",
            },
            Self::Dark => Palette {
                background: "#121212",
                surface: "#1e1e1e",
                text: "#ffffff",
                text_secondary: "rgba(255,255,255,0.6)",
                border: "rgba(255,255,255,0.1)",
                accent: "#60a5fa",
                accent_hover: "#3b82f6",
                card_background: "#2d2d2d",
                overlay: "rgba(255,255,255,0.05)",
            },
        }
    }
}

/// Colours for one theme, as CSS colour strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    pub border: &'static str,
    pub accent: &'static str,
    pub accent_hover: &'static str,
    pub card_background: &'static str,
    pub overlay: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim() {
            "grid" => Some(Self::Grid),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortType {
    /// Arrival order.
    #[default]
    Default,
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
    DateAsc,
    DateDesc,
}

impl SortType {
    pub const ALL: [SortType; 7] = [
        Self::Default,
        Self::NameAsc,
        Self::NameDesc,
        Self::SizeAsc,
        Self::SizeDesc,
        Self::DateAsc,
        Self::DateDesc,
    ];

    pub fn from_key(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sort| sort.as_key() == s.trim())
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::SizeAsc => "size-asc",
            Self::SizeDesc => "size-desc",
            Self::DateAsc => "date-asc",
            Self::DateDesc => "date-desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    All,
    Images,
    Videos,
}

impl FilterType {
    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim() {
            "all" => Some(Self::All),
            "images" => Some(Self::Images),
            "videos" => Some(Self::Videos),
            _ => None,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Images => "images",
            Self::Videos => "videos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub theme: Theme,
    pub view_mode: ViewMode,
    /// Grid columns, always within `MIN_COLUMNS..=MAX_COLUMNS`.
    pub columns: u8,
    pub sort: SortType,
    pub filter: FilterType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            view_mode: ViewMode::default(),
            columns: DEFAULT_COLUMNS,
            sort: SortType::default(),
            filter: FilterType::default(),
        }
    }
}

pub fn clamp_columns(columns: i64) -> u8 {
    columns.clamp(MIN_COLUMNS as i64, MAX_COLUMNS as i64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.view_mode, ViewMode::Grid);
        assert_eq!(settings.columns, 4);
        assert_eq!(settings.sort, SortType::Default);
        assert_eq!(settings.filter, FilterType::All);
    }

    #[test]
    fn test_sort_keys() {
        for sort in SortType::ALL {
            assert_eq!(SortType::from_key(sort.as_key()), Some(sort));
        }
        assert_eq!(SortType::from_key("width-asc"), None);
    }

    #[test]
    fn test_theme_toggle_and_palette() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.palette().background, "#ffffff");
        assert_eq!(Theme::Dark.palette().background, "#121212");
    }

    #[test]
    fn test_clamp_columns() {
        assert_eq!(clamp_columns(1), 2);
        assert_eq!(clamp_columns(5), 5);
        assert_eq!(clamp_columns(40), 6);
    }
}
