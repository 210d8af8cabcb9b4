//! Filtered and sorted view over the loaded feed.
//!
//! [`project`] is pure: it borrows the items and returns references in display
//! order. Steps run in a fixed order: search, kind filter, then sort.

use std::cmp::Ordering;

use crate::models::{FilterType, ImageItem, SortType};

/// Inputs that shape the displayed sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search: String,
    pub sort: SortType,
    pub filter: FilterType,
}

impl Query {
    pub fn new(search: impl Into<String>, sort: SortType, filter: FilterType) -> Self {
        Self {
            search: search.into(),
            sort,
            filter,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.search.trim().is_empty()
            && self.sort == SortType::Default
            && self.filter == FilterType::All
    }
}

pub fn project<'a>(items: &'a [ImageItem], query: &Query) -> Vec<&'a ImageItem> {
    let needle = query.search.to_lowercase();

    let mut shown: Vec<&ImageItem> = items
        .iter()
        .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
        .filter(|item| matches_filter(item, query.filter))
        .collect();

    // `sort_by` is stable, so equal keys keep arrival order.
    if let Some(compare) = comparator(query.sort) {
        shown.sort_by(|a, b| compare(a, b));
    }
    shown
}

fn matches_filter(item: &ImageItem, filter: FilterType) -> bool {
    match filter {
        FilterType::All => true,
        FilterType::Images => !item.is_video(),
        FilterType::Videos => item.is_video(),
    }
}

type Comparator = fn(&ImageItem, &ImageItem) -> Ordering;

fn comparator(sort: SortType) -> Option<Comparator> {
    match sort {
        SortType::Default => None,
        SortType::NameAsc => Some(|a, b| a.name.cmp(&b.name)),
        SortType::NameDesc => Some(|a, b| b.name.cmp(&a.name)),
        SortType::SizeAsc => Some(|a, b| a.size_or_zero().cmp(&b.size_or_zero())),
        SortType::SizeDesc => Some(|a, b| b.size_or_zero().cmp(&a.size_or_zero())),
        // Missing dates sort as the oldest.
        SortType::DateAsc => Some(|a, b| date_key(a).cmp(&date_key(b))),
        SortType::DateDesc => Some(|a, b| date_key(b).cmp(&date_key(a))),
    }
}

fn date_key(item: &ImageItem) -> i64 {
    item.upload_date.unwrap_or(i64::MIN)
}
