use anyhow::anyhow;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::review::{ReviewStatus, ReviewType};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "camelCase")]
#[clap(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Rating,
    HelpfulCount,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::CreatedAt,
        SortField::UpdatedAt,
        SortField::Rating,
        SortField::HelpfulCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::Rating => "rating",
            SortField::HelpfulCount => "helpfulCount",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lower")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query parameters for listing reviews.
///
/// `None` always means "unset": the value is left out of the request and does
/// not count as an active filter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub review_type: Option<ReviewType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_moderation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_flagged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self::with_limit(DEFAULT_PAGE_SIZE)
    }
}

impl ReviewQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            search: None,
            status: None,
            review_type: None,
            min_rating: None,
            max_rating: None,
            needs_moderation: None,
            is_flagged: None,
            sort_by: None,
            sort_order: None,
        }
    }

    /// True when any key other than `page`/`limit` holds a truthy value.
    pub fn has_active_filters(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.is_empty())
            || self.status.is_some()
            || self.review_type.is_some()
            || self.min_rating.is_some_and(|r| r > 0)
            || self.max_rating.is_some_and(|r| r > 0)
            || self.needs_moderation == Some(true)
            || self.is_flagged == Some(true)
            || self.sort_by.is_some()
            || self.sort_order.is_some()
    }

    /// Resets every key except `page` and `limit`.
    pub fn clear_filters(&mut self) {
        *self = Self {
            page: self.page,
            limit: self.limit,
            ..Self::with_limit(self.limit)
        };
    }

    /// Builds the query actually sent to the backend: default sort applied,
    /// then the tab override on top of the explicit filters.
    pub fn effective(&self, tab: ReviewTab) -> ReviewQuery {
        let mut query = self.clone();
        query.sort_by = Some(query.sort_by.unwrap_or_default());
        query.sort_order = Some(query.sort_order.unwrap_or_default());
        query.search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        tab.apply_override(&mut query);
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ReviewTab {
    #[default]
    All,
    Pending,
    Flagged,
    Statistics,
}

impl ReviewTab {
    pub const ALL: [ReviewTab; 4] = [
        ReviewTab::All,
        ReviewTab::Pending,
        ReviewTab::Flagged,
        ReviewTab::Statistics,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReviewTab::All => "All Reviews",
            ReviewTab::Pending => "Pending",
            ReviewTab::Flagged => "Flagged",
            ReviewTab::Statistics => "Statistics",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|tab| tab == self).unwrap_or(0)
    }

    pub fn shows_list(&self) -> bool {
        *self != ReviewTab::Statistics
    }

    pub fn apply_override(&self, query: &mut ReviewQuery) {
        match self {
            ReviewTab::Pending => query.status = Some(ReviewStatus::Pending),
            ReviewTab::Flagged => query.is_flagged = Some(true),
            ReviewTab::All | ReviewTab::Statistics => {}
        }
    }
}

impl fmt::Display for ReviewTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ReviewTab {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ReviewTab::All),
            "pending" => Ok(ReviewTab::Pending),
            "flagged" => Ok(ReviewTab::Flagged),
            "statistics" | "stats" => Ok(ReviewTab::Statistics),
            _ => Err(anyhow!("Unknown tab: {}", value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_tab_overrides_explicit_status() {
        for status in ReviewStatus::ALL {
            let query = ReviewQuery {
                status: Some(status),
                ..ReviewQuery::default()
            };
            let effective = query.effective(ReviewTab::Pending);
            assert_eq!(effective.status, Some(ReviewStatus::Pending));
        }
    }

    #[test]
    fn test_flagged_tab_forces_is_flagged() {
        let query = ReviewQuery {
            is_flagged: Some(false),
            status: Some(ReviewStatus::Approved),
            ..ReviewQuery::default()
        };
        let effective = query.effective(ReviewTab::Flagged);
        assert_eq!(effective.is_flagged, Some(true));
        assert_eq!(effective.status, Some(ReviewStatus::Approved));
    }

    #[test]
    fn test_all_tab_keeps_filters_and_defaults_sort() {
        let query = ReviewQuery {
            status: Some(ReviewStatus::Rejected),
            ..ReviewQuery::default()
        };
        let effective = query.effective(ReviewTab::All);
        assert_eq!(effective.status, Some(ReviewStatus::Rejected));
        assert_eq!(effective.sort_by, Some(SortField::CreatedAt));
        assert_eq!(effective.sort_order, Some(SortOrder::Desc));
    }

    #[test]
    fn test_clear_keeps_page_and_limit() {
        let mut query = ReviewQuery {
            page: 3,
            limit: 25,
            min_rating: Some(4),
            search: Some("broken".to_string()),
            is_flagged: Some(true),
            ..ReviewQuery::default()
        };
        assert!(query.has_active_filters());
        query.clear_filters();
        assert!(!query.has_active_filters());
        assert_eq!(query.page, 3);
        assert_eq!(query.limit, 25);
        assert_eq!(query.min_rating, None);
    }

    #[test]
    fn test_false_booleans_are_not_active() {
        let query = ReviewQuery {
            needs_moderation: Some(false),
            is_flagged: Some(false),
            search: Some(String::new()),
            ..ReviewQuery::default()
        };
        assert!(!query.has_active_filters());
    }

    #[test]
    fn test_unset_values_are_omitted_from_wire() {
        let query = ReviewQuery {
            review_type: Some(ReviewType::Vendor),
            ..ReviewQuery::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["type"], "VENDOR");
        assert!(value.get("search").is_none());
        assert_eq!(value["page"], 1);
    }
}
