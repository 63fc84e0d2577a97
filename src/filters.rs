use crate::moderation::ModerationError;
use crate::query::{ReviewQuery, SortField, SortOrder};
use crate::review::{MAX_RATING, MIN_RATING, ReviewStatus, ReviewType};

/// One edit made through the filters panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterInput {
    Search(String),
    Status(Option<ReviewStatus>),
    Type(Option<ReviewType>),
    MinRating(Option<u8>),
    MaxRating(Option<u8>),
    NeedsModeration(bool),
    Flagged(bool),
    SortBy(Option<SortField>),
    SortOrder(Option<SortOrder>),
}

/// Rows of the panel, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Status,
    Type,
    MinRating,
    MaxRating,
    NeedsModeration,
    Flagged,
    SortBy,
    SortOrder,
}

impl FilterField {
    pub const ALL: [FilterField; 8] = [
        FilterField::Status,
        FilterField::Type,
        FilterField::MinRating,
        FilterField::MaxRating,
        FilterField::NeedsModeration,
        FilterField::Flagged,
        FilterField::SortBy,
        FilterField::SortOrder,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Status => "Status",
            FilterField::Type => "Type",
            FilterField::MinRating => "Min rating",
            FilterField::MaxRating => "Max rating",
            FilterField::NeedsModeration => "Needs moderation",
            FilterField::Flagged => "Flagged only",
            FilterField::SortBy => "Sort by",
            FilterField::SortOrder => "Sort order",
        }
    }
}

/// Controlled form over the explicit filters of a [`ReviewQuery`].
#[derive(Debug, Default)]
pub struct FiltersPanel {
    pub cursor: usize,
}

impl FiltersPanel {
    pub fn apply(&self, query: &mut ReviewQuery, input: FilterInput) -> Result<(), ModerationError> {
        match input {
            FilterInput::Search(text) => {
                query.search = Some(text).filter(|s| !s.is_empty());
            }
            FilterInput::Status(status) => query.status = status,
            FilterInput::Type(review_type) => query.review_type = review_type,
            FilterInput::MinRating(rating) => {
                let min = check_rating(rating)?;
                check_range(min, query.max_rating)?;
                query.min_rating = min;
            }
            FilterInput::MaxRating(rating) => {
                let max = check_rating(rating)?;
                check_range(query.min_rating, max)?;
                query.max_rating = max;
            }
            FilterInput::NeedsModeration(on) => query.needs_moderation = on.then_some(true),
            FilterInput::Flagged(on) => query.is_flagged = on.then_some(true),
            FilterInput::SortBy(field) => query.sort_by = field,
            FilterInput::SortOrder(order) => query.sort_order = order,
        }
        query.page = 1;
        Ok(())
    }

    pub fn clear(&self, query: &mut ReviewQuery) {
        query.clear_filters();
    }

    pub fn has_active_filters(&self, query: &ReviewQuery) -> bool {
        query.has_active_filters()
    }

    pub fn selected_field(&self) -> FilterField {
        FilterField::ALL[self.cursor.min(FilterField::ALL.len() - 1)]
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = FilterField::ALL.len() as isize;
        let next = (self.cursor as isize + delta).rem_euclid(len);
        self.cursor = next as usize;
    }

    /// The edit that advances the selected row to its next value. Closed-enum
    /// rows cycle through their options and wrap back to unset.
    pub fn cycle(&self, query: &ReviewQuery) -> FilterInput {
        match self.selected_field() {
            FilterField::Status => FilterInput::Status(next_option(&ReviewStatus::ALL, query.status)),
            FilterField::Type => FilterInput::Type(next_option(
                &[ReviewType::Product, ReviewType::Vendor],
                query.review_type,
            )),
            FilterField::MinRating => {
                let max = query.max_rating.unwrap_or(MAX_RATING);
                let options: Vec<u8> = RATINGS.into_iter().filter(|r| *r <= max).collect();
                FilterInput::MinRating(next_option(&options, query.min_rating))
            }
            FilterField::MaxRating => {
                let min = query.min_rating.unwrap_or(MIN_RATING);
                let options: Vec<u8> = RATINGS.into_iter().filter(|r| *r >= min).collect();
                FilterInput::MaxRating(next_option(&options, query.max_rating))
            }
            FilterField::NeedsModeration => {
                FilterInput::NeedsModeration(query.needs_moderation != Some(true))
            }
            FilterField::Flagged => FilterInput::Flagged(query.is_flagged != Some(true)),
            FilterField::SortBy => FilterInput::SortBy(next_option(&SortField::ALL, query.sort_by)),
            FilterField::SortOrder => FilterInput::SortOrder(next_option(
                &[SortOrder::Asc, SortOrder::Desc],
                query.sort_order,
            )),
        }
    }

    pub fn describe(field: FilterField, query: &ReviewQuery) -> String {
        fn or_any<T>(value: Option<T>, f: impl Fn(T) -> String) -> String {
            value.map(f).unwrap_or_else(|| "any".to_string())
        }
        match field {
            FilterField::Status => or_any(query.status, |s| s.badge().label.to_string()),
            FilterField::Type => or_any(query.review_type, |t| t.label().to_string()),
            FilterField::MinRating => or_any(query.min_rating, |r| format!("{}+", r)),
            FilterField::MaxRating => or_any(query.max_rating, |r| format!("<= {}", r)),
            FilterField::NeedsModeration => yes_no(query.needs_moderation),
            FilterField::Flagged => yes_no(query.is_flagged),
            FilterField::SortBy => or_any(query.sort_by, |f| f.as_str().to_string()),
            FilterField::SortOrder => or_any(query.sort_order, |o| o.as_str().to_string()),
        }
    }
}

const RATINGS: [u8; 5] = [1, 2, 3, 4, 5];

fn check_rating(rating: Option<u8>) -> Result<Option<u8>, ModerationError> {
    match rating {
        Some(value) if !(MIN_RATING..=MAX_RATING).contains(&value) => {
            Err(ModerationError::InvalidRating(value))
        }
        other => Ok(other),
    }
}

fn check_range(min: Option<u8>, max: Option<u8>) -> Result<(), ModerationError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => {
            Err(ModerationError::InvalidRatingRange { min, max })
        }
        _ => Ok(()),
    }
}

fn next_option<T: Copy + PartialEq>(options: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => options.first().copied(),
        Some(value) => {
            let idx = options.iter().position(|option| *option == value)?;
            options.get(idx + 1).copied()
        }
    }
}

fn yes_no(value: Option<bool>) -> String {
    let text = if value == Some(true) { "yes" } else { "no" };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_rating_then_clear_resets_everything_but_paging() {
        let panel = FiltersPanel::default();
        let mut query = ReviewQuery::with_limit(20);
        panel.apply(&mut query, FilterInput::MinRating(Some(4))).unwrap();
        query.page = 2;
        assert!(panel.has_active_filters(&query));

        panel.clear(&mut query);
        assert!(!panel.has_active_filters(&query));
        assert_eq!(query.min_rating, None);
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 20);
    }

    #[test]
    fn test_rating_is_closed_enum() {
        let panel = FiltersPanel::default();
        let mut query = ReviewQuery::default();
        assert!(panel.apply(&mut query, FilterInput::MaxRating(Some(6))).is_err());
        assert!(panel.apply(&mut query, FilterInput::MinRating(Some(0))).is_err());
        assert_eq!(query.max_rating, None);
    }

    #[test]
    fn test_min_rating_above_max_is_rejected() {
        let panel = FiltersPanel::default();
        let mut query = ReviewQuery::default();
        panel.apply(&mut query, FilterInput::MaxRating(Some(3))).unwrap();
        assert_eq!(
            panel.apply(&mut query, FilterInput::MinRating(Some(4))),
            Err(ModerationError::InvalidRatingRange { min: 4, max: 3 })
        );
        assert_eq!(query.min_rating, None);

        panel.apply(&mut query, FilterInput::MinRating(Some(3))).unwrap();
        assert!(panel.apply(&mut query, FilterInput::MaxRating(Some(2))).is_err());
        assert_eq!(query.max_rating, Some(3));
        panel.apply(&mut query, FilterInput::MaxRating(None)).unwrap();
        panel.apply(&mut query, FilterInput::MinRating(Some(5))).unwrap();
        assert_eq!(query.min_rating, Some(5));
    }

    #[test]
    fn test_min_rating_cycle_stops_at_max() {
        let mut panel = FiltersPanel::default();
        let mut query = ReviewQuery::default();
        panel.apply(&mut query, FilterInput::MaxRating(Some(2))).unwrap();
        while panel.selected_field() != FilterField::MinRating {
            panel.move_cursor(1);
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            let input = panel.cycle(&query);
            panel.apply(&mut query, input).unwrap();
            seen.push(query.min_rating);
        }
        assert_eq!(seen, vec![Some(1), Some(2), None]);
    }

    #[test]
    fn test_toggles_store_false_as_unset() {
        let panel = FiltersPanel::default();
        let mut query = ReviewQuery::default();
        panel.apply(&mut query, FilterInput::Flagged(true)).unwrap();
        assert_eq!(query.is_flagged, Some(true));
        panel.apply(&mut query, FilterInput::Flagged(false)).unwrap();
        assert_eq!(query.is_flagged, None);
    }

    #[test]
    fn test_apply_resets_page() {
        let panel = FiltersPanel::default();
        let mut query = ReviewQuery {
            page: 4,
            ..ReviewQuery::default()
        };
        panel
            .apply(&mut query, FilterInput::Status(Some(ReviewStatus::Rejected)))
            .unwrap();
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_cycle_wraps_back_to_unset() {
        let panel = FiltersPanel::default();
        let mut query = ReviewQuery::default();
        for expected in ReviewStatus::ALL {
            let input = panel.cycle(&query);
            panel.apply(&mut query, input).unwrap();
            assert_eq!(query.status, Some(expected));
        }
        let input = panel.cycle(&query);
        panel.apply(&mut query, input).unwrap();
        assert_eq!(query.status, None);
    }
}
