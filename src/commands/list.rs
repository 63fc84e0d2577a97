use anyhow::{Result, anyhow};
use log::info;

use super::review_line;
use crate::context::DigimallContext;
use crate::filters::{FilterInput, FiltersPanel};
use crate::ports::{ReviewPage, ReviewQueryPort};
use crate::query::{ReviewQuery, ReviewTab, SortField, SortOrder};
use crate::review::{ReviewStatus, ReviewType};

pub struct ListParams {
    pub json: bool,
    pub tab: ReviewTab,
    pub search: Option<String>,
    pub status: Option<String>,
    pub review_type: Option<String>,
    pub min_rating: Option<u8>,
    pub max_rating: Option<u8>,
    pub needs_moderation: bool,
    pub flagged: bool,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    pub page: u32,
    pub limit: Option<u32>,
}

/// Builds the query the same way the console's filters panel does, then
/// applies the tab override.
pub fn build_query(params: &ListParams, default_limit: u32) -> Result<ReviewQuery> {
    if params.tab == ReviewTab::Statistics {
        return Err(anyhow!("The statistics tab has no list; use `stats`"));
    }
    let panel = FiltersPanel::default();
    let mut query = ReviewQuery::with_limit(params.limit.unwrap_or(default_limit));

    let status = params
        .status
        .as_deref()
        .map(str::parse::<ReviewStatus>)
        .transpose()?;
    let review_type = params
        .review_type
        .as_deref()
        .map(str::parse::<ReviewType>)
        .transpose()?;

    let inputs = [
        FilterInput::Search(params.search.clone().unwrap_or_default()),
        FilterInput::Status(status),
        FilterInput::Type(review_type),
        FilterInput::MinRating(params.min_rating),
        FilterInput::MaxRating(params.max_rating),
        FilterInput::NeedsModeration(params.needs_moderation),
        FilterInput::Flagged(params.flagged),
        FilterInput::SortBy(params.sort_by),
        FilterInput::SortOrder(params.sort_order),
    ];
    for input in inputs {
        panel.apply(&mut query, input)?;
    }
    query.page = params.page.max(1);
    Ok(query.effective(params.tab))
}

pub fn run(context: &DigimallContext, params: ListParams) -> Result<()> {
    let query = build_query(&params, context.config.ui.page_size())?;
    info!(
        "list start (tab={:?}, page={}, limit={}, search_present={})",
        params.tab,
        query.page,
        query.limit,
        query.search.is_some()
    );
    let backend = context.backend()?;
    let page = backend.list(&query)?;
    info!("list done (returned={}, total={})", page.reviews.len(), page.total);

    if params.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_page(&page);
    }
    Ok(())
}

fn print_page(page: &ReviewPage) {
    if page.reviews.is_empty() {
        println!("No reviews found.");
        return;
    }
    for review in &page.reviews {
        println!("{}", review_line(review));
    }
    println!(
        "Page {} of {} ({} reviews)",
        page.page,
        page.total_pages.max(1),
        page.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ListParams {
        ListParams {
            json: false,
            tab: ReviewTab::All,
            search: None,
            status: None,
            review_type: None,
            min_rating: None,
            max_rating: None,
            needs_moderation: false,
            flagged: false,
            sort_by: None,
            sort_order: None,
            page: 1,
            limit: None,
        }
    }

    #[test]
    fn test_defaults_sort_newest_first() {
        let query = build_query(&params(), 10).unwrap();
        assert_eq!(query.limit, 10);
        assert_eq!(query.sort_by, Some(SortField::CreatedAt));
        assert_eq!(query.sort_order, Some(SortOrder::Desc));
    }

    #[test]
    fn test_tab_override_beats_status_flag() {
        let query = build_query(
            &ListParams {
                tab: ReviewTab::Pending,
                status: Some("approved".to_string()),
                ..params()
            },
            10,
        )
        .unwrap();
        assert_eq!(query.status, Some(ReviewStatus::Pending));
    }

    #[test]
    fn test_rejects_bad_rating_and_status() {
        assert!(
            build_query(
                &ListParams {
                    min_rating: Some(7),
                    ..params()
                },
                10
            )
            .is_err()
        );
        assert!(
            build_query(
                &ListParams {
                    status: Some("archived".to_string()),
                    ..params()
                },
                10
            )
            .is_err()
        );
    }

    #[test]
    fn test_false_flags_stay_unset() {
        let query = build_query(&params(), 10).unwrap();
        assert_eq!(query.needs_moderation, None);
        assert_eq!(query.is_flagged, None);
        assert_eq!(query.search, None);
    }
}
