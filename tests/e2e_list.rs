use anyhow::Result;

mod common;
use common::{TestWorkspace, json, page_ids, standard_reviews};

#[test]
fn test_list_defaults_to_newest_first() -> Result<()> {
    let ws = TestWorkspace::seeded("list_default", &standard_reviews())?;

    let out = ws.run(&["list", "--json"])?;
    assert_eq!(page_ids(&out)?, vec!["r4", "r3", "r2", "r1"]);

    let page = json(&out)?;
    assert_eq!(page["total"], 4);
    assert_eq!(page["page"], 1);
    assert_eq!(page["totalPages"], 1);
    Ok(())
}

#[test]
fn test_pending_tab_overrides_status_filter() -> Result<()> {
    let ws = TestWorkspace::seeded("list_pending_tab", &standard_reviews())?;

    let out = ws.run(&["list", "--json", "--tab", "pending", "--status", "approved"])?;
    assert_eq!(page_ids(&out)?, vec!["r4", "r1"]);
    Ok(())
}

#[test]
fn test_flagged_tab_lists_flagged_reviews() -> Result<()> {
    let ws = TestWorkspace::seeded("list_flagged_tab", &standard_reviews())?;

    let out = ws.run(&["list", "--json", "--tab", "flagged"])?;
    assert_eq!(page_ids(&out)?, vec!["r3"]);
    Ok(())
}

#[test]
fn test_search_matches_target_name_case_insensitively() -> Result<()> {
    let ws = TestWorkspace::seeded("list_search", &standard_reviews())?;

    let out = ws.run(&["list", "--json", "--search", "acme"])?;
    assert_eq!(page_ids(&out)?, vec!["r2"]);

    let out = ws.run(&["list", "--json", "--search", "FAKE REVIEW"])?;
    assert_eq!(page_ids(&out)?, vec!["r3"]);
    Ok(())
}

#[test]
fn test_rating_and_sort_filters() -> Result<()> {
    let ws = TestWorkspace::seeded("list_rating_sort", &standard_reviews())?;

    let out = ws.run(&[
        "list",
        "--json",
        "--min-rating",
        "2",
        "--sort-by",
        "rating",
        "--sort-order",
        "asc",
    ])?;
    assert_eq!(page_ids(&out)?, vec!["r2", "r4", "r1"]);

    let out = ws.run(&["list", "--json", "--sort-by", "helpfulCount"])?;
    assert_eq!(page_ids(&out)?.first().map(String::as_str), Some("r4"));
    Ok(())
}

#[test]
fn test_pagination_reports_page_counts() -> Result<()> {
    let ws = TestWorkspace::seeded("list_pages", &standard_reviews())?;

    let out = ws.run(&["list", "--json", "--limit", "3", "--page", "2"])?;
    assert_eq!(page_ids(&out)?, vec!["r1"]);
    let page = json(&out)?;
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["limit"], 3);

    let out = ws.run(&["list", "--limit", "3", "--page", "5"])?;
    assert!(out.contains("No reviews found."));
    Ok(())
}

#[test]
fn test_plain_output_has_page_footer() -> Result<()> {
    let ws = TestWorkspace::seeded("list_plain", &standard_reviews())?;

    let out = ws.run(&["list"])?;
    assert!(out.contains("Review r1"));
    assert!(out.contains("Page 1 of 1 (4 reviews)"));
    Ok(())
}

#[test]
fn test_page_size_comes_from_config() -> Result<()> {
    let ws = TestWorkspace::seeded("list_config", &standard_reviews())?;
    ws.write("digimall.toml", "[ui]\npage_size = 2\n")?;

    let out = ws.run(&["list", "--json"])?;
    assert_eq!(page_ids(&out)?, vec!["r4", "r3"]);
    assert_eq!(json(&out)?["totalPages"], 2);
    Ok(())
}

#[test]
fn test_unknown_status_is_rejected() -> Result<()> {
    let ws = TestWorkspace::seeded("list_bad_status", &standard_reviews())?;

    let err = ws.run_err(&["list", "--status", "archived"])?;
    assert!(err.contains("Unknown review status"));
    Ok(())
}

#[test]
fn test_statistics_tab_has_no_list() -> Result<()> {
    let ws = TestWorkspace::seeded("list_stats_tab", &standard_reviews())?;

    let err = ws.run_err(&["list", "--tab", "statistics"])?;
    assert!(err.contains("stats"));
    Ok(())
}

#[test]
fn test_inverted_rating_range_is_rejected() -> Result<()> {
    let ws = TestWorkspace::seeded("list_bad_range", &standard_reviews())?;

    let err = ws.run_err(&["list", "--min-rating", "4", "--max-rating", "2"])?;
    assert!(err.contains("Minimum rating 4 is above maximum rating 2"));
    Ok(())
}
