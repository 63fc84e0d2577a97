use anyhow::Result;
use log::info;

use crate::context::DigimallContext;
use crate::ports::{ReviewQueryPort, ReviewStatistics};

pub fn run(context: &DigimallContext, json: bool) -> Result<()> {
    info!("stats start (json={})", json);
    let backend = context.backend()?;
    let stats = backend.statistics()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in summary_lines(&stats) {
            println!("{}", line);
        }
    }
    Ok(())
}

pub fn summary_lines(stats: &ReviewStatistics) -> Vec<String> {
    let mut lines = vec![
        format!("Total reviews:   {}", stats.total_reviews),
        format!("Pending:         {}", stats.pending_reviews),
        format!("Approved:        {}", stats.approved_reviews),
        format!("Rejected:        {}", stats.rejected_reviews),
        format!("Flagged:         {}", stats.flagged_reviews),
        format!(
            "Product/Vendor:  {}/{}",
            stats.product_reviews, stats.vendor_reviews
        ),
        format!("Average rating:  {:.2}", stats.average_rating),
    ];
    let max = stats.rating_distribution.values().copied().max().unwrap_or(0);
    for rating in (1..=5u8).rev() {
        let count = stats.rating_distribution.get(&rating).copied().unwrap_or(0);
        lines.push(format!("{} ★ {} {}", rating, bar(count, max, 20), count));
    }
    lines
}

pub fn bar(count: u64, max: u64, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = ((count as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}
