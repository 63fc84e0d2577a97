pub mod import;
pub mod list;
pub mod moderate;
pub mod show;
pub mod stats;
pub mod tui;

use crate::review::{Review, rating_stars};
use unicode_width::UnicodeWidthStr;

/// Cuts `text` to at most `max` display columns, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width + 1 > max {
            break;
        }
        width += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

/// One-line summary used by `list`.
pub fn review_line(review: &Review) -> String {
    let flag = if review.is_flagged { " [flagged]" } else { "" };
    format!(
        "{:<12} {:<9} {} {:<8} {} on {}{}",
        review.id.as_str(),
        review.status.badge().label,
        rating_stars(review.rating),
        review.review_type.label(),
        truncate(review.display_title(), 40),
        truncate(&review.target.name, 30),
        flag
    )
}
