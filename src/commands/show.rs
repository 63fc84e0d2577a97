use anyhow::Result;
use log::info;

use crate::context::DigimallContext;
use crate::ports::ReviewQueryPort;
use crate::review::{Review, ReviewId, rating_stars};

pub fn run(context: &DigimallContext, id: &str, json: bool) -> Result<()> {
    info!("show start (id={}, json={})", id, json);
    let backend = context.backend()?;
    let review = backend.get(&ReviewId::from(id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&review)?);
    } else {
        for line in detail_lines(&review) {
            println!("{}", line);
        }
    }
    Ok(())
}

pub fn detail_lines(review: &Review) -> Vec<String> {
    let mut lines = vec![
        format!("{} [{}]", review.display_title(), review.status.badge().label),
        format!(
            "{} {} review of {} by {}{}",
            rating_stars(review.rating),
            review.review_type.label(),
            review.target.name,
            review.author.name,
            if review.is_verified_purchase {
                " (verified purchase)"
            } else {
                ""
            }
        ),
        format!(
            "Created {}  Updated {}  Helpful votes: {}",
            review.created_at.format("%Y-%m-%d %H:%M"),
            review.updated_at.format("%Y-%m-%d %H:%M"),
            review.helpful_count
        ),
        String::new(),
        review.content.clone(),
    ];

    if !review.images.is_empty() {
        lines.push(String::new());
        lines.push(format!("Images ({}):", review.images.len()));
        lines.extend(review.images.iter().map(|url| format!("  {}", url)));
    }

    if let Some(response) = &review.vendor_response {
        lines.push(String::new());
        lines.push(format!(
            "Vendor response from {} ({}):",
            response.responded_by,
            response.responded_at.format("%Y-%m-%d")
        ));
        lines.push(format!("  {}", response.message));
    }

    if let Some(audit) = &review.moderation {
        lines.push(String::new());
        lines.push("Moderation:".to_string());
        if let Some(by) = &audit.moderated_by {
            lines.push(format!("  Moderated by: {}", by));
        }
        if let Some(at) = audit.approved_at {
            lines.push(format!("  Approved at: {}", at.format("%Y-%m-%d %H:%M")));
        }
        if let Some(comment) = &audit.comment {
            lines.push(format!("  Comment: {}", comment));
        }
        if let Some(reason) = &audit.rejection_reason {
            lines.push(format!("  Rejection reason: {}", reason));
        }
        if let Some(reason) = &audit.flag_reason {
            lines.push(format!("  Flag reason: {}", reason));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::tests::sample_review;
    use crate::review::{ModerationAudit, ReviewStatus};

    #[test]
    fn test_detail_includes_moderation_audit() {
        let mut review = sample_review("r1", ReviewStatus::Rejected, 2);
        review.moderation = Some(ModerationAudit {
            moderated_by: Some("alice".to_string()),
            rejection_reason: Some("spam".to_string()),
            ..ModerationAudit::default()
        });
        let lines = detail_lines(&review);
        assert_eq!(lines[0], "Review r1 [Rejected]");
        assert!(lines.iter().any(|l| l == "  Rejection reason: spam"));
        assert!(lines.iter().any(|l| l.contains("verified purchase")));
    }
}
