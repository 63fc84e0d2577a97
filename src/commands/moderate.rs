use anyhow::{Result, anyhow};
use log::info;

use crate::context::DigimallContext;
use crate::moderation::{ModerationAction, ModerationCommand};
use crate::pages::{Target, execute, failure_message, success_message};
use crate::review::ReviewId;

pub struct ModerateParams {
    pub action: ModerationAction,
    pub reason: Option<String>,
    pub ids: Vec<String>,
    pub quiet: bool,
}

/// One id goes through the single-review endpoint, several through bulk.
pub fn target_for(ids: &[String]) -> Result<Target> {
    let mut unique: Vec<ReviewId> = Vec::new();
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        let id = ReviewId::from(id);
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    match unique.len() {
        0 => Err(anyhow!("No reviews selected")),
        1 => Ok(Target::Single(unique.remove(0))),
        _ => Ok(Target::Bulk(unique)),
    }
}

pub fn run(context: &DigimallContext, params: ModerateParams) -> Result<()> {
    info!(
        "moderate command (action={}, ids={}, reason_present={})",
        params.action,
        params.ids.len(),
        params.reason.is_some()
    );
    let command = ModerationCommand::new(params.action, params.reason.as_deref())?;
    let target = target_for(&params.ids)?;
    let backend = context.backend()?;

    let affected = execute(&backend, &command, &target)
        .map_err(|err| anyhow!(failure_message(&err, command.action, target.len())))?;

    if !params.quiet {
        println!("{}", success_message(command.action, affected));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_single_id_is_single_target() {
        assert_eq!(
            target_for(&ids(&["r1"])).unwrap(),
            Target::Single(ReviewId::from("r1"))
        );
    }

    #[test]
    fn test_duplicates_collapse_before_choosing_entry_point() {
        assert_eq!(
            target_for(&ids(&["r1", " r1 "])).unwrap(),
            Target::Single(ReviewId::from("r1"))
        );
        assert_eq!(
            target_for(&ids(&["r1", "r2", "r1"])).unwrap(),
            Target::Bulk(vec![ReviewId::from("r1"), ReviewId::from("r2")])
        );
    }

    #[test]
    fn test_blank_ids_are_empty_selection() {
        assert!(target_for(&ids(&["", "  "])).is_err());
    }
}
