use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
    Flag,
    Delete,
}

impl ModerationAction {
    pub const ALL: [ModerationAction; 4] = [
        ModerationAction::Approve,
        ModerationAction::Reject,
        ModerationAction::Flag,
        ModerationAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Flag => "flag",
            ModerationAction::Delete => "delete",
        }
    }

    pub fn requires_reason(&self) -> bool {
        matches!(self, ModerationAction::Reject | ModerationAction::Flag)
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approved",
            ModerationAction::Reject => "rejected",
            ModerationAction::Flag => "flagged",
            ModerationAction::Delete => "deleted",
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationAction {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(ModerationAction::Approve),
            "reject" => Ok(ModerationAction::Reject),
            "flag" => Ok(ModerationAction::Flag),
            "delete" => Ok(ModerationAction::Delete),
            _ => Err(anyhow!("Unknown moderation action: {}", value)),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModerationError {
    #[error("A reason is required to {0} a review")]
    ReasonRequired(ModerationAction),
    #[error("No reviews selected")]
    EmptySelection,
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("Minimum rating {min} is above maximum rating {max}")]
    InvalidRatingRange { min: u8, max: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmStyle {
    Success,
    Warning,
    Destructive,
}

/// Fixed presentation and validation contract of one moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContract {
    pub action: ModerationAction,
    title_singular: &'static str,
    title_plural: &'static str,
    description: &'static str,
    pub requires_reason: bool,
    pub placeholder: &'static str,
    pub confirm_label: &'static str,
    pub confirm_style: ConfirmStyle,
    pub warning: Option<&'static str>,
}

impl ActionContract {
    pub fn for_action(action: ModerationAction) -> Self {
        match action {
            ModerationAction::Approve => Self {
                action,
                title_singular: "Approve Review",
                title_plural: "Approve Reviews",
                description: "will be published and visible to customers.",
                requires_reason: false,
                placeholder: "Add an optional comment (optional)",
                confirm_label: "Approve",
                confirm_style: ConfirmStyle::Success,
                warning: None,
            },
            ModerationAction::Reject => Self {
                action,
                title_singular: "Reject Review",
                title_plural: "Reject Reviews",
                description: "will be hidden from customers.",
                requires_reason: true,
                placeholder: "Explain why this review is being rejected (required)",
                confirm_label: "Reject",
                confirm_style: ConfirmStyle::Destructive,
                warning: None,
            },
            ModerationAction::Flag => Self {
                action,
                title_singular: "Flag Review",
                title_plural: "Flag Reviews",
                description: "will be marked for further investigation.",
                requires_reason: true,
                placeholder: "Describe the problem with this review (required)",
                confirm_label: "Flag",
                confirm_style: ConfirmStyle::Warning,
                warning: None,
            },
            ModerationAction::Delete => Self {
                action,
                title_singular: "Delete Review",
                title_plural: "Delete Reviews",
                description: "will be permanently removed.",
                requires_reason: false,
                placeholder: "",
                confirm_label: "Delete",
                confirm_style: ConfirmStyle::Destructive,
                warning: Some("This action cannot be undone."),
            },
        }
    }

    pub fn title(&self, count: usize) -> &'static str {
        if count > 1 {
            self.title_plural
        } else {
            self.title_singular
        }
    }

    pub fn description(&self, count: usize) -> String {
        if count > 1 {
            format!("{} selected reviews {}", count, self.description)
        } else {
            format!("This review {}", self.description)
        }
    }

    pub fn accepts_reason(&self) -> bool {
        self.action != ModerationAction::Delete
    }

    pub fn reason_satisfied(&self, reason: &str) -> bool {
        !self.requires_reason || !reason.trim().is_empty()
    }
}

/// A moderation action whose reason requirement has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationCommand {
    pub action: ModerationAction,
    pub reason: Option<String>,
}

impl ModerationCommand {
    pub fn new(action: ModerationAction, reason: Option<&str>) -> Result<Self, ModerationError> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        if action.requires_reason() && reason.is_none() {
            return Err(ModerationError::ReasonRequired(action));
        }
        let reason = if action == ModerationAction::Delete {
            None
        } else {
            reason
        };
        Ok(Self { action, reason })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Open {
        action: ModerationAction,
        target_count: usize,
        reason: String,
    },
    Submitting {
        action: ModerationAction,
        target_count: usize,
        reason: String,
    },
}

/// Confirmation dialog for moderation actions.
///
/// `Closed -> Open -> Submitting -> Closed`, or back to `Open` when the
/// caller reports a failure. The modal never talks to a backend: `submit`
/// hands the validated command to the caller.
#[derive(Debug, Default)]
pub struct ModerationModal {
    state: ModalState,
}

impl ModerationModal {
    pub fn open(&mut self, action: ModerationAction, target_count: usize) -> Result<(), ModerationError> {
        if target_count == 0 {
            return Err(ModerationError::EmptySelection);
        }
        self.state = ModalState::Open {
            action,
            target_count,
            reason: String::new(),
        };
        Ok(())
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ModalState::Closed
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, ModalState::Submitting { .. })
    }

    pub fn action(&self) -> Option<ModerationAction> {
        match &self.state {
            ModalState::Closed => None,
            ModalState::Open { action, .. } | ModalState::Submitting { action, .. } => Some(*action),
        }
    }

    pub fn target_count(&self) -> usize {
        match &self.state {
            ModalState::Closed => 0,
            ModalState::Open { target_count, .. } | ModalState::Submitting { target_count, .. } => {
                *target_count
            }
        }
    }

    pub fn reason(&self) -> &str {
        match &self.state {
            ModalState::Closed => "",
            ModalState::Open { reason, .. } | ModalState::Submitting { reason, .. } => reason,
        }
    }

    pub fn contract(&self) -> Option<ActionContract> {
        self.action().map(ActionContract::for_action)
    }

    pub fn set_reason(&mut self, text: &str) {
        if let ModalState::Open { reason, .. } = &mut self.state {
            *reason = text.to_string();
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let ModalState::Open { action, reason, .. } = &mut self.state
            && *action != ModerationAction::Delete
        {
            reason.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if let ModalState::Open { reason, .. } = &mut self.state {
            reason.pop();
        }
    }

    pub fn can_confirm(&self, is_mutating: bool) -> bool {
        match &self.state {
            ModalState::Open { action, reason, .. } => {
                !is_mutating && ActionContract::for_action(*action).reason_satisfied(reason)
            }
            _ => false,
        }
    }

    pub fn can_cancel(&self, is_mutating: bool) -> bool {
        matches!(self.state, ModalState::Open { .. }) && !is_mutating
    }

    /// Moves to `Submitting` and returns the validated command, or `None`
    /// when confirm is disabled.
    pub fn submit(&mut self, is_mutating: bool) -> Option<ModerationCommand> {
        if !self.can_confirm(is_mutating) {
            return None;
        }
        let ModalState::Open {
            action,
            target_count,
            reason,
        } = std::mem::take(&mut self.state)
        else {
            return None;
        };
        let command = ModerationCommand::new(action, Some(&reason)).ok();
        self.state = if command.is_some() {
            ModalState::Submitting {
                action,
                target_count,
                reason,
            }
        } else {
            ModalState::Open {
                action,
                target_count,
                reason,
            }
        };
        command
    }

    /// The caller's mutation failed: back to `Open` with the reason intact.
    pub fn fail(&mut self) {
        if let ModalState::Submitting {
            action,
            target_count,
            reason,
        } = std::mem::take(&mut self.state)
        {
            self.state = ModalState::Open {
                action,
                target_count,
                reason,
            };
        }
    }

    pub fn cancel(&mut self, is_mutating: bool) -> bool {
        if !self.can_cancel(is_mutating) {
            return false;
        }
        self.close();
        true
    }

    pub fn close(&mut self) {
        self.state = ModalState::Closed;
    }
}
