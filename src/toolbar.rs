use crate::moderation::ModerationAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarCommand {
    Moderate(ModerationAction),
    ClearSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarButton {
    pub key: char,
    pub label: &'static str,
    pub command: ToolbarCommand,
}

const BUTTONS: [ToolbarButton; 5] = [
    ToolbarButton {
        key: 'A',
        label: "Approve",
        command: ToolbarCommand::Moderate(ModerationAction::Approve),
    },
    ToolbarButton {
        key: 'X',
        label: "Reject",
        command: ToolbarCommand::Moderate(ModerationAction::Reject),
    },
    ToolbarButton {
        key: 'G',
        label: "Flag",
        command: ToolbarCommand::Moderate(ModerationAction::Flag),
    },
    ToolbarButton {
        key: 'D',
        label: "Delete",
        command: ToolbarCommand::Moderate(ModerationAction::Delete),
    },
    ToolbarButton {
        key: 'C',
        label: "Clear selection",
        command: ToolbarCommand::ClearSelection,
    },
];

/// Floating bulk bar. Stateless: everything derives from the selected count.
pub struct BulkActionsToolbar;

impl BulkActionsToolbar {
    pub fn is_visible(selected_count: usize) -> bool {
        selected_count > 0
    }

    pub fn buttons(selected_count: usize) -> &'static [ToolbarButton] {
        if Self::is_visible(selected_count) {
            &BUTTONS
        } else {
            &[]
        }
    }

    pub fn dispatch(selected_count: usize, key: char) -> Option<ToolbarCommand> {
        Self::buttons(selected_count)
            .iter()
            .find(|button| button.key == key)
            .map(|button| button.command)
    }

    pub fn summary(selected_count: usize) -> String {
        if selected_count == 1 {
            "1 review selected".to_string()
        } else {
            format!("{} reviews selected", selected_count)
        }
    }
}
