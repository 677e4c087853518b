//! Undoable edits of the scene.

use crate::sources::Sources;
use spatia_core::{LoopSettings, UndoAction};

/// A recorded edit. Both variants store whole before/after snapshots, so
/// applying either side is a plain replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    Sources { before: Sources, after: Sources },
    Loop { before: LoopSettings, after: LoopSettings },
}

impl EditAction {
    /// `true` when applying the action would change nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            EditAction::Sources { before, after } => before == after,
            EditAction::Loop { before, after } => before == after,
        }
    }
}

impl UndoAction for EditAction {
    fn coalesce(&self, next: &Self) -> Option<Self> {
        match (self, next) {
            (EditAction::Sources { before, .. }, EditAction::Sources { after, .. }) => {
                Some(EditAction::Sources {
                    before: before.clone(),
                    after: after.clone(),
                })
            }
            (EditAction::Loop { before, .. }, EditAction::Loop { after, .. }) => {
                Some(EditAction::Loop {
                    before: *before,
                    after: *after,
                })
            }
            _ => None,
        }
    }
}
