//! Transaction-based undo history with explicit action coalescing.
//!
//! Actions are grouped into transactions. [`UndoLog::perform`] appends to
//! the open transaction, first offering the new action to the previous one
//! through [`UndoAction::coalesce`]. [`UndoLog::begin_new_transaction`]
//! closes the open transaction so the next action starts a fresh undo step.
//! Undo and redo hand the affected actions back to the caller, which applies
//! them through its ordinary edit path.

use std::collections::VecDeque;

/// An undoable action.
pub trait UndoAction: Sized {
    /// Merges `next` into `self`, or returns `None` if the two are not the
    /// same kind of edit. A merged action undoes to `self`'s starting state
    /// and redoes to `next`'s final state.
    fn coalesce(&self, next: &Self) -> Option<Self>;
}

#[derive(Debug, Clone)]
pub struct UndoLog<A> {
    transactions: VecDeque<Vec<A>>,
    /// Number of transactions currently applied.
    applied: usize,
    open: bool,
    max_steps: usize,
}

impl<A: UndoAction> UndoLog<A> {
    pub fn new(max_steps: usize) -> Self {
        Self {
            transactions: VecDeque::new(),
            applied: 0,
            open: false,
            max_steps: max_steps.max(1),
        }
    }

    /// Records an action that has already been applied.
    pub fn perform(&mut self, action: A) {
        self.transactions.truncate(self.applied);

        if self.open {
            if let Some(transaction) = self.transactions.back_mut() {
                match transaction.last_mut() {
                    Some(last) => match last.coalesce(&action) {
                        Some(merged) => *last = merged,
                        None => transaction.push(action),
                    },
                    None => transaction.push(action),
                }
                return;
            }
        }

        self.transactions.push_back(vec![action]);
        self.applied = self.transactions.len();
        self.open = true;

        while self.transactions.len() > self.max_steps {
            self.transactions.pop_front();
            self.applied -= 1;
            tracing::trace!("Undo history full, dropped oldest transaction");
        }
    }

    pub fn begin_new_transaction(&mut self) {
        self.open = false;
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.transactions.len()
    }

    /// Steps back one transaction. Apply the returned actions last to first.
    pub fn undo(&mut self) -> Option<&[A]> {
        if !self.can_undo() {
            return None;
        }
        self.open = false;
        self.applied -= 1;
        self.transactions.get(self.applied).map(Vec::as_slice)
    }

    /// Re-applies the next transaction. Apply the returned actions first to last.
    pub fn redo(&mut self) -> Option<&[A]> {
        if !self.can_redo() {
            return None;
        }
        self.open = false;
        self.applied += 1;
        self.transactions.get(self.applied - 1).map(Vec::as_slice)
    }

    /// Number of undo steps available.
    pub fn undo_depth(&self) -> usize {
        self.applied
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
        self.applied = 0;
        self.open = false;
    }
}

/// Holds the "before" state of an edit gesture, captured lazily on its
/// first step.
#[derive(Debug, Clone)]
pub struct GestureRecorder<T> {
    before: Option<T>,
}

impl<T> Default for GestureRecorder<T> {
    fn default() -> Self {
        Self { before: None }
    }
}

impl<T> GestureRecorder<T> {
    /// Captures `current` unless a gesture is already in progress. Returns
    /// `true` when this call started a new gesture.
    pub fn capture_before(&mut self, current: impl FnOnce() -> T) -> bool {
        if self.before.is_some() {
            return false;
        }
        self.before = Some(current());
        true
    }

    /// Replaces any in-progress capture.
    pub fn reset_before(&mut self, current: T) {
        self.before = Some(current);
    }

    pub fn is_active(&self) -> bool {
        self.before.is_some()
    }

    pub fn before(&self) -> Option<&T> {
        self.before.as_ref()
    }

    /// Ends the gesture, yielding its starting state.
    pub fn finish(&mut self) -> Option<T> {
        self.before.take()
    }
}
