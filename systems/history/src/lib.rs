#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded snapshot history backing undo and redo.
//!
//! Each entry is a full copy of the undoable state, so a push costs time and
//! memory proportional to the token list plus the revealed set. Restoring an
//! entry replaces the live state wholesale; nothing is diffed or replayed.

use std::collections::VecDeque;

/// Two bounded stacks of snapshots. The top of the undo stack is the current state.
#[derive(Clone, Debug)]
pub struct History<S> {
    undo: VecDeque<S>,
    redo: VecDeque<S>,
    capacity: usize,
}

impl<S: Clone> History<S> {
    /// Creates an empty history holding at most `capacity` snapshots per stack.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of snapshots kept per stack.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discards both stacks and installs `baseline` as the only undo entry.
    pub fn reset(&mut self, baseline: S) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(baseline);
    }

    /// Records a committed action and invalidates the redo stack.
    pub fn push(&mut self, snapshot: S) {
        push_bounded(&mut self.undo, snapshot, self.capacity);
        self.redo.clear();
        tracing::trace!(depth = self.undo.len(), "history snapshot pushed");
    }

    /// Steps back one action, returning the snapshot to restore.
    ///
    /// Returns `None` while only the baseline remains.
    pub fn undo(&mut self) -> Option<&S> {
        if self.undo.len() <= 1 {
            return None;
        }
        let current = self.undo.pop_back()?;
        push_bounded(&mut self.redo, current, self.capacity);
        self.undo.back()
    }

    /// Re-applies the most recently undone action, returning the snapshot to restore.
    pub fn redo(&mut self) -> Option<&S> {
        let snapshot = self.redo.pop_back()?;
        push_bounded(&mut self.undo, snapshot, self.capacity);
        self.undo.back()
    }

    /// Reports whether a baseline has been installed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Reports whether [`History::undo`] would restore something.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    /// Reports whether [`History::redo`] would restore something.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of entries on the undo stack, baseline included.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Number of entries on the redo stack.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Most recent snapshot, which mirrors the live state.
    #[must_use]
    pub fn current(&self) -> Option<&S> {
        self.undo.back()
    }
}

fn push_bounded<S>(stack: &mut VecDeque<S>, snapshot: S, capacity: usize) {
    stack.push_back(snapshot);
    while stack.len() > capacity {
        let _ = stack.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::History;

    fn seeded(values: &[u32]) -> History<u32> {
        let mut history = History::new(100);
        history.reset(values[0]);
        for value in &values[1..] {
            history.push(*value);
        }
        history
    }

    #[test]
    fn undo_walks_back_to_baseline_then_stops() {
        let mut history = seeded(&[0, 1, 2]);
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), Some(&0));
        assert_eq!(history.undo(), None, "baseline is never popped");
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn redo_reapplies_undone_snapshots_in_order() {
        let mut history = seeded(&[0, 1, 2]);
        let _ = history.undo();
        let _ = history.undo();
        assert_eq!(history.redo(), Some(&1));
        assert_eq!(history.redo(), Some(&2));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn push_clears_redo_stack() {
        let mut history = seeded(&[0, 1]);
        let _ = history.undo();
        assert!(history.can_redo());
        history.push(5);
        assert!(!history.can_redo());
        assert_eq!(history.current(), Some(&5));
    }

    #[test]
    fn oldest_snapshots_are_evicted_past_capacity() {
        let mut history = History::new(3);
        history.reset(0);
        for value in 1..=5 {
            history.push(value);
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(history.undo(), Some(&4));
        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn empty_history_ignores_undo_and_redo() {
        let mut history = History::<u32>::new(10);
        assert!(!history.is_initialized());
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn redo_stack_is_bounded_too() {
        let mut history = History::new(2);
        history.reset(0);
        history.push(1);
        history.push(2);
        let _ = history.undo();
        assert_eq!(history.redo_depth(), 1);
        assert_eq!(history.capacity(), 2);
    }
}
