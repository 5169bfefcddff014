//! Bounded undo/redo stacks of commits and their reverts.

use std::collections::VecDeque;

use super::commit::Commit;

/// A forward commit paired with the revert computed when it was made.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// The edit as the user made it.
    pub commit: Commit,
    /// Its inverse.
    pub revert: Commit,
}

/// Undo/redo history for one loaded version.
///
/// Recording a new commit clears the redo stack. The undo stack drops its
/// oldest entry once `limit` is reached.
#[derive(Debug, Clone)]
pub struct CommitHistory {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: usize,
}

impl CommitHistory {
    /// Create a history holding at most `limit` undoable commits.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Record a freshly applied commit.
    pub fn record(&mut self, commit: Commit, revert: Commit) {
        self.redo.clear();
        if self.limit == 0 {
            return;
        }
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(HistoryEntry { commit, revert });
    }

    /// Take the most recent commit for undoing. The caller applies its revert.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.undo.pop_back()?;
        self.redo.push(entry);
        self.redo.last()
    }

    /// Take the most recently undone commit for redoing. The caller applies
    /// the commit again and passes the fresh revert to [`Self::replace_revert`].
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.redo.pop()?;
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(entry);
        self.undo.back()
    }

    /// Replace the revert of the newest undoable entry.
    pub fn replace_revert(&mut self, revert: Commit) {
        if let Some(entry) = self.undo.back_mut() {
            entry.revert = revert;
        }
    }

    /// Whether there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable commits.
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    /// Whether nothing can be undone.
    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for CommitHistory {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_LIMIT)
    }
}
