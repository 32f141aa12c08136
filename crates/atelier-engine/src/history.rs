//! History stack
//!
//! Ordered record of committed units with a cursor. Entries left of the
//! cursor are undoable, entries right of it are redoable.
//!
//! ```text
//! [A, B, C]  cursor=3
//! undo x2    cursor=1   (B, C redoable)
//! push D     [A, D] cursor=2   (B, C discarded, no branching)
//! ```
//!
//! # Invariants
//!
//! 1. `cursor <= entries.len()` after every operation
//! 2. `entries.len() <= max_depth` when `max_depth > 0`
//! 3. A push discards everything at or after the cursor

use std::collections::VecDeque;
use std::fmt;

use atelier_core::{Document, RequestResult, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::composite::CompositeRequest;
use crate::request::Request;
use crate::reversible::Reversible;
use crate::session::SessionRecord;

// ============================================================================
// Units
// ============================================================================

/// A unit that can be handed to a commit
#[derive(Debug)]
pub enum Transaction {
    Request(Request),
    Composite(CompositeRequest),
}

impl Transaction {
    pub fn description(&self) -> String {
        match self {
            Transaction::Request(r) => r.description(),
            Transaction::Composite(c) => c.description().to_string(),
        }
    }

    pub fn category(&self) -> String {
        match self {
            Transaction::Request(r) => r.category().to_string(),
            Transaction::Composite(c) => c.category().to_string(),
        }
    }

    /// Request kind for logging; composites report "Composite"
    pub fn kind_name(&self) -> &'static str {
        match self {
            Transaction::Request(r) => r.kind().as_str(),
            Transaction::Composite(_) => "Composite",
        }
    }

    pub(crate) async fn commit(
        &mut self,
        doc: &mut Document,
        kernel: &dyn atelier_core::GeometryKernel,
    ) -> Result<RequestResult> {
        match self {
            Transaction::Request(r) => r.commit(doc, kernel).await,
            Transaction::Composite(c) => c.commit(doc, kernel).await,
        }
    }

    /// Revert previews of a unit that never reached its commit
    pub(crate) fn abort(&mut self, doc: &mut Document) -> Result<()> {
        match self {
            Transaction::Request(r) => r.abort(doc),
            Transaction::Composite(c) => c.abort(doc),
        }
    }
}

impl Reversible for Transaction {
    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        match self {
            Transaction::Request(r) => r.undo(doc),
            Transaction::Composite(c) => c.undo(doc),
        }
    }

    fn redo(&mut self, doc: &mut Document) -> Result<()> {
        match self {
            Transaction::Request(r) => r.redo(doc),
            Transaction::Composite(c) => c.redo(doc),
        }
    }
}

impl From<Request> for Transaction {
    fn from(r: Request) -> Self {
        Transaction::Request(r)
    }
}

impl From<CompositeRequest> for Transaction {
    fn from(c: CompositeRequest) -> Self {
        Transaction::Composite(c)
    }
}

/// Top-level history unit
#[derive(Debug)]
pub enum HistoryUnit {
    Request(Request),
    Composite(CompositeRequest),
    Session(SessionRecord),
}

impl HistoryUnit {
    pub fn description(&self) -> String {
        match self {
            HistoryUnit::Request(r) => r.description(),
            HistoryUnit::Composite(c) => c.description().to_string(),
            HistoryUnit::Session(s) => s.description().to_string(),
        }
    }

    pub fn category(&self) -> String {
        match self {
            HistoryUnit::Request(r) => r.category().to_string(),
            HistoryUnit::Composite(c) => c.category().to_string(),
            HistoryUnit::Session(s) => s.category().to_string(),
        }
    }

    pub fn unit_type(&self) -> UnitType {
        match self {
            HistoryUnit::Request(_) => UnitType::Request,
            HistoryUnit::Composite(_) => UnitType::Composite,
            HistoryUnit::Session(_) => UnitType::Session,
        }
    }
}

impl Reversible for HistoryUnit {
    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        match self {
            HistoryUnit::Request(r) => r.undo(doc),
            HistoryUnit::Composite(c) => c.undo(doc),
            HistoryUnit::Session(s) => s.undo(doc),
        }
    }

    fn redo(&mut self, doc: &mut Document) -> Result<()> {
        match self {
            HistoryUnit::Request(r) => r.redo(doc),
            HistoryUnit::Composite(c) => c.redo(doc),
            HistoryUnit::Session(s) => s.redo(doc),
        }
    }
}

impl From<Transaction> for HistoryUnit {
    fn from(t: Transaction) -> Self {
        match t {
            Transaction::Request(r) => HistoryUnit::Request(r),
            Transaction::Composite(c) => HistoryUnit::Composite(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Request,
    Composite,
    Session,
}

/// A unit plus the time it entered history
#[derive(Debug)]
pub struct HistoryEntry {
    pub unit: HistoryUnit,
    pub committed_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(unit: impl Into<HistoryUnit>) -> Self {
        Self {
            unit: unit.into(),
            committed_at: Utc::now(),
        }
    }

    pub fn info(&self) -> HistoryEntryInfo {
        HistoryEntryInfo {
            description: self.unit.description(),
            category: self.unit.category(),
            unit_type: self.unit.unit_type(),
            committed_at: self.committed_at,
        }
    }
}

/// What an undo-history panel or telemetry sink sees of an entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntryInfo {
    pub description: String,
    pub category: String,
    pub unit_type: UnitType,
    pub committed_at: DateTime<Utc>,
}

// ============================================================================
// Stack
// ============================================================================

/// Cursor-addressed history with a depth cap
pub struct HistoryStack<T> {
    entries: VecDeque<T>,
    cursor: usize,
    /// 0 = unbounded
    max_depth: usize,
}

impl<T> HistoryStack<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            max_depth,
        }
    }

    /// Append at the cursor, discarding the redo tail
    ///
    /// Returns how many entries were discarded (redo tail plus evictions).
    pub fn push(&mut self, entry: T) -> usize {
        let truncated = self.entries.len() - self.cursor;
        self.entries.truncate(self.cursor);
        self.entries.push_back(entry);
        self.cursor = self.entries.len();
        truncated + self.enforce_limits()
    }

    /// Evict undoable entries oldest first, then trim the far end of the
    /// redo tail
    ///
    /// A redoable entry is never evicted from the front: its after-state was
    /// captured on top of every entry before it.
    fn enforce_limits(&mut self) -> usize {
        if self.max_depth == 0 {
            return 0;
        }
        let mut evicted = 0;
        while self.entries.len() > self.max_depth && self.cursor > 0 {
            self.entries.pop_front();
            self.cursor -= 1;
            evicted += 1;
        }
        if self.entries.len() > self.max_depth {
            evicted += self.entries.len() - self.max_depth;
            self.entries.truncate(self.max_depth);
        }
        evicted
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Entry immediately left of the cursor
    pub fn undo_target_mut(&mut self) -> Option<&mut T> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.entries.get_mut(i))
    }

    /// Entry immediately right of the cursor
    pub fn redo_target_mut(&mut self) -> Option<&mut T> {
        self.entries.get_mut(self.cursor)
    }

    pub fn step_back(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn step_forward(&mut self) {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
    }

    /// Drop the entry left of the cursor (it can no longer be undone)
    pub fn discard_undo_target(&mut self) -> Option<T> {
        let index = self.cursor.checked_sub(1)?;
        self.cursor = index;
        self.entries.remove(index)
    }

    /// Drop every redoable entry
    pub fn truncate_redo(&mut self) -> usize {
        let dropped = self.entries.len() - self.cursor;
        self.entries.truncate(self.cursor);
        dropped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        self.enforce_limits();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl HistoryStack<HistoryEntry> {
    pub fn next_undo_description(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|e| e.unit.description())
    }

    pub fn next_redo_description(&self) -> Option<String> {
        self.entries.get(self.cursor).map(|e| e.unit.description())
    }
}

impl<T> fmt::Debug for HistoryStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStack")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stack(items: &[&'static str]) -> HistoryStack<&'static str> {
        let mut s = HistoryStack::new(0);
        for item in items {
            s.push(*item);
        }
        s
    }

    #[test]
    fn test_push_truncates_redo_tail() {
        let mut s = stack(&["A", "B", "C"]);
        s.step_back();
        s.step_back();
        assert_eq!(s.cursor(), 1);

        let dropped = s.push("D");

        assert_eq!(dropped, 2);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec!["A", "D"]);
        assert_eq!(s.cursor(), 2);
        assert!(!s.can_redo());
    }

    #[test]
    fn test_depth_cap_evicts_oldest() {
        let mut s = HistoryStack::new(2);
        s.push(1);
        s.push(2);
        let evicted = s.push(3);

        assert_eq!(evicted, 1);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn test_lowering_cap_keeps_redo_order() {
        // GIVEN everything undone
        let mut s = stack(&["A", "B", "C"]);
        s.step_back();
        s.step_back();
        s.step_back();

        // WHEN the cap drops below the length
        s.set_max_depth(2);

        // THEN the far end of the redo tail goes, not the next redo target
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.redo_target_mut().copied(), Some("A"));
    }

    #[test]
    fn test_lowering_cap_evicts_undoable_before_redoable() {
        let mut s = stack(&["A", "B", "C", "D"]);
        s.step_back();
        s.step_back();

        s.set_max_depth(1);

        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec!["C"]);
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_discard_undo_target() {
        let mut s = stack(&["A", "B", "C"]);
        s.step_back();

        assert_eq!(s.discard_undo_target(), Some("B"));
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(s.cursor(), 1);
        assert_eq!(s.redo_target_mut().copied(), Some("C"));
    }

    #[test]
    fn test_empty_stack_targets() {
        let mut s: HistoryStack<u8> = HistoryStack::new(25);
        assert!(s.undo_target_mut().is_none());
        assert!(s.redo_target_mut().is_none());
        assert!(s.discard_undo_target().is_none());
        s.step_back();
        assert_eq!(s.cursor(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push,
        Undo,
        Redo,
    }

    proptest! {
        #[test]
        fn prop_cursor_matches_model(
            ops in prop::collection::vec(
                prop_oneof![Just(Op::Push), Just(Op::Undo), Just(Op::Redo)],
                0..64,
            ),
            max_depth in 0usize..8,
        ) {
            let mut s = HistoryStack::new(max_depth);
            let mut model: Vec<u32> = Vec::new();
            let mut cursor = 0usize;
            let mut next = 0u32;

            for op in ops {
                match op {
                    Op::Push => {
                        model.truncate(cursor);
                        model.push(next);
                        if max_depth > 0 && model.len() > max_depth {
                            model.remove(0);
                        }
                        cursor = model.len();
                        s.push(next);
                        next += 1;
                    }
                    Op::Undo => {
                        if s.can_undo() {
                            s.step_back();
                            cursor -= 1;
                        }
                    }
                    Op::Redo => {
                        if s.can_redo() {
                            s.step_forward();
                            cursor += 1;
                        }
                    }
                }
                prop_assert!(s.cursor() <= s.len());
                prop_assert_eq!(s.cursor(), cursor);
                prop_assert_eq!(s.iter().copied().collect::<Vec<_>>(), model.clone());
            }
        }
    }
}
