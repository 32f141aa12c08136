//! Sessions
//!
//! A session folds every commit made while it is open into one history
//! entry. Typical use: a bulk operation that commits per item (so geometry
//! side effects run in order) but must undo as a single step.
//!
//! Dropping a [`SessionHandle`] without committing rolls back every commit it
//! captured, last first.

use atelier_core::{AtelierError, Document, Result};
use atelier_core_types::SessionId;

use crate::history::Transaction;
use crate::manager::TransactionManager;
use crate::reversible::{redo_in_order, undo_in_reverse, Reversible};

/// Settings for a new session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub description: String,
    pub category: String,
    /// When false the folded entry is not recorded in history
    pub undo_redo: bool,
}

impl SessionOptions {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: "session".to_string(),
            undo_redo: true,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn without_undo_redo(mut self) -> Self {
        self.undo_redo = false;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new("Session")
    }
}

/// How an open session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// One history entry for everything
    Fold,
    /// One history entry per captured unit
    Each,
    /// Undo everything, record nothing
    Abort,
}

/// Commit captured by an open session
#[derive(Debug)]
pub(crate) struct Captured {
    pub(crate) unit: Transaction,
    /// False for unrecorded commits: rolled back on abort, never folded
    pub(crate) record: bool,
}

/// Session state while it records
#[derive(Debug)]
pub(crate) struct OpenSession {
    pub(crate) id: SessionId,
    pub(crate) options: SessionOptions,
    pub(crate) pending: Vec<Captured>,
}

impl OpenSession {
    pub(crate) fn new(options: SessionOptions) -> Self {
        Self {
            id: SessionId::new(),
            options,
            pending: Vec::new(),
        }
    }

    pub(crate) fn capture(&mut self, unit: Transaction, record: bool) {
        self.pending.push(Captured { unit, record });
    }

    /// Fold into a history record; unrecorded commits are left out
    pub(crate) fn into_record(self) -> SessionRecord {
        let units = self
            .pending
            .into_iter()
            .filter(|captured| captured.record)
            .map(|captured| captured.unit)
            .collect();
        SessionRecord {
            id: self.id,
            description: self.options.description,
            category: self.options.category,
            units,
        }
    }
}

/// Folded session as stored in history
#[derive(Debug)]
pub struct SessionRecord {
    id: SessionId,
    description: String,
    category: String,
    units: Vec<Transaction>,
}

impl SessionRecord {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn units(&self) -> &[Transaction] {
        &self.units
    }
}

impl Reversible for SessionRecord {
    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        undo_in_reverse(&mut self.units, doc)
    }

    fn redo(&mut self, doc: &mut Document) -> Result<()> {
        redo_in_order(&mut self.units, doc)
    }
}

/// Caller's handle on the open session
///
/// Exactly one of `commit`, `commit_each` or `abort` ends the session; if
/// none succeeds, dropping the handle aborts it.
#[must_use = "dropping a session handle rolls back its commits"]
pub struct SessionHandle {
    manager: TransactionManager,
    id: SessionId,
    finished: bool,
}

impl SessionHandle {
    pub(crate) fn new(manager: TransactionManager, id: SessionId) -> Self {
        Self {
            manager,
            id,
            finished: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Number of units captured so far
    pub fn pending_len(&self) -> usize {
        self.manager.session_pending_len(&self.id)
    }

    /// Fold every captured commit into one history entry
    ///
    /// An empty session records nothing.
    ///
    /// # Errors
    ///
    /// `SessionNotOpen` if the session was already aborted (for example by
    /// an undo), `TransactionInProgress` while a commit is suspended. On
    /// error the handle is dropped and the session rolled back.
    pub fn commit(mut self) -> Result<()> {
        self.manager.end_session(&self.id, SessionEnd::Fold)?;
        self.finished = true;
        Ok(())
    }

    /// Record every captured commit as its own history entry
    ///
    /// # Errors
    ///
    /// Same as [`SessionHandle::commit`].
    pub fn commit_each(mut self) -> Result<()> {
        self.manager.end_session(&self.id, SessionEnd::Each)?;
        self.finished = true;
        Ok(())
    }

    /// Undo every captured commit, last first
    ///
    /// # Errors
    ///
    /// `SessionNotOpen` if already closed, or the first undo failure; the
    /// remaining units are still undone.
    pub fn abort(mut self) -> Result<()> {
        let result = self.manager.end_session(&self.id, SessionEnd::Abort);
        // a busy manager leaves the rollback to drop
        if !matches!(result, Err(AtelierError::TransactionInProgress { .. })) {
            self.finished = true;
        }
        result
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if !self.finished {
            self.manager.abandon_session(&self.id);
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("finished", &self.finished)
            .finish()
    }
}
