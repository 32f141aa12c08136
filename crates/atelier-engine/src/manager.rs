//! Transaction manager
//!
//! Factory and orchestrator for requests: creates them through the
//! registry, commits them (routing into an open session or onto the history
//! stack), and drives undo/redo.
//!
//! ## Logging Ownership
//!
//! The manager owns lifecycle logging for its public operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Requests, composites and the history stack use only `tracing::debug!()`.
//!
//! ## Scheduling
//!
//! Single-threaded and cooperative. While an async commit is suspended the
//! manager lends the document out to it; any other document access, undo or
//! redo in the meantime fails with `TransactionInProgress` instead of
//! interleaving.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;
use std::time::Instant;

use atelier_core::{log_op_end, log_op_error, log_op_start};
use atelier_core::{
    AtelierError, Document, EngineConfig, ExError, GeometryKernel, Mutation, PlanarKernel,
    RequestKind, RequestParams, RequestResult, Result,
};
use atelier_core_types::SessionId;
use serde_json::Value;

use crate::events::{ListenerId, Recorded, TransactionEvent};
use crate::history::{HistoryEntry, HistoryEntryInfo, HistoryStack, HistoryUnit, Transaction};
use crate::registry::RequestRegistry;
use crate::request::Request;
use crate::reversible::Reversible;
use crate::session::{OpenSession, SessionEnd, SessionHandle, SessionOptions};

type Listener = Rc<dyn Fn(&TransactionEvent)>;

fn busy(op: &str) -> AtelierError {
    AtelierError::TransactionInProgress { op: op.to_string() }
}

struct ManagerState {
    history: HistoryStack<HistoryEntry>,
    session: Option<OpenSession>,
    undo_enabled: bool,
    block_depth: usize,
}

struct Shared {
    config: EngineConfig,
    kernel: Rc<dyn GeometryKernel>,
    /// `None` while lent to a suspended commit
    document: RefCell<Option<Document>>,
    state: RefCell<ManagerState>,
    registry: RefCell<RequestRegistry>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener: Cell<u64>,
    /// Sessions dropped while the manager was busy; rolled back when it frees up
    abandoned: RefCell<Vec<SessionId>>,
    /// Units refused while the document was lent out; their previews are
    /// reverted when it comes back
    refused: RefCell<Vec<Transaction>>,
}

/// Document lent to an in-flight commit; returned on drop, even if the
/// commit future is dropped mid-suspension
struct DocumentLease<'m> {
    slot: &'m RefCell<Option<Document>>,
    doc: Document,
}

impl<'m> DocumentLease<'m> {
    fn take(slot: &'m RefCell<Option<Document>>, op: &str) -> Result<Self> {
        let doc = slot
            .try_borrow_mut()
            .map_err(|_| busy(op))?
            .take()
            .ok_or_else(|| busy(op))?;
        Ok(Self { slot, doc })
    }
}

impl Drop for DocumentLease<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.try_borrow_mut() {
            *slot = Some(std::mem::take(&mut self.doc));
        }
    }
}

/// Builder for [`TransactionManager`]
pub struct TransactionManagerBuilder {
    config: EngineConfig,
    document: Document,
    kernel: Rc<dyn GeometryKernel>,
    registry: RequestRegistry,
}

impl TransactionManagerBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    pub fn kernel(mut self, kernel: Rc<dyn GeometryKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn registry(mut self, registry: RequestRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> TransactionManager {
        let state = ManagerState {
            history: HistoryStack::new(self.config.max_undo_steps),
            session: None,
            undo_enabled: self.config.undo_enabled,
            block_depth: 0,
        };
        TransactionManager {
            shared: Rc::new(Shared {
                config: self.config,
                kernel: self.kernel,
                document: RefCell::new(Some(self.document)),
                state: RefCell::new(state),
                registry: RefCell::new(self.registry),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                abandoned: RefCell::new(Vec::new()),
                refused: RefCell::new(Vec::new()),
            }),
        }
    }
}

/// Shared handle on one document's transaction machinery
///
/// Cloning is cheap; every clone drives the same document and history.
#[derive(Clone)]
pub struct TransactionManager {
    shared: Rc<Shared>,
}

impl TransactionManager {
    pub fn builder() -> TransactionManagerBuilder {
        TransactionManagerBuilder {
            config: EngineConfig::default(),
            document: Document::new(),
            kernel: Rc::new(PlanarKernel::default()),
            registry: RequestRegistry::with_defaults(),
        }
    }

    pub fn new(config: EngineConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn kernel(&self) -> Rc<dyn GeometryKernel> {
        self.shared.kernel.clone()
    }

    // ========================================================================
    // Document access
    // ========================================================================

    /// # Errors
    ///
    /// `TransactionInProgress` while a commit holds the document.
    pub fn document(&self) -> Result<Ref<'_, Document>> {
        let slot = self
            .shared
            .document
            .try_borrow()
            .map_err(|_| busy("read document"))?;
        Ref::filter_map(slot, Option::as_ref).map_err(|_| busy("read document"))
    }

    /// Direct document access for out-of-band edits (seeding, collaborators)
    ///
    /// Edits made here bypass history.
    ///
    /// # Errors
    ///
    /// `TransactionInProgress` while a commit holds the document.
    pub fn document_mut(&self) -> Result<RefMut<'_, Document>> {
        self.doc_mut("edit document")
    }

    /// # Errors
    ///
    /// `TransactionInProgress` while a commit holds the document.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> Result<R> {
        let doc = self.document()?;
        Ok(f(&doc))
    }

    fn doc_mut(&self, op: &str) -> Result<RefMut<'_, Document>> {
        let slot = self
            .shared
            .document
            .try_borrow_mut()
            .map_err(|_| busy(op))?;
        RefMut::filter_map(slot, Option::as_mut).map_err(|_| busy(op))
    }

    fn state_mut(&self, op: &str) -> Result<RefMut<'_, ManagerState>> {
        self.shared.state.try_borrow_mut().map_err(|_| busy(op))
    }

    fn read_state<R>(&self, f: impl FnOnce(&ManagerState) -> R) -> Option<R> {
        self.shared.state.try_borrow().ok().map(|state| f(&state))
    }

    fn update_state<R>(&self, f: impl FnOnce(&mut ManagerState) -> R) -> Option<R> {
        let result = self
            .shared
            .state
            .try_borrow_mut()
            .ok()
            .map(|mut state| f(&mut state));
        if result.is_none() {
            tracing::debug!("manager state busy, update skipped");
        }
        result
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Install or replace the factory for `kind`
    pub fn register<F>(&self, kind: RequestKind, factory: F)
    where
        F: Fn(RequestParams) -> Result<Box<dyn Mutation>> + 'static,
    {
        if let Ok(mut registry) = self.shared.registry.try_borrow_mut() {
            registry.register(kind, factory);
        }
    }

    pub fn unregister(&self, kind: RequestKind) -> bool {
        self.shared
            .registry
            .try_borrow_mut()
            .map(|mut registry| registry.unregister(kind))
            .unwrap_or(false)
    }

    pub fn registered_kinds(&self) -> Vec<RequestKind> {
        self.shared
            .registry
            .try_borrow()
            .map(|registry| registry.kinds())
            .unwrap_or_default()
    }

    /// Build a request for `params` through the registry
    ///
    /// # Errors
    ///
    /// `UnknownRequestType` when no factory is registered for the kind.
    pub fn create_request(&self, params: RequestParams) -> Result<Request> {
        let factory = self
            .shared
            .registry
            .try_borrow()
            .map_err(|_| busy("create request"))?
            .factory(params.kind())
            .map_err(|e| {
                tracing::debug!(kind = %params.kind(), "no factory registered");
                e
            })?;
        let mutation = factory(params.clone())?;
        let request = Request::new(params, mutation);
        tracing::debug!(request_id = %request.id(), kind = %request.kind(), "request created");
        self.emit(TransactionEvent::Created {
            request_id: request.id().clone(),
            kind: request.kind(),
        });
        Ok(request)
    }

    /// Build a request from a kind name and untyped parameters
    ///
    /// # Errors
    ///
    /// `UnknownRequestType` for an unknown name, `InvalidParams` when the
    /// parameters do not fit the kind.
    pub fn create_request_by_name(&self, kind: &str, params: Value) -> Result<Request> {
        let kind: RequestKind = kind.parse()?;
        self.create_request(RequestParams::from_json(kind, params)?)
    }

    // ========================================================================
    // Field transactions
    // ========================================================================

    /// Apply an interactive preview to an uncommitted request
    ///
    /// Previews never reach history; only the final commit does.
    ///
    /// # Errors
    ///
    /// `TransactionInProgress` while a commit holds the document, otherwise
    /// whatever [`Request::receive`] reports.
    pub fn receive(&self, request: &mut Request, action: &str, data: &Value) -> Result<bool> {
        let mut doc = self.doc_mut("receive")?;
        request.receive(&mut doc, self.shared.kernel.as_ref(), action, data)
    }

    /// Revert an uncommitted request's previews and close it
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` for a committed request, `TransactionInProgress`
    /// while a commit holds the document.
    pub fn abort(&self, request: &mut Request) -> Result<()> {
        {
            let mut doc = self.doc_mut("abort")?;
            request.abort(&mut doc)?;
        }
        tracing::debug!(request_id = %request.id(), "request aborted");
        self.emit(TransactionEvent::Aborted {
            request_id: request.id().clone(),
        });
        Ok(())
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Commit a request or composite and wait for it
    ///
    /// Runs the async commit to completion on the calling thread; commits
    /// that never suspend return immediately.
    ///
    /// # Errors
    ///
    /// See [`TransactionManager::commit_async`].
    pub fn commit(&self, unit: impl Into<Transaction>) -> Result<RequestResult> {
        futures::executor::block_on(self.commit_async(unit))
    }

    /// Commit a request or composite
    ///
    /// With a session open the unit is captured by the session; otherwise it
    /// is pushed onto history and the redo tail is discarded.
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` for a unit that already ran, the unit's own failure
    /// (`CommitFailed`, `EntityNotFound`, ...), or `TransactionInProgress`
    /// if another commit is suspended.
    pub async fn commit_async(&self, unit: impl Into<Transaction>) -> Result<RequestResult> {
        self.commit_with(unit.into(), true).await
    }

    /// Commit without recording history or session membership
    ///
    /// # Errors
    ///
    /// Same as [`TransactionManager::commit_async`].
    pub fn commit_unrecorded(&self, unit: impl Into<Transaction>) -> Result<RequestResult> {
        futures::executor::block_on(self.commit_with(unit.into(), false))
    }

    async fn commit_with(&self, unit: Transaction, record: bool) -> Result<RequestResult> {
        let description = unit.description();
        log_op_start!(
            "commit",
            request_kind = unit.kind_name(),
            description = %description
        );
        let start = Instant::now();

        let (result, recorded) = self
            .commit_impl(unit, record, &description)
            .await
            .map_err(|e| {
                self.emit(TransactionEvent::CommitFailed {
                    description: description.clone(),
                    code: ExError::from(e.clone()).code(),
                });
                log_op_error!(
                    "commit",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        self.emit(TransactionEvent::Committed {
            description,
            recorded,
        });
        if recorded == Recorded::History {
            self.emit_state_changed();
        }
        log_op_end!(
            "commit",
            duration_ms = start.elapsed().as_millis() as u64,
            recorded = ?recorded
        );
        Ok(result)
    }

    async fn commit_impl(
        &self,
        mut unit: Transaction,
        record: bool,
        description: &str,
    ) -> Result<(RequestResult, Recorded)> {
        self.reap_abandoned();
        self.emit(TransactionEvent::Committing {
            description: description.to_string(),
        });

        let outcome = {
            let mut lease = match DocumentLease::take(&self.shared.document, "commit") {
                Ok(lease) => lease,
                Err(e) => {
                    self.defer_rollback(unit);
                    return Err(e);
                }
            };
            let kernel = self.shared.kernel.clone();
            unit.commit(&mut lease.doc, kernel.as_ref()).await
        };
        let outcome = outcome.and_then(|result| {
            let recorded = self.record(unit, record)?;
            Ok((result, recorded))
        });

        self.reap_abandoned();
        outcome
    }

    fn record(&self, unit: Transaction, record: bool) -> Result<Recorded> {
        let mut state = self.state_mut("commit")?;
        // unrecorded commits still join the session so an abort rolls them back
        if let Some(session) = state.session.as_mut() {
            session.capture(unit, record);
            tracing::debug!(
                session_id = %session.id,
                pending = session.pending.len(),
                record,
                "commit captured by session"
            );
            return Ok(if record {
                Recorded::Session
            } else {
                Recorded::Skipped
            });
        }
        if !record || !state.undo_enabled {
            return Ok(Recorded::Skipped);
        }
        let dropped = state.history.push(HistoryEntry::new(unit));
        tracing::debug!(
            dropped,
            history_len = state.history.len(),
            cursor = state.history.cursor(),
            "history entry pushed"
        );
        Ok(Recorded::History)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Open a session; commits are captured by it until it ends
    ///
    /// # Errors
    ///
    /// `SessionAlreadyOpen` if a session is already recording.
    pub fn start_session(&self, options: SessionOptions) -> Result<SessionHandle> {
        log_op_start!("start_session", description = %options.description);
        let start = Instant::now();
        self.reap_abandoned();

        let session_id = self.start_session_impl(options).map_err(|e| {
            log_op_error!(
                "start_session",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "start_session",
            duration_ms = start.elapsed().as_millis() as u64,
            session_id = %session_id
        );
        self.emit(TransactionEvent::SessionStarted {
            session_id: session_id.clone(),
        });
        Ok(SessionHandle::new(self.clone(), session_id))
    }

    fn start_session_impl(&self, options: SessionOptions) -> Result<SessionId> {
        let mut state = self.state_mut("start_session")?;
        if let Some(open) = &state.session {
            return Err(AtelierError::SessionAlreadyOpen {
                session_id: open.id.clone(),
            });
        }
        let session = OpenSession::new(options);
        let session_id = session.id.clone();
        state.session = Some(session);
        Ok(session_id)
    }

    pub fn has_open_session(&self) -> bool {
        self.read_state(|state| state.session.is_some())
            .unwrap_or(false)
    }

    pub(crate) fn session_pending_len(&self, session_id: &SessionId) -> usize {
        self.read_state(|state| match &state.session {
            Some(open) if open.id == *session_id => open.pending.len(),
            _ => 0,
        })
        .unwrap_or(0)
    }

    pub(crate) fn end_session(&self, session_id: &SessionId, end: SessionEnd) -> Result<()> {
        let op = match end {
            SessionEnd::Fold => "commit_session",
            SessionEnd::Each => "commit_session_each",
            SessionEnd::Abort => "abort_session",
        };
        log_op_start!(op, session_id = %session_id);
        let start = Instant::now();

        let units = self.end_session_impl(session_id, end).map_err(|e| {
            log_op_error!(
                op,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            op,
            duration_ms = start.elapsed().as_millis() as u64,
            units = units as u64
        );
        let session_id = session_id.clone();
        self.emit(match end {
            SessionEnd::Abort => TransactionEvent::SessionAborted { session_id, units },
            SessionEnd::Fold | SessionEnd::Each => {
                TransactionEvent::SessionCommitted { session_id, units }
            }
        });
        self.emit_state_changed();
        Ok(())
    }

    fn end_session_impl(&self, session_id: &SessionId, end: SessionEnd) -> Result<usize> {
        // rollback needs the document; fail before closing the session if it is lent out
        let mut doc = match end {
            SessionEnd::Abort => Some(self.doc_mut("abort_session")?),
            SessionEnd::Fold | SessionEnd::Each => None,
        };
        let mut state = self.state_mut("end_session")?;

        let session = match state.session.take() {
            Some(open) if open.id == *session_id => open,
            other => {
                state.session = other;
                return Err(AtelierError::SessionNotOpen {
                    session_id: session_id.clone(),
                });
            }
        };
        let units = session.pending.len();
        let recordable = session.options.undo_redo
            && state.undo_enabled
            && session.pending.iter().any(|captured| captured.record);

        match (end, doc.as_deref_mut()) {
            (SessionEnd::Fold, _) => {
                if recordable {
                    state
                        .history
                        .push(HistoryEntry::new(HistoryUnit::Session(session.into_record())));
                }
            }
            (SessionEnd::Each, _) => {
                if recordable {
                    for captured in session.pending.into_iter().filter(|c| c.record) {
                        state.history.push(HistoryEntry::new(captured.unit));
                    }
                }
            }
            (SessionEnd::Abort, Some(doc)) => {
                let mut pending = session.pending;
                let mut first_error = None;
                for captured in pending.iter_mut().rev() {
                    if let Err(e) = captured.unit.undo(doc) {
                        tracing::debug!(error = %e, "session rollback step failed");
                        first_error.get_or_insert(e);
                    }
                }
                if let Some(e) = first_error {
                    return Err(e);
                }
            }
            (SessionEnd::Abort, None) => {}
        }
        Ok(units)
    }

    /// Roll back a session whose handle was dropped without ending it
    pub(crate) fn abandon_session(&self, session_id: &SessionId) {
        match self.shared.state.try_borrow() {
            Ok(state) if state.session.as_ref().map(|s| &s.id) != Some(session_id) => return,
            Ok(_) => {}
            Err(_) => {
                self.queue_abandoned(session_id);
                return;
            }
        }
        match self.end_session(session_id, SessionEnd::Abort) {
            Ok(()) | Err(AtelierError::SessionNotOpen { .. }) => {}
            Err(AtelierError::TransactionInProgress { .. }) => self.queue_abandoned(session_id),
            Err(e) => tracing::debug!(error = %e, "abandoned session rollback incomplete"),
        }
    }

    fn queue_abandoned(&self, session_id: &SessionId) {
        if let Ok(mut queue) = self.shared.abandoned.try_borrow_mut() {
            tracing::debug!(session_id = %session_id, "session rollback deferred");
            queue.push(session_id.clone());
        }
    }

    fn defer_rollback(&self, unit: Transaction) {
        tracing::debug!(description = %unit.description(), "refused unit queued for rollback");
        if let Ok(mut queue) = self.shared.refused.try_borrow_mut() {
            queue.push(unit);
        }
    }

    /// Revert previews of refused units, then roll back abandoned sessions
    fn reap_abandoned(&self) {
        self.reap_refused();
        let queued = match self.shared.abandoned.try_borrow_mut() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => return,
        };
        for session_id in queued {
            self.abandon_session(&session_id);
        }
    }

    fn reap_refused(&self) {
        let Ok(mut doc) = self.doc_mut("rollback refused commit") else {
            return;
        };
        let refused = match self.shared.refused.try_borrow_mut() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => return,
        };
        for mut unit in refused.into_iter().rev() {
            if let Err(e) = unit.abort(&mut doc) {
                tracing::debug!(error = %e, "refused unit had nothing to revert");
            }
        }
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    /// Undo the entry left of the cursor
    ///
    /// Returns `Ok(false)` when there is nothing to undo. An open session is
    /// aborted first.
    ///
    /// # Errors
    ///
    /// `UndoRedoBlocked` while blocked; `UndoTargetMissing` when the entry
    /// cannot be undone, in which case it is discarded from history.
    pub fn undo(&self) -> Result<bool> {
        log_op_start!("undo");
        let start = Instant::now();

        let undone = self.undo_impl().map_err(|e| {
            log_op_error!(
                "undo",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "undo",
            duration_ms = start.elapsed().as_millis() as u64,
            undone = undone
        );
        Ok(undone)
    }

    fn undo_impl(&self) -> Result<bool> {
        self.reap_abandoned();
        self.prepare_undo_redo("undo")?;

        let mut events = Vec::new();
        let outcome = {
            let mut doc = self.doc_mut("undo")?;
            let mut state = self.state_mut("undo")?;
            let Some(entry) = state.history.undo_target_mut() else {
                tracing::debug!("nothing to undo");
                return Ok(false);
            };
            let description = entry.unit.description();
            events.push(TransactionEvent::Undoing {
                description: description.clone(),
            });
            match entry.unit.undo(&mut doc) {
                Ok(()) => {
                    state.history.step_back();
                    events.push(TransactionEvent::Undone { description });
                    Ok(true)
                }
                Err(e @ AtelierError::UndoTargetMissing { .. }) => {
                    state.history.discard_undo_target();
                    events.push(TransactionEvent::EntryDiscarded {
                        description,
                        reason: e.to_string(),
                    });
                    Err(e)
                }
                Err(e) => Err(e),
            }
        };

        for event in events {
            self.emit(event);
        }
        self.emit_state_changed();
        outcome
    }

    /// Redo the entry right of the cursor
    ///
    /// Returns `Ok(false)` when there is nothing to redo. An open session is
    /// aborted first.
    ///
    /// # Errors
    ///
    /// `UndoRedoBlocked` while blocked; `UndoTargetMissing` when the entry
    /// cannot be replayed, in which case it and every later entry are
    /// discarded.
    pub fn redo(&self) -> Result<bool> {
        log_op_start!("redo");
        let start = Instant::now();

        let redone = self.redo_impl().map_err(|e| {
            log_op_error!(
                "redo",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "redo",
            duration_ms = start.elapsed().as_millis() as u64,
            redone = redone
        );
        Ok(redone)
    }

    fn redo_impl(&self) -> Result<bool> {
        self.reap_abandoned();
        self.prepare_undo_redo("redo")?;

        let mut events = Vec::new();
        let outcome = {
            let mut doc = self.doc_mut("redo")?;
            let mut state = self.state_mut("redo")?;
            let Some(entry) = state.history.redo_target_mut() else {
                tracing::debug!("nothing to redo");
                return Ok(false);
            };
            let description = entry.unit.description();
            events.push(TransactionEvent::Redoing {
                description: description.clone(),
            });
            match entry.unit.redo(&mut doc) {
                Ok(()) => {
                    state.history.step_forward();
                    events.push(TransactionEvent::Redone { description });
                    Ok(true)
                }
                Err(e @ AtelierError::UndoTargetMissing { .. }) => {
                    let dropped = state.history.truncate_redo();
                    tracing::debug!(dropped, "redo tail discarded");
                    events.push(TransactionEvent::EntryDiscarded {
                        description,
                        reason: e.to_string(),
                    });
                    Err(e)
                }
                Err(e) => Err(e),
            }
        };

        for event in events {
            self.emit(event);
        }
        self.emit_state_changed();
        outcome
    }

    fn prepare_undo_redo(&self, op: &str) -> Result<()> {
        let open = {
            let state = self.shared.state.try_borrow().map_err(|_| busy(op))?;
            if state.block_depth > 0 {
                return Err(AtelierError::UndoRedoBlocked);
            }
            state.session.as_ref().map(|s| s.id.clone())
        };
        if let Some(session_id) = open {
            self.end_session(&session_id, SessionEnd::Abort)?;
        }
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.read_state(|state| state.block_depth == 0 && state.history.can_undo())
            .unwrap_or(false)
    }

    pub fn can_redo(&self) -> bool {
        self.read_state(|state| state.block_depth == 0 && state.history.can_redo())
            .unwrap_or(false)
    }

    /// Nested: every block needs a matching unblock
    pub fn block_undo_redo(&self) {
        self.update_state(|state| state.block_depth += 1);
        self.emit_state_changed();
    }

    pub fn unblock_undo_redo(&self) {
        self.update_state(|state| state.block_depth = state.block_depth.saturating_sub(1));
        self.emit_state_changed();
    }

    pub fn is_undo_redo_blocked(&self) -> bool {
        self.read_state(|state| state.block_depth > 0)
            .unwrap_or(false)
    }

    // ========================================================================
    // History management
    // ========================================================================

    /// Stop recording; clears the history
    pub fn disable(&self) {
        self.update_state(|state| {
            state.undo_enabled = false;
            state.history.clear();
        });
        self.emit_state_changed();
    }

    pub fn enable(&self) {
        self.update_state(|state| state.undo_enabled = true);
    }

    pub fn is_enabled(&self) -> bool {
        self.read_state(|state| state.undo_enabled)
            .unwrap_or(false)
    }

    pub fn clear_history(&self) {
        self.update_state(|state| state.history.clear());
        self.emit_state_changed();
    }

    pub fn set_max_undo_steps(&self, steps: usize) {
        self.update_state(|state| state.history.set_max_depth(steps));
    }

    pub fn cursor(&self) -> usize {
        self.read_state(|state| state.history.cursor())
            .unwrap_or(0)
    }

    pub fn history_len(&self) -> usize {
        self.read_state(|state| state.history.len())
            .unwrap_or(0)
    }

    /// Entries oldest first
    pub fn history(&self) -> Vec<HistoryEntryInfo> {
        self.read_state(|state| state.history.iter().map(HistoryEntry::info).collect())
            .unwrap_or_default()
    }

    pub fn next_undo_description(&self) -> Option<String> {
        self.read_state(|state| state.history.next_undo_description())
            .flatten()
    }

    pub fn next_redo_description(&self) -> Option<String> {
        self.read_state(|state| state.history.next_redo_description())
            .flatten()
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn subscribe(&self, listener: impl Fn(&TransactionEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.shared.next_listener.get());
        self.shared.next_listener.set(id.0 + 1);
        if let Ok(mut listeners) = self.shared.listeners.try_borrow_mut() {
            listeners.push((id, Rc::new(listener)));
        }
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared
            .listeners
            .try_borrow_mut()
            .map(|mut listeners| {
                let before = listeners.len();
                listeners.retain(|(listener_id, _)| *listener_id != id);
                listeners.len() != before
            })
            .unwrap_or(false)
    }

    fn emit(&self, event: TransactionEvent) {
        let listeners: Vec<Listener> = match self.shared.listeners.try_borrow() {
            Ok(listeners) => listeners.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(&event);
        }
    }

    fn emit_state_changed(&self) {
        let (can_undo, can_redo) = (self.can_undo(), self.can_redo());
        self.emit(TransactionEvent::UndoRedoStateChanged { can_undo, can_redo });
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("history_len", &self.history_len())
            .field("cursor", &self.cursor())
            .field("open_session", &self.has_open_session())
            .finish()
    }
}
