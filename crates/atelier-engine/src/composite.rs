//! Composite requests
//!
//! Ordered batch of requests committed, undone and redone as one unit.
//! Sub-requests commit strictly one after another; a later sub-request may
//! read what an earlier one wrote.
//!
//! A failing sub-request stops the batch. Sub-requests that already
//! committed stay applied: batches are built from operations that are each
//! safe to leave in place (hide N contents, delete N instances).

use std::cell::Cell;
use std::rc::Rc;

use atelier_core::{AtelierError, Document, GeometryKernel, RequestResult, Result};
use atelier_core_types::RequestId;

use crate::request::{Request, RequestState};
use crate::reversible::{redo_in_order, undo_in_reverse, Reversible};

/// Shared view of which sub-request is mid-commit
///
/// Clone it before handing the composite to a commit so progress UI can
/// poll it while the commit is suspended.
#[derive(Debug, Clone, Default)]
pub struct ActiveTracker(Rc<Cell<Option<usize>>>);

impl ActiveTracker {
    /// Index of the sub-request currently committing
    pub fn get(&self) -> Option<usize> {
        self.0.get()
    }

    fn set(&self, index: Option<usize>) {
        self.0.set(index);
    }
}

/// Ordered aggregate of requests
#[derive(Debug)]
pub struct CompositeRequest {
    id: RequestId,
    description: String,
    category: String,
    subs: Vec<Request>,
    state: RequestState,
    active: ActiveTracker,
    failed_at: Option<usize>,
    result: RequestResult,
}

impl CompositeRequest {
    pub fn new(description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            description: description.into(),
            category: category.into(),
            subs: Vec::new(),
            state: RequestState::Created,
            active: ActiveTracker::default(),
            failed_at: None,
            result: RequestResult::None,
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn sub_requests(&self) -> &[Request] {
        &self.subs
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Add a sub-request; only legal before the composite commits
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` if the composite or `request` already committed,
    /// `RequestAborted` if either was aborted.
    pub fn append(&mut self, request: Request) -> Result<&mut Self> {
        match self.state {
            RequestState::Created => {}
            RequestState::Aborted => {
                return Err(AtelierError::RequestAborted {
                    request_id: self.id.clone(),
                })
            }
            _ => {
                return Err(AtelierError::AlreadyCommitted {
                    request_id: self.id.clone(),
                })
            }
        }
        match request.state() {
            RequestState::Created | RequestState::Previewing => {}
            RequestState::Aborted => {
                return Err(AtelierError::RequestAborted {
                    request_id: request.id().clone(),
                })
            }
            RequestState::Committed | RequestState::Undone => {
                return Err(AtelierError::AlreadyCommitted {
                    request_id: request.id().clone(),
                })
            }
        }
        self.subs.push(request);
        Ok(self)
    }

    /// Sub-request that is committing, or that failed the last commit
    pub fn active_request(&self) -> Option<&Request> {
        self.active
            .get()
            .or(self.failed_at)
            .and_then(|i| self.subs.get(i))
    }

    pub fn active_tracker(&self) -> ActiveTracker {
        self.active.clone()
    }

    /// Commit every sub-request in insertion order
    ///
    /// Each sub-request's commit is awaited before the next one starts. The
    /// composite's result is the last sub-request's result.
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` / `RequestAborted` when the composite is closed;
    /// otherwise the first failing sub-request's error. Earlier sub-requests
    /// are not rolled back.
    pub async fn commit(
        &mut self,
        doc: &mut Document,
        kernel: &dyn GeometryKernel,
    ) -> Result<RequestResult> {
        match self.state {
            RequestState::Created | RequestState::Previewing => {}
            RequestState::Aborted => {
                return Err(AtelierError::RequestAborted {
                    request_id: self.id.clone(),
                })
            }
            _ => {
                return Err(AtelierError::AlreadyCommitted {
                    request_id: self.id.clone(),
                })
            }
        }

        let mut last = RequestResult::None;
        for i in 0..self.subs.len() {
            self.active.set(Some(i));
            match self.subs[i].commit(doc, kernel).await {
                Ok(result) => last = result,
                Err(e) => {
                    self.active.set(None);
                    self.failed_at = Some(i);
                    self.state = RequestState::Aborted;
                    tracing::debug!(
                        composite_id = %self.id,
                        failed_at = i,
                        applied = i,
                        "composite commit stopped"
                    );
                    return Err(e);
                }
            }
        }
        self.active.set(None);
        self.state = RequestState::Committed;
        self.result = last.clone();
        Ok(last)
    }

    pub fn result(&self) -> &RequestResult {
        &self.result
    }

    /// Revert previews of every sub-request and close the composite
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` once committed, `RequestAborted` if already
    /// aborted.
    pub fn abort(&mut self, doc: &mut Document) -> Result<()> {
        match self.state {
            RequestState::Created | RequestState::Previewing => {}
            RequestState::Aborted => {
                return Err(AtelierError::RequestAborted {
                    request_id: self.id.clone(),
                })
            }
            _ => {
                return Err(AtelierError::AlreadyCommitted {
                    request_id: self.id.clone(),
                })
            }
        }
        for sub in self.subs.iter_mut().rev() {
            if !sub.is_committed() && sub.state() != RequestState::Aborted {
                sub.abort(doc)?;
            }
        }
        self.state = RequestState::Aborted;
        Ok(())
    }
}

impl Reversible for CompositeRequest {
    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        undo_in_reverse(&mut self.subs, doc)?;
        self.state = RequestState::Undone;
        Ok(())
    }

    fn redo(&mut self, doc: &mut Document) -> Result<()> {
        redo_in_order(&mut self.subs, doc)?;
        self.state = RequestState::Committed;
        Ok(())
    }
}
