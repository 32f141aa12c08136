//! Request lifecycle
//!
//! A [`Request`] wraps one [`Mutation`] with the bookkeeping that makes it
//! reversible: the before-state journal filled while the mutation runs, the
//! after-state captured once it succeeds, and the commit/undo/redo state
//! machine.
//!
//! ```text
//! Created --receive--> Previewing --commit--> Committed <--undo/redo--> Undone
//!    |                     |
//!    +------abort----------+--> Aborted
//! ```

use atelier_core::{
    AtelierError, Document, EditScope, GeometryKernel, Mutation, RequestKind, RequestParams,
    RequestResult, Result, StateDelta,
};
use atelier_core_types::RequestId;
use serde_json::Value;

use crate::reversible::Reversible;

/// Lifecycle state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Created,
    /// Field transaction with in-place previews applied
    Previewing,
    Committed,
    Undone,
    /// Aborted by the caller or by a failed commit
    Aborted,
}

/// Atomic, reversible mutation of one or more entities
#[derive(Debug)]
pub struct Request {
    id: RequestId,
    params: RequestParams,
    mutation: Box<dyn Mutation>,
    state: RequestState,
    before: StateDelta,
    after: StateDelta,
    result: RequestResult,
}

impl Request {
    pub fn new(params: RequestParams, mutation: Box<dyn Mutation>) -> Self {
        Self {
            id: RequestId::new(),
            params,
            mutation,
            state: RequestState::Created,
            before: StateDelta::new(),
            after: StateDelta::new(),
            result: RequestResult::None,
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn kind(&self) -> RequestKind {
        self.mutation.kind()
    }

    /// Input captured at creation
    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// True once commit has succeeded, whether or not it was undone since
    pub fn is_committed(&self) -> bool {
        matches!(self.state, RequestState::Committed | RequestState::Undone)
    }

    pub fn can_transact_field(&self) -> bool {
        self.mutation.can_transact_field()
    }

    pub fn description(&self) -> String {
        self.mutation.description()
    }

    pub fn category(&self) -> &'static str {
        self.mutation.category()
    }

    pub fn before_state(&self) -> &StateDelta {
        &self.before
    }

    pub fn after_state(&self) -> &StateDelta {
        &self.after
    }

    /// Result of the successful commit, `None` before it
    pub fn result(&self) -> &RequestResult {
        &self.result
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            RequestState::Created | RequestState::Previewing => Ok(()),
            RequestState::Committed | RequestState::Undone => Err(AtelierError::AlreadyCommitted {
                request_id: self.id.clone(),
            }),
            RequestState::Aborted => Err(AtelierError::RequestAborted {
                request_id: self.id.clone(),
            }),
        }
    }

    /// Route an interactive preview to a field-transaction request
    ///
    /// Returns `Ok(false)` without touching the document when the request
    /// does not support field transactions or ignores `action`.
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` / `RequestAborted` once the request is closed, or
    /// whatever the mutation reports for a malformed payload.
    pub fn receive(
        &mut self,
        doc: &mut Document,
        kernel: &dyn GeometryKernel,
        action: &str,
        data: &Value,
    ) -> Result<bool> {
        self.ensure_open()?;
        if !self.mutation.can_transact_field() {
            return Ok(false);
        }
        let mut scope = EditScope::new(doc, &mut self.before, kernel);
        let consumed = self.mutation.receive(&mut scope, action, data)?;
        if consumed {
            self.state = RequestState::Previewing;
        }
        Ok(consumed)
    }

    /// Run the mutation once and capture the after-state
    ///
    /// On failure every write made through the scope (previews included) is
    /// reverted and the request becomes `Aborted`.
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` on a second call, `RequestAborted` after abort,
    /// otherwise the mutation's own error (typically `CommitFailed`).
    pub async fn commit(
        &mut self,
        doc: &mut Document,
        kernel: &dyn GeometryKernel,
    ) -> Result<RequestResult> {
        self.ensure_open()?;
        let outcome = {
            let mut scope = EditScope::new(doc, &mut self.before, kernel);
            self.mutation.apply(&mut scope).await
        };

        match outcome {
            Ok(result) => {
                self.after = self.before.capture_current(doc);
                self.state = RequestState::Committed;
                self.result = result.clone();
                tracing::debug!(
                    request_id = %self.id,
                    kind = %self.kind(),
                    touched = self.after.len(),
                    "request committed"
                );
                Ok(result)
            }
            Err(e) => {
                self.rollback(doc);
                Err(e)
            }
        }
    }

    /// Revert previews of an uncommitted request
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` if the request was committed; aborted requests
    /// report `RequestAborted`.
    pub fn abort(&mut self, doc: &mut Document) -> Result<()> {
        self.ensure_open()?;
        self.rollback(doc);
        Ok(())
    }

    fn rollback(&mut self, doc: &mut Document) {
        self.before.restore_into(doc);
        self.before = StateDelta::new();
        self.state = RequestState::Aborted;
    }

    fn missing_target(&self, delta: &StateDelta, doc: &Document) -> Result<()> {
        match delta.first_missing(doc) {
            Some(id) => Err(AtelierError::UndoTargetMissing {
                entity_id: id.to_string(),
                description: self.description(),
            }),
            None => Ok(()),
        }
    }
}

impl Reversible for Request {
    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        self.missing_target(&self.after, doc)?;
        self.before.restore_into(doc);
        self.state = RequestState::Undone;
        Ok(())
    }

    fn redo(&mut self, doc: &mut Document) -> Result<()> {
        self.missing_target(&self.before, doc)?;
        self.after.restore_into(doc);
        self.state = RequestState::Committed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{build_mutation, Content, EntityId, PlanarKernel, Point2};
    use futures::executor::block_on;

    fn set_param(id: &EntityId, value: f64) -> Request {
        let params = RequestParams::SetParameter {
            entity_id: id.clone(),
            name: "width".to_string(),
            value,
        };
        Request::new(params.clone(), build_mutation(params))
    }

    #[test]
    fn test_commit_twice_is_already_committed() {
        let mut doc = Document::new();
        let id = doc.insert(Content::new(Point2::default()));
        let kernel = PlanarKernel::default();

        let mut request = set_param(&id, 600.0);
        block_on(request.commit(&mut doc, &kernel)).unwrap();
        let second = block_on(request.commit(&mut doc, &kernel));

        assert!(matches!(second, Err(AtelierError::AlreadyCommitted { .. })));
    }

    #[test]
    fn test_failed_commit_leaves_no_mutation() {
        let mut doc = Document::new();
        let kernel = PlanarKernel::default();
        let before = doc.clone();

        let mut request = set_param(&EntityId::from("ghost"), 1.0);
        let result = block_on(request.commit(&mut doc, &kernel));

        assert!(matches!(result, Err(AtelierError::EntityNotFound { .. })));
        assert_eq!(doc, before);
        assert_eq!(request.state(), RequestState::Aborted);
    }

    #[test]
    fn test_undo_redo_states() {
        let mut doc = Document::new();
        let id = doc.insert(Content::new(Point2::default()));
        let kernel = PlanarKernel::default();

        let mut request = set_param(&id, 600.0);
        block_on(request.commit(&mut doc, &kernel)).unwrap();
        request.undo(&mut doc).unwrap();
        assert_eq!(request.state(), RequestState::Undone);
        assert!(doc.content(&id).unwrap().params.is_empty());

        request.redo(&mut doc).unwrap();
        assert_eq!(request.state(), RequestState::Committed);
        assert_eq!(doc.content(&id).unwrap().params["width"], 600.0);
    }

    #[test]
    fn test_receive_ignored_without_field_transactions() {
        let mut doc = Document::new();
        let id = doc.insert(Content::new(Point2::default()));
        let kernel = PlanarKernel::default();

        let mut request = set_param(&id, 600.0);
        let consumed = request
            .receive(&mut doc, &kernel, "move", &serde_json::json!({}))
            .unwrap();
        assert!(!consumed);
        assert_eq!(request.state(), RequestState::Created);
    }
}
