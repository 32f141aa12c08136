//! Transaction events
//!
//! Listeners observe the manager without coupling to it: the undo-history
//! panel, telemetry, and the command layer all subscribe here. Events are
//! delivered after the manager has released its internal state, so a
//! listener may call back into the manager.

use atelier_core::RequestKind;
use atelier_core_types::{RequestId, SessionId};

/// Where a successful commit ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    History,
    Session,
    /// Unrecorded commit (held by an open session only for rollback), or history disabled
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionEvent {
    Created {
        request_id: RequestId,
        kind: RequestKind,
    },
    Committing {
        description: String,
    },
    Committed {
        description: String,
        recorded: Recorded,
    },
    CommitFailed {
        description: String,
        code: &'static str,
    },
    Aborted {
        request_id: RequestId,
    },
    Undoing {
        description: String,
    },
    Undone {
        description: String,
    },
    Redoing {
        description: String,
    },
    Redone {
        description: String,
    },
    /// A history entry could not be replayed and was dropped
    EntryDiscarded {
        description: String,
        reason: String,
    },
    SessionStarted {
        session_id: SessionId,
    },
    SessionCommitted {
        session_id: SessionId,
        units: usize,
    },
    SessionAborted {
        session_id: SessionId,
        units: usize,
    },
    UndoRedoStateChanged {
        can_undo: bool,
        can_redo: bool,
    },
}

/// Opaque id returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
