use atelier_core_types::{RequestId, SessionId};
use thiserror::Error;

/// Result type alias using AtelierError
pub type Result<T> = std::result::Result<T, AtelierError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Stable classification of every failure the edit engine can report. Each
/// kind maps to a stable code used by tests, the CLI and telemetry sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Request construction
    UnknownRequestType,
    InvalidInput,
    InvalidAction,

    // Request lifecycle
    AlreadyCommitted,
    RequestAborted,
    CommitFailed,

    // Sessions and history
    SessionAlreadyOpen,
    SessionNotOpen,
    UndoTargetMissing,
    UndoRedoBlocked,
    TransactionInProgress,

    // Model
    NotFound,
    KindMismatch,

    // Commands
    NoActiveCommand,

    // Infrastructure
    Config,
    Io,
    Serialization,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::UnknownRequestType => "ERR_UNKNOWN_REQUEST_TYPE",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidAction => "ERR_INVALID_ACTION",
            ExErrorKind::AlreadyCommitted => "ERR_ALREADY_COMMITTED",
            ExErrorKind::RequestAborted => "ERR_REQUEST_ABORTED",
            ExErrorKind::CommitFailed => "ERR_COMMIT_FAILED",
            ExErrorKind::SessionAlreadyOpen => "ERR_SESSION_ALREADY_OPEN",
            ExErrorKind::SessionNotOpen => "ERR_SESSION_NOT_OPEN",
            ExErrorKind::UndoTargetMissing => "ERR_UNDO_TARGET_MISSING",
            ExErrorKind::UndoRedoBlocked => "ERR_UNDO_REDO_BLOCKED",
            ExErrorKind::TransactionInProgress => "ERR_TRANSACTION_IN_PROGRESS",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::KindMismatch => "ERR_KIND_MISMATCH",
            ExErrorKind::NoActiveCommand => "ERR_NO_ACTIVE_COMMAND",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Flat, cloneable view of an [`AtelierError`] with classification fields for
/// programmatic handling and log emission.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for the edit engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AtelierError {
    // ===== Request construction =====
    /// No factory registered for the requested kind
    #[error("Unknown request type: {kind}")]
    UnknownRequestType { kind: String },

    /// Parameters could not be decoded or are out of range
    #[error("Invalid parameters for {kind}: {reason}")]
    InvalidParams { kind: String, reason: String },

    /// Interactive payload for a field transaction was malformed
    #[error("Invalid '{action}' payload: {reason}")]
    InvalidAction { action: String, reason: String },

    // ===== Request lifecycle =====
    /// Commit was invoked on a request that already ran its commit
    #[error("Request {request_id} was already committed")]
    AlreadyCommitted { request_id: RequestId },

    /// Request was aborted and can no longer be committed
    #[error("Request {request_id} was aborted")]
    RequestAborted { request_id: RequestId },

    /// Domain-level failure reported by a mutation (e.g. geometry produced no result)
    #[error("Commit of {kind} failed: {reason}")]
    CommitFailed { kind: String, reason: String },

    // ===== Sessions and history =====
    /// A session is already recording on this manager
    #[error("Session {session_id} is already open")]
    SessionAlreadyOpen { session_id: SessionId },

    /// The session was already committed or aborted
    #[error("Session {session_id} is not open")]
    SessionNotOpen { session_id: SessionId },

    /// Undo or redo needs an entity that no longer exists
    #[error("Cannot undo/redo '{description}': entity {entity_id} no longer exists")]
    UndoTargetMissing {
        entity_id: String,
        description: String,
    },

    /// Undo/redo is blocked by an active command
    #[error("Undo/redo is blocked")]
    UndoRedoBlocked,

    /// Another commit is suspended mid-flight
    #[error("Transaction in progress; cannot {op}")]
    TransactionInProgress { op: String },

    // ===== Model =====
    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    #[error("Entity {entity_id} is a {actual}, expected {expected}")]
    EntityKindMismatch {
        entity_id: String,
        expected: String,
        actual: String,
    },

    // ===== Commands =====
    #[error("No active command")]
    NoActiveCommand,

    // ===== Infrastructure =====
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl AtelierError {
    /// Whether the issuing command should recover locally (cancel instead of complete)
    ///
    /// Engine-invariant violations are caller bugs and return false.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AtelierError::AlreadyCommitted { .. }
                | AtelierError::RequestAborted { .. }
                | AtelierError::SessionAlreadyOpen { .. }
                | AtelierError::SessionNotOpen { .. }
                | AtelierError::TransactionInProgress { .. }
        )
    }
}

impl From<AtelierError> for ExError {
    fn from(err: AtelierError) -> Self {
        match err {
            AtelierError::UnknownRequestType { kind } => {
                ExError::new(ExErrorKind::UnknownRequestType)
                    .with_op("create_request")
                    .with_message(format!("No factory registered for '{}'", kind))
            }

            AtelierError::InvalidParams { kind, reason } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("create_request")
                .with_message(format!("{}: {}", kind, reason)),

            AtelierError::InvalidAction { action, reason } => {
                ExError::new(ExErrorKind::InvalidAction)
                    .with_op("receive")
                    .with_message(format!("{}: {}", action, reason))
            }

            AtelierError::AlreadyCommitted { request_id } => {
                ExError::new(ExErrorKind::AlreadyCommitted)
                    .with_op("commit")
                    .with_request_id(request_id)
                    .with_message("Request was already committed")
            }

            AtelierError::RequestAborted { request_id } => {
                ExError::new(ExErrorKind::RequestAborted)
                    .with_op("commit")
                    .with_request_id(request_id)
                    .with_message("Request was aborted")
            }

            AtelierError::CommitFailed { kind, reason } => ExError::new(ExErrorKind::CommitFailed)
                .with_op("commit")
                .with_message(format!("{}: {}", kind, reason)),

            AtelierError::SessionAlreadyOpen { session_id } => {
                ExError::new(ExErrorKind::SessionAlreadyOpen)
                    .with_op("start_session")
                    .with_message(format!("Session {} is still open", session_id))
            }

            AtelierError::SessionNotOpen { session_id } => {
                ExError::new(ExErrorKind::SessionNotOpen)
                    .with_op("end_session")
                    .with_message(format!("Session {} is not open", session_id))
            }

            AtelierError::UndoTargetMissing {
                entity_id,
                description,
            } => ExError::new(ExErrorKind::UndoTargetMissing)
                .with_entity_id(entity_id)
                .with_message(format!("Cannot undo/redo '{}'", description)),

            AtelierError::UndoRedoBlocked => ExError::new(ExErrorKind::UndoRedoBlocked)
                .with_message("Undo/redo is blocked by the active command"),

            AtelierError::TransactionInProgress { op } => {
                ExError::new(ExErrorKind::TransactionInProgress)
                    .with_op(op)
                    .with_message("Another commit is suspended")
            }

            AtelierError::EntityNotFound { entity_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(entity_id)
                .with_message("Entity not found"),

            AtelierError::EntityKindMismatch {
                entity_id,
                expected,
                actual,
            } => ExError::new(ExErrorKind::KindMismatch)
                .with_entity_id(entity_id)
                .with_message(format!("Expected {}, found {}", expected, actual)),

            AtelierError::NoActiveCommand => {
                ExError::new(ExErrorKind::NoActiveCommand).with_message("No active command")
            }

            AtelierError::Config { message } => {
                ExError::new(ExErrorKind::Config).with_message(message)
            }

            AtelierError::Io { message } => ExError::new(ExErrorKind::Io).with_message(message),

            AtelierError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to AtelierError
impl From<serde_json::Error> for AtelierError {
    fn from(err: serde_json::Error) -> Self {
        AtelierError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AtelierError {
    fn from(err: std::io::Error) -> Self {
        AtelierError::Io {
            message: err.to_string(),
        }
    }
}
