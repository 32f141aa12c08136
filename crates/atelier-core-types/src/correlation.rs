//! Correlation identifiers
//!
//! Every request, session and trace gets a time-ordered UUIDv7 string id so
//! log lines and history entries can be joined after the fact.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh id (UUIDv7, so ids sort by creation time)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wrap an existing string (for deserialization and replay)
            pub fn from_string(s: String) -> Self {
                Self(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// Identifies one Request for its whole lifetime (creation, commit, undo, redo)
    RequestId
);

correlation_id!(
    /// Identifies one recording Session on a transaction manager
    SessionId
);

correlation_id!(
    /// Groups every operation triggered by one user gesture
    TraceId
);

/// Context carried through engine boundaries for correlation
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub trace_id: TraceId,
    pub session_id: Option<SessionId>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_ids_sort_by_creation() {
        let first = SessionId::new();
        let second = SessionId::new();
        assert!(first < second);
    }

    #[test]
    fn test_display_matches_as_str() {
        let id = TraceId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_context_with_session() {
        let session_id = SessionId::new();
        let ctx = RequestContext::new().with_session(session_id.clone());
        assert_eq!(ctx.session_id, Some(session_id));
    }

    #[test]
    fn test_serialization() {
        let id = RequestId::from_string("req-1".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"req-1\"");
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
