//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across the core, engine and CLI.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_SESSION_ID: &str = "session_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Transaction fields
pub const FIELD_REQUEST_KIND: &str = "request_kind";
pub const FIELD_ENTITY_ID: &str = "entity_id";
pub const FIELD_HISTORY_LEN: &str = "history_len";
pub const FIELD_CURSOR: &str = "cursor";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
