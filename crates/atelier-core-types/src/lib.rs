//! Core types shared across the atelier edit engine
//!
//! - **Correlation types**: RequestId, SessionId, TraceId, RequestContext
//! - **Schema constants**: Canonical field keys and event names for structured logs

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, SessionId, TraceId};
