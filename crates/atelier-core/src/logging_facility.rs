//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! ## Logging Ownership
//!
//! Public engine operations (commit, undo, redo, sessions, commands) own the
//! start/end lifecycle events. Mutations, the document and the history stack
//! log with `tracing::debug!` only.
//!
//! ```rust
//! use atelier_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
