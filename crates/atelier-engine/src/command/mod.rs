//! Commands
//!
//! A command is the outermost controller of a user action: a drag tool, a
//! menu entry, a batch toggle. It decides when requests are created and
//! committed, and whether the action takes part in undo/redo at all.
//!
//! ```text
//! execute ──▶ on_execute ──┬── Complete ──▶ on_complete ──▶ on_cleanup
//!                          └── Continue ──▶ on_receive* ──▶ complete / cancel
//! ```
//!
//! Commands get their transaction manager and selection through
//! [`CommandContext`]; nothing is looked up globally.

use atelier_core::{EntityId, RequestResult, Result};
use serde_json::Value;

use crate::manager::TransactionManager;

pub mod batch;
pub mod edit;
pub mod manager;

pub use batch::{HideContentsCommand, RemoveUnderlayFromAllLayers};
pub use edit::{CutWallCommand, MoveSlabVertexCommand};
pub use manager::CommandManager;

/// Event name that cancels a command when the command does not consume it
pub const ESCAPE_EVENT: &str = "escape";

/// Everything a command may touch
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub manager: TransactionManager,
    pub selection: Vec<EntityId>,
}

impl CommandContext {
    pub fn new(manager: TransactionManager) -> Self {
        Self {
            manager,
            selection: Vec::new(),
        }
    }

    pub fn with_selection(mut self, selection: Vec<EntityId>) -> Self {
        self.selection = selection;
        self
    }
}

/// What `on_execute` asks of the command manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFlow {
    /// Stay active and wait for events
    Continue,
    /// Complete immediately
    Complete,
}

/// User-action controller
///
/// `on_cancel` must leave the model as it was before `on_execute`, whatever
/// point the command reached.
pub trait Command {
    /// # Errors
    ///
    /// Any error aborts the command; the manager runs `on_cancel` and
    /// `on_cleanup` before returning it.
    fn on_execute(&mut self, ctx: &CommandContext, event: Option<&Value>) -> Result<CommandFlow>;

    /// Route an interactive event; returns whether it was consumed
    ///
    /// # Errors
    ///
    /// Errors from the live request's preview.
    fn on_receive(&mut self, _ctx: &CommandContext, _event: &str, _data: &Value) -> Result<bool> {
        Ok(false)
    }

    /// Commit whatever the command has built
    ///
    /// # Errors
    ///
    /// A recoverable error (for example a failed geometry split) makes the
    /// manager call `on_cancel` instead of treating the command as done.
    fn on_complete(&mut self, ctx: &CommandContext) -> Result<RequestResult>;

    /// Abort any open session or uncommitted request
    ///
    /// # Errors
    ///
    /// Rollback failures.
    fn on_cancel(&mut self, ctx: &CommandContext) -> Result<()>;

    /// Runs last, after either completion or cancellation
    fn on_cleanup(&mut self, _ctx: &CommandContext) {}

    /// False for actions the user should not be able to step through
    fn can_undo_redo(&self) -> bool {
        true
    }

    fn description(&self) -> String;

    fn category(&self) -> &'static str;
}
