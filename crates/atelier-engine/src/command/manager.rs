//! Command dispatch
//!
//! ## Logging Ownership
//!
//! `execute`, `complete` and `cancel` are boundaries and log with the
//! `log_op_*` macros. Event routing logs at debug level only.

use std::time::Instant;

use atelier_core::{log_op_end, log_op_error, log_op_start};
use atelier_core::{AtelierError, EntityId, RequestResult, Result};
use serde_json::Value;

use super::{Command, CommandContext, CommandFlow, ESCAPE_EVENT};
use crate::manager::TransactionManager;

struct ActiveCommand {
    command: Box<dyn Command>,
    /// Whether this command holds an undo/redo block
    blocking: bool,
}

/// Runs at most one command at a time
pub struct CommandManager {
    context: CommandContext,
    active: Option<ActiveCommand>,
}

impl CommandManager {
    pub fn new(manager: TransactionManager) -> Self {
        Self {
            context: CommandContext::new(manager),
            active: None,
        }
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.context.manager
    }

    pub fn set_selection(&mut self, selection: Vec<EntityId>) {
        self.context.selection = selection;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_description(&self) -> Option<String> {
        self.active.as_ref().map(|a| a.command.description())
    }

    /// Start `command`, cancelling whichever command is active
    ///
    /// Returns the commit result when the command completes straight away.
    ///
    /// # Errors
    ///
    /// Whatever `on_execute` or an immediate `on_complete` reports; the
    /// command is cancelled and cleaned up before the error is returned.
    pub fn execute(
        &mut self,
        command: Box<dyn Command>,
        event: Option<&Value>,
    ) -> Result<Option<RequestResult>> {
        if self.active.is_some() {
            if let Err(e) = self.cancel() {
                tracing::debug!(error = %e, "previous command cancelled with error");
            }
        }

        let description = command.description();
        log_op_start!(
            "execute_command",
            description = %description,
            category = command.category()
        );
        let start = Instant::now();

        let blocking = !command.can_undo_redo();
        if blocking {
            self.context.manager.block_undo_redo();
        }
        self.active = Some(ActiveCommand { command, blocking });

        let flow = self.run_execute(event).map_err(|e| {
            log_op_error!(
                "execute_command",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "execute_command",
            duration_ms = start.elapsed().as_millis() as u64,
            flow = ?flow
        );

        match flow {
            CommandFlow::Continue => Ok(None),
            CommandFlow::Complete => self.complete().map(Some),
        }
    }

    fn run_execute(&mut self, event: Option<&Value>) -> Result<CommandFlow> {
        let Some(active) = self.active.as_mut() else {
            return Err(AtelierError::NoActiveCommand);
        };
        match active.command.on_execute(&self.context, event) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                self.abandon_active();
                Err(e)
            }
        }
    }

    /// Route an interactive event to the active command
    ///
    /// An unconsumed [`ESCAPE_EVENT`] cancels the command.
    ///
    /// # Errors
    ///
    /// `NoActiveCommand` when idle. A recoverable error from the command
    /// cancels it before being returned.
    pub fn receive(&mut self, event: &str, data: &Value) -> Result<bool> {
        let active = self
            .active
            .as_mut()
            .ok_or(AtelierError::NoActiveCommand)?;

        let consumed = match active.command.on_receive(&self.context, event, data) {
            Ok(consumed) => consumed,
            Err(e) => {
                if e.is_recoverable() {
                    self.abandon_active();
                }
                return Err(e);
            }
        };
        tracing::debug!(event, consumed, "command event routed");

        if !consumed && event == ESCAPE_EVENT {
            self.cancel()?;
        }
        Ok(consumed)
    }

    /// Finish the active command
    ///
    /// Runs `on_complete` then `on_cleanup`. If completion fails with a
    /// recoverable error the command is cancelled instead.
    ///
    /// # Errors
    ///
    /// `NoActiveCommand` when idle, otherwise the completion error.
    pub fn complete(&mut self) -> Result<RequestResult> {
        let mut active = self.active.take().ok_or(AtelierError::NoActiveCommand)?;
        let description = active.command.description();
        log_op_start!("complete_command", description = %description);
        let start = Instant::now();

        let outcome = active.command.on_complete(&self.context);
        // A non-recoverable failure means the commit never ran; the manager
        // reverts any previews of a unit it refused.
        if let Err(e) = &outcome {
            if e.is_recoverable() {
                if let Err(cancel_err) = active.command.on_cancel(&self.context) {
                    tracing::debug!(error = %cancel_err, "cancel after failed completion");
                }
            }
        }
        self.finish(active);

        let result = outcome.map_err(|e| {
            log_op_error!(
                "complete_command",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "complete_command",
            duration_ms = start.elapsed().as_millis() as u64
        );
        Ok(result)
    }

    /// Cancel the active command, leaving the model as it was
    ///
    /// # Errors
    ///
    /// `NoActiveCommand` when idle, otherwise the command's rollback error.
    pub fn cancel(&mut self) -> Result<()> {
        let mut active = self.active.take().ok_or(AtelierError::NoActiveCommand)?;
        let description = active.command.description();
        log_op_start!("cancel_command", description = %description);
        let start = Instant::now();

        let outcome = active.command.on_cancel(&self.context);
        self.finish(active);

        outcome.map_err(|e| {
            log_op_error!(
                "cancel_command",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "cancel_command",
            duration_ms = start.elapsed().as_millis() as u64
        );
        Ok(())
    }

    fn abandon_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            if let Err(e) = active.command.on_cancel(&self.context) {
                tracing::debug!(error = %e, "cancel after failed command step");
            }
            self.finish(active);
        }
    }

    fn finish(&mut self, mut active: ActiveCommand) {
        active.command.on_cleanup(&self.context);
        if active.blocking {
            self.context.manager.unblock_undo_redo();
        }
    }
}

impl Drop for CommandManager {
    fn drop(&mut self) {
        self.abandon_active();
    }
}

impl std::fmt::Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("active", &self.active_description())
            .finish()
    }
}
