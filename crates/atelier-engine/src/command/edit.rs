//! Single-request commands

use atelier_core::{AtelierError, EntityId, Point2, RequestParams, RequestResult, Result};
use serde_json::Value;

use super::{Command, CommandContext, CommandFlow};
use crate::request::Request;

fn abort_pending(ctx: &CommandContext, pending: &mut Option<Request>) -> Result<()> {
    match pending.take() {
        Some(mut request) if !request.is_committed() => ctx.manager.abort(&mut request),
        _ => Ok(()),
    }
}

/// Split a wall at a clicked point
#[derive(Debug)]
pub struct CutWallCommand {
    wall_id: EntityId,
    position: Point2,
    request: Option<Request>,
}

impl CutWallCommand {
    pub fn new(wall_id: EntityId, position: Point2) -> Self {
        Self {
            wall_id,
            position,
            request: None,
        }
    }
}

impl Command for CutWallCommand {
    fn on_execute(&mut self, ctx: &CommandContext, _event: Option<&Value>) -> Result<CommandFlow> {
        self.request = Some(ctx.manager.create_request(RequestParams::CutWall {
            wall_id: self.wall_id.clone(),
            position: self.position,
        })?);
        Ok(CommandFlow::Complete)
    }

    fn on_complete(&mut self, ctx: &CommandContext) -> Result<RequestResult> {
        let request = self.request.take().ok_or(AtelierError::NoActiveCommand)?;
        ctx.manager.commit(request)
    }

    fn on_cancel(&mut self, ctx: &CommandContext) -> Result<()> {
        abort_pending(ctx, &mut self.request)
    }

    fn description(&self) -> String {
        "Cut wall".to_string()
    }

    fn category(&self) -> &'static str {
        "wall"
    }
}

/// Drag a slab outline vertex
///
/// Forwards pointer events to a field-transaction request; only the final
/// position reaches history.
#[derive(Debug)]
pub struct MoveSlabVertexCommand {
    layer_id: EntityId,
    vertex_index: usize,
    request: Option<Request>,
}

impl MoveSlabVertexCommand {
    pub fn new(layer_id: EntityId, vertex_index: usize) -> Self {
        Self {
            layer_id,
            vertex_index,
            request: None,
        }
    }
}

impl Command for MoveSlabVertexCommand {
    fn on_execute(&mut self, ctx: &CommandContext, _event: Option<&Value>) -> Result<CommandFlow> {
        self.request = Some(ctx.manager.create_request(
            RequestParams::MoveSlabProfileVertex {
                layer_id: self.layer_id.clone(),
                vertex_index: self.vertex_index,
                offset: None,
            },
        )?);
        Ok(CommandFlow::Continue)
    }

    fn on_receive(&mut self, ctx: &CommandContext, event: &str, data: &Value) -> Result<bool> {
        match self.request.as_mut() {
            Some(request) => ctx.manager.receive(request, event, data),
            None => Ok(false),
        }
    }

    fn on_complete(&mut self, ctx: &CommandContext) -> Result<RequestResult> {
        let request = self.request.take().ok_or(AtelierError::NoActiveCommand)?;
        ctx.manager.commit(request)
    }

    fn on_cancel(&mut self, ctx: &CommandContext) -> Result<()> {
        abort_pending(ctx, &mut self.request)
    }

    fn on_cleanup(&mut self, ctx: &CommandContext) {
        if let Err(e) = abort_pending(ctx, &mut self.request) {
            tracing::debug!(error = %e, "leftover slab preview not reverted");
        }
    }

    fn description(&self) -> String {
        "Move slab vertex".to_string()
    }

    fn category(&self) -> &'static str {
        "slab"
    }
}
