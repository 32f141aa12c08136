use async_trait::async_trait;
use serde_json::Value;

use super::{Mutation, RequestKind, RequestResult};
use crate::document::EditScope;
use crate::errors::{AtelierError, Result};
use crate::model::{EntityId, Point2};

/// Drag one vertex of a layer's slab outline
///
/// Field transaction: every `"move"` preview repositions the vertex relative
/// to where the drag started, so previews never accumulate.
#[derive(Debug)]
pub struct MoveSlabProfileVertex {
    layer_id: EntityId,
    vertex_index: usize,
    offset: Option<Point2>,
    origin: Option<Point2>,
}

impl MoveSlabProfileVertex {
    pub fn new(layer_id: EntityId, vertex_index: usize, offset: Option<Point2>) -> Self {
        Self {
            layer_id,
            vertex_index,
            offset,
            origin: None,
        }
    }

    fn move_by(&mut self, scope: &mut EditScope<'_>, offset: Point2) -> Result<()> {
        let kernel = scope.kernel();
        let index = self.vertex_index;
        let layer = scope.layer_mut(&self.layer_id)?;
        let vertex = layer
            .slab_profile
            .get_mut(index)
            .ok_or_else(|| AtelierError::InvalidParams {
                kind: RequestKind::MoveSlabProfileVertex.to_string(),
                reason: format!("vertex index {} out of range", index),
            })?;
        let origin = *self.origin.get_or_insert(*vertex);
        *vertex = origin.offset(offset.x, offset.y);
        kernel.rebuild_slab_faces(layer);
        Ok(())
    }
}

#[async_trait(?Send)]
impl Mutation for MoveSlabProfileVertex {
    fn kind(&self) -> RequestKind {
        RequestKind::MoveSlabProfileVertex
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        scope.document().layer(&self.layer_id)?;
        if let Some(offset) = self.offset {
            self.move_by(scope, offset)?;
        }
        Ok(RequestResult::None)
    }

    fn can_transact_field(&self) -> bool {
        true
    }

    fn receive(&mut self, scope: &mut EditScope<'_>, action: &str, data: &Value) -> Result<bool> {
        if action != "move" {
            return Ok(false);
        }
        let offset: Point2 = data
            .get("offset")
            .cloned()
            .ok_or_else(|| AtelierError::InvalidAction {
                action: action.to_string(),
                reason: "missing offset".to_string(),
            })
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| AtelierError::InvalidAction {
                    action: action.to_string(),
                    reason: e.to_string(),
                })
            })?;
        self.move_by(scope, offset)?;
        Ok(true)
    }

    fn description(&self) -> String {
        "Move slab profile vertex".to_string()
    }

    fn category(&self) -> &'static str {
        "slab"
    }
}

/// Detach the underlay drawing from a layer
#[derive(Debug)]
pub struct RemoveUnderlay {
    layer_id: EntityId,
}

impl RemoveUnderlay {
    pub fn new(layer_id: EntityId) -> Self {
        Self { layer_id }
    }
}

#[async_trait(?Send)]
impl Mutation for RemoveUnderlay {
    fn kind(&self) -> RequestKind {
        RequestKind::RemoveUnderlay
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        let kernel = scope.kernel();
        if scope.document().layer(&self.layer_id)?.underlay.is_none() {
            return Ok(RequestResult::None);
        }
        scope.layer_mut(&self.layer_id)?.underlay = None;
        kernel.dirty_geometry(&self.layer_id);
        Ok(RequestResult::Entity(self.layer_id.clone()))
    }

    fn description(&self) -> String {
        "Remove underlay".to_string()
    }

    fn category(&self) -> &'static str {
        "underlay"
    }
}
