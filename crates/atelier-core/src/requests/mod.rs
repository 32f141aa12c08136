//! Request kinds and their mutations
//!
//! The set of request kinds is closed: [`RequestKind`] names them and
//! [`RequestParams`] carries the typed input for each. A [`Mutation`] is the
//! domain half of a request; lifecycle (commit/undo/redo bookkeeping) lives
//! in the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::document::EditScope;
use crate::errors::{AtelierError, Result};
use crate::model::{EntityId, Point2};

pub mod content;
pub mod delete;
pub mod material;
pub mod slab;
pub mod wall;

pub use content::{AddContent, SetContentVisibility, SetParameter};
pub use delete::DeleteEntity;
pub use material::ApplyMaterial;
pub use slab::{MoveSlabProfileVertex, RemoveUnderlay};
pub use wall::CutWall;

/// Domain mutation behind a request
///
/// `apply` runs exactly once per request and may suspend (sub-document
/// loads, scene uploads). Implementations must either validate before
/// writing or leave every write in the scope, since a failed apply is rolled
/// back from the scope's journal.
#[async_trait(?Send)]
pub trait Mutation: std::fmt::Debug {
    fn kind(&self) -> RequestKind;

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult>;

    /// Whether the request accepts in-place previews before its commit
    fn can_transact_field(&self) -> bool {
        false
    }

    /// Interactive preview channel; returns whether `action` was consumed
    fn receive(&mut self, _scope: &mut EditScope<'_>, _action: &str, _data: &Value) -> Result<bool> {
        Ok(false)
    }

    fn description(&self) -> String;

    fn category(&self) -> &'static str;
}

/// Closed set of request kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestKind {
    AddContent,
    CutWall,
    MoveSlabProfileVertex,
    ApplyMaterial,
    DeleteEntity,
    SetParameter,
    SetContentVisibility,
    RemoveUnderlay,
}

impl RequestKind {
    pub const ALL: [RequestKind; 8] = [
        RequestKind::AddContent,
        RequestKind::CutWall,
        RequestKind::MoveSlabProfileVertex,
        RequestKind::ApplyMaterial,
        RequestKind::DeleteEntity,
        RequestKind::SetParameter,
        RequestKind::SetContentVisibility,
        RequestKind::RemoveUnderlay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::AddContent => "AddContent",
            RequestKind::CutWall => "CutWall",
            RequestKind::MoveSlabProfileVertex => "MoveSlabProfileVertex",
            RequestKind::ApplyMaterial => "ApplyMaterial",
            RequestKind::DeleteEntity => "DeleteEntity",
            RequestKind::SetParameter => "SetParameter",
            RequestKind::SetContentVisibility => "SetContentVisibility",
            RequestKind::RemoveUnderlay => "RemoveUnderlay",
        }
    }
}

impl FromStr for RequestKind {
    type Err = AtelierError;

    fn from_str(s: &str) -> Result<Self> {
        RequestKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AtelierError::UnknownRequestType {
                kind: s.to_string(),
            })
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed input captured when a request is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params")]
pub enum RequestParams {
    AddContent {
        position: Point2,
        #[serde(default)]
        material: Option<String>,
    },
    CutWall {
        wall_id: EntityId,
        position: Point2,
    },
    MoveSlabProfileVertex {
        layer_id: EntityId,
        vertex_index: usize,
        /// Final offset when committed without interactive previews
        #[serde(default)]
        offset: Option<Point2>,
    },
    ApplyMaterial {
        targets: Vec<EntityId>,
        material: String,
    },
    DeleteEntity {
        entity_id: EntityId,
    },
    SetParameter {
        entity_id: EntityId,
        name: String,
        value: f64,
    },
    SetContentVisibility {
        entity_id: EntityId,
        visible: bool,
    },
    RemoveUnderlay {
        layer_id: EntityId,
    },
}

impl RequestParams {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestParams::AddContent { .. } => RequestKind::AddContent,
            RequestParams::CutWall { .. } => RequestKind::CutWall,
            RequestParams::MoveSlabProfileVertex { .. } => RequestKind::MoveSlabProfileVertex,
            RequestParams::ApplyMaterial { .. } => RequestKind::ApplyMaterial,
            RequestParams::DeleteEntity { .. } => RequestKind::DeleteEntity,
            RequestParams::SetParameter { .. } => RequestKind::SetParameter,
            RequestParams::SetContentVisibility { .. } => RequestKind::SetContentVisibility,
            RequestParams::RemoveUnderlay { .. } => RequestKind::RemoveUnderlay,
        }
    }

    /// Decode untyped parameters for `kind`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` when `params` does not match the kind's shape.
    pub fn from_json(kind: RequestKind, params: Value) -> Result<Self> {
        let tagged = serde_json::json!({ "kind": kind.as_str(), "params": params });
        serde_json::from_value(tagged).map_err(|e| AtelierError::InvalidParams {
            kind: kind.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Computed result of a commit
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum RequestResult {
    #[default]
    None,
    Entity(EntityId),
    Entities(Vec<EntityId>),
}

impl RequestResult {
    pub fn entity(&self) -> Option<&EntityId> {
        match self {
            RequestResult::Entity(id) => Some(id),
            _ => None,
        }
    }
}

/// Build the stock mutation for `params`
pub fn build_mutation(params: RequestParams) -> Box<dyn Mutation> {
    match params {
        RequestParams::AddContent { position, material } => {
            Box::new(AddContent::new(position, material))
        }
        RequestParams::CutWall { wall_id, position } => Box::new(CutWall::new(wall_id, position)),
        RequestParams::MoveSlabProfileVertex {
            layer_id,
            vertex_index,
            offset,
        } => Box::new(MoveSlabProfileVertex::new(layer_id, vertex_index, offset)),
        RequestParams::ApplyMaterial { targets, material } => {
            Box::new(ApplyMaterial::new(targets, material))
        }
        RequestParams::DeleteEntity { entity_id } => Box::new(DeleteEntity::new(entity_id)),
        RequestParams::SetParameter {
            entity_id,
            name,
            value,
        } => Box::new(SetParameter::new(entity_id, name, value)),
        RequestParams::SetContentVisibility { entity_id, visible } => {
            Box::new(SetContentVisibility::new(entity_id, visible))
        }
        RequestParams::RemoveUnderlay { layer_id } => Box::new(RemoveUnderlay::new(layer_id)),
    }
}
