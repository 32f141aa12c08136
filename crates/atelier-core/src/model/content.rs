use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{EntityId, Point2};
use super::snapshot::Snapshot;

/// Placed content item (furniture, fixture, parametric model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: EntityId,
    pub position: Point2,
    pub visible: bool,
    pub material: Option<String>,
    /// Named parametric inputs (dimensions, offsets)
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl Content {
    pub fn new(position: Point2) -> Self {
        Self {
            id: EntityId::new(),
            position,
            visible: true,
            material: None,
            params: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }
}

impl Snapshot for Content {
    type State = Content;

    fn capture_state(&self) -> Content {
        self.clone()
    }

    fn restore_state(&mut self, state: Content) {
        *self = state;
    }
}
