use serde::{Deserialize, Serialize};

use super::ids::{EntityId, Point2};
use super::snapshot::Snapshot;

/// Straight wall segment on a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub id: EntityId,
    pub from: Point2,
    pub to: Point2,
    /// Thickness in mm
    pub width: f64,
    /// Height in mm
    pub height: f64,
    pub material: Option<String>,
    pub layer_id: Option<EntityId>,
}

impl Wall {
    pub fn new(from: Point2, to: Point2) -> Self {
        Self {
            id: EntityId::new(),
            from,
            to,
            width: 120.0,
            height: 2800.0,
            material: None,
            layer_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_layer(mut self, layer_id: EntityId) -> Self {
        self.layer_id = Some(layer_id);
        self
    }

    pub fn length(&self) -> f64 {
        self.from.distance(&self.to)
    }
}

impl Snapshot for Wall {
    type State = Wall;

    fn capture_state(&self) -> Wall {
        self.clone()
    }

    fn restore_state(&mut self, state: Wall) {
        *self = state;
    }
}
