use serde::{Deserialize, Serialize};

use super::ids::{EntityId, Point2};
use super::snapshot::Snapshot;

/// Reference drawing traced under a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Underlay {
    pub source: String,
    pub opacity: f64,
}

/// Floor layer with its slab outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: EntityId,
    pub name: String,
    pub underlay: Option<Underlay>,
    /// Closed slab outline, counter-clockwise
    #[serde(default)]
    pub slab_profile: Vec<Point2>,
    pub material: Option<String>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            underlay: None,
            slab_profile: Vec::new(),
            material: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_slab_profile(mut self, profile: Vec<Point2>) -> Self {
        self.slab_profile = profile;
        self
    }

    pub fn with_underlay(mut self, source: impl Into<String>) -> Self {
        self.underlay = Some(Underlay {
            source: source.into(),
            opacity: 0.5,
        });
        self
    }
}

impl Snapshot for Layer {
    type State = Layer;

    fn capture_state(&self) -> Layer {
        self.clone()
    }

    fn restore_state(&mut self, state: Layer) {
        *self = state;
    }
}
