use serde::{Deserialize, Serialize};

use super::content::Content;
use super::ids::EntityId;
use super::layer::Layer;
use super::snapshot::Snapshot;
use super::wall::Wall;
use crate::errors::{AtelierError, Result};

/// Any entity the document can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Wall(Wall),
    Content(Content),
    Layer(Layer),
}

impl Entity {
    pub fn id(&self) -> &EntityId {
        match self {
            Entity::Wall(w) => &w.id,
            Entity::Content(c) => &c.id,
            Entity::Layer(l) => &l.id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Entity::Wall(_) => "wall",
            Entity::Content(_) => "content",
            Entity::Layer(_) => "layer",
        }
    }

    pub fn material(&self) -> Option<&str> {
        match self {
            Entity::Wall(w) => w.material.as_deref(),
            Entity::Content(c) => c.material.as_deref(),
            Entity::Layer(l) => l.material.as_deref(),
        }
    }

    pub fn set_material(&mut self, material: Option<String>) {
        match self {
            Entity::Wall(w) => w.material = material,
            Entity::Content(c) => c.material = material,
            Entity::Layer(l) => l.material = material,
        }
    }

    /// # Errors
    ///
    /// Returns `EntityKindMismatch` if this is not a wall.
    pub fn as_wall_mut(&mut self) -> Result<&mut Wall> {
        match self {
            Entity::Wall(w) => Ok(w),
            other => Err(mismatch(other, "wall")),
        }
    }

    /// # Errors
    ///
    /// Returns `EntityKindMismatch` if this is not a content item.
    pub fn as_content_mut(&mut self) -> Result<&mut Content> {
        match self {
            Entity::Content(c) => Ok(c),
            other => Err(mismatch(other, "content")),
        }
    }

    /// # Errors
    ///
    /// Returns `EntityKindMismatch` if this is not a layer.
    pub fn as_layer_mut(&mut self) -> Result<&mut Layer> {
        match self {
            Entity::Layer(l) => Ok(l),
            other => Err(mismatch(other, "layer")),
        }
    }

    pub fn as_wall(&self) -> Option<&Wall> {
        match self {
            Entity::Wall(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&Content> {
        match self {
            Entity::Content(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_layer(&self) -> Option<&Layer> {
        match self {
            Entity::Layer(l) => Some(l),
            _ => None,
        }
    }
}

fn mismatch(entity: &Entity, expected: &str) -> AtelierError {
    AtelierError::EntityKindMismatch {
        entity_id: entity.id().to_string(),
        expected: expected.to_string(),
        actual: entity.kind_name().to_string(),
    }
}

impl Snapshot for Entity {
    type State = Entity;

    fn capture_state(&self) -> Entity {
        match self {
            Entity::Wall(w) => Entity::Wall(w.capture_state()),
            Entity::Content(c) => Entity::Content(c.capture_state()),
            Entity::Layer(l) => Entity::Layer(l.capture_state()),
        }
    }

    fn restore_state(&mut self, state: Entity) {
        match (self, state) {
            (Entity::Wall(w), Entity::Wall(s)) => w.restore_state(s),
            (Entity::Content(c), Entity::Content(s)) => c.restore_state(s),
            (Entity::Layer(l), Entity::Layer(s)) => l.restore_state(s),
            (slot, state) => *slot = state,
        }
    }
}

impl From<Wall> for Entity {
    fn from(w: Wall) -> Self {
        Entity::Wall(w)
    }
}

impl From<Content> for Entity {
    fn from(c: Content) -> Self {
        Entity::Content(c)
    }
}

impl From<Layer> for Entity {
    fn from(l: Layer) -> Self {
        Entity::Layer(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point2;

    #[test]
    fn test_restore_replaces_every_field() {
        let mut entity: Entity = Wall::new(Point2::new(0.0, 0.0), Point2::new(1000.0, 0.0)).into();
        let saved = entity.capture_state();

        let wall = entity.as_wall_mut().unwrap();
        wall.to = Point2::new(500.0, 0.0);
        wall.material = Some("oak".to_string());
        wall.height = 3000.0;

        entity.restore_state(saved.clone());
        assert_eq!(entity, saved);
    }

    #[test]
    fn test_kind_mismatch_error() {
        let mut entity: Entity = Content::new(Point2::default()).into();
        let result = entity.as_wall_mut();
        assert!(matches!(
            result,
            Err(AtelierError::EntityKindMismatch { .. })
        ));
    }

    #[test]
    fn test_tagged_serialization() {
        let entity: Entity = Layer::new("Ground").with_id("l1").into();
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "layer");
        assert_eq!(json["id"], "l1");
    }
}
