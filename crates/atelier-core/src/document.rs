//! Document and edit scopes
//!
//! A [`Document`] is the set of live entities. Requests only ever see it
//! through an [`EditScope`], which records the pre-image of every entity on
//! first touch. The recorded pre-images are the request's before-state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{AtelierError, Result};
use crate::geometry::GeometryKernel;
use crate::model::{Content, Entity, EntityId, Layer, Snapshot, Wall};

/// Live entity set, ordered by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    entities: BTreeMap<EntityId, Entity>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity outside of any request (seeding, out-of-band edits)
    pub fn insert(&mut self, entity: impl Into<Entity>) -> EntityId {
        let entity = entity.into();
        let id = entity.id().clone();
        self.entities.insert(id.clone(), entity);
        id
    }

    /// Remove an entity outside of any request
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.entities.values().filter_map(Entity::as_wall)
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.entities.values().filter_map(Entity::as_layer)
    }

    pub fn contents(&self) -> impl Iterator<Item = &Content> {
        self.entities.values().filter_map(Entity::as_content)
    }

    /// # Errors
    ///
    /// Returns `EntityNotFound` or `EntityKindMismatch`.
    pub fn wall(&self, id: &EntityId) -> Result<&Wall> {
        let entity = self.lookup(id)?;
        entity.as_wall().ok_or_else(|| kind_error(entity, "wall"))
    }

    /// # Errors
    ///
    /// Returns `EntityNotFound` or `EntityKindMismatch`.
    pub fn layer(&self, id: &EntityId) -> Result<&Layer> {
        let entity = self.lookup(id)?;
        entity.as_layer().ok_or_else(|| kind_error(entity, "layer"))
    }

    /// # Errors
    ///
    /// Returns `EntityNotFound` or `EntityKindMismatch`.
    pub fn content(&self, id: &EntityId) -> Result<&Content> {
        let entity = self.lookup(id)?;
        entity
            .as_content()
            .ok_or_else(|| kind_error(entity, "content"))
    }

    fn lookup(&self, id: &EntityId) -> Result<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| AtelierError::EntityNotFound {
                entity_id: id.to_string(),
            })
    }
}

fn kind_error(entity: &Entity, expected: &str) -> AtelierError {
    AtelierError::EntityKindMismatch {
        entity_id: entity.id().to_string(),
        expected: expected.to_string(),
        actual: entity.kind_name().to_string(),
    }
}

/// Per-entity captured states; `None` means "did not exist"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    states: BTreeMap<EntityId, Option<Entity>>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state` for `id` unless a state is already recorded
    pub fn record(&mut self, id: &EntityId, state: Option<Entity>) {
        self.states.entry(id.clone()).or_insert(state);
    }

    /// Capture the current state of every id this delta covers
    pub fn capture_current(&self, doc: &Document) -> StateDelta {
        let states = self
            .states
            .keys()
            .map(|id| (id.clone(), doc.get(id).map(Snapshot::capture_state)))
            .collect();
        StateDelta { states }
    }

    /// First id that must exist in `doc` for this delta to be restorable
    /// in place, but does not
    ///
    /// An id whose recorded state is `Some` was alive when the delta was
    /// captured; the counterpart delta was captured against that same
    /// entity, so its absence means something outside history removed it.
    pub fn first_missing(&self, doc: &Document) -> Option<&EntityId> {
        self.states
            .iter()
            .find(|(id, state)| state.is_some() && !doc.contains(id))
            .map(|(id, _)| id)
    }

    /// Write every recorded state back into `doc`
    pub fn restore_into(&self, doc: &mut Document) {
        for (id, state) in &self.states {
            match state {
                Some(state) => match doc.entities.get_mut(id) {
                    Some(entity) => entity.restore_state(state.clone()),
                    None => {
                        doc.entities.insert(id.clone(), state.clone());
                    }
                },
                None => {
                    doc.entities.remove(id);
                }
            }
        }
    }

    pub fn get(&self, id: &EntityId) -> Option<&Option<Entity>> {
        self.states.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.states.keys()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Journaled mutable view of a document
pub struct EditScope<'a> {
    doc: &'a mut Document,
    journal: &'a mut StateDelta,
    kernel: &'a dyn GeometryKernel,
}

impl<'a> EditScope<'a> {
    pub fn new(
        doc: &'a mut Document,
        journal: &'a mut StateDelta,
        kernel: &'a dyn GeometryKernel,
    ) -> Self {
        Self {
            doc,
            journal,
            kernel,
        }
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    pub fn kernel(&self) -> &'a dyn GeometryKernel {
        self.kernel
    }

    /// # Errors
    ///
    /// Returns `EntityNotFound` if `id` is not in the document.
    pub fn get(&self, id: &EntityId) -> Result<&Entity> {
        self.doc.lookup(id)
    }

    /// Mutable access; records the pre-image on first touch
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if `id` is not in the document.
    pub fn get_mut(&mut self, id: &EntityId) -> Result<&mut Entity> {
        let entity = self
            .doc
            .entities
            .get_mut(id)
            .ok_or_else(|| AtelierError::EntityNotFound {
                entity_id: id.to_string(),
            })?;
        if self.journal.get(id).is_none() {
            self.journal.record(id, Some(entity.capture_state()));
        }
        Ok(entity)
    }

    /// # Errors
    ///
    /// Returns `EntityNotFound` or `EntityKindMismatch`.
    pub fn wall_mut(&mut self, id: &EntityId) -> Result<&mut Wall> {
        self.get_mut(id)?.as_wall_mut()
    }

    /// # Errors
    ///
    /// Returns `EntityNotFound` or `EntityKindMismatch`.
    pub fn layer_mut(&mut self, id: &EntityId) -> Result<&mut Layer> {
        self.get_mut(id)?.as_layer_mut()
    }

    /// # Errors
    ///
    /// Returns `EntityNotFound` or `EntityKindMismatch`.
    pub fn content_mut(&mut self, id: &EntityId) -> Result<&mut Content> {
        self.get_mut(id)?.as_content_mut()
    }

    pub fn insert(&mut self, entity: impl Into<Entity>) -> EntityId {
        let entity = entity.into();
        let id = entity.id().clone();
        let previous = self.doc.get(&id).map(Snapshot::capture_state);
        self.journal.record(&id, previous);
        self.doc.entities.insert(id.clone(), entity);
        id
    }

    /// # Errors
    ///
    /// Returns `EntityNotFound` if `id` is not in the document.
    pub fn remove(&mut self, id: &EntityId) -> Result<Entity> {
        let entity = self
            .doc
            .entities
            .remove(id)
            .ok_or_else(|| AtelierError::EntityNotFound {
                entity_id: id.to_string(),
            })?;
        self.journal.record(id, Some(entity.capture_state()));
        Ok(entity)
    }
}
