use async_trait::async_trait;

use super::{Mutation, RequestKind, RequestResult};
use crate::document::EditScope;
use crate::errors::Result;
use crate::model::EntityId;

/// Remove an entity from the document
#[derive(Debug)]
pub struct DeleteEntity {
    entity_id: EntityId,
}

impl DeleteEntity {
    pub fn new(entity_id: EntityId) -> Self {
        Self { entity_id }
    }
}

#[async_trait(?Send)]
impl Mutation for DeleteEntity {
    fn kind(&self) -> RequestKind {
        RequestKind::DeleteEntity
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        let removed = scope.remove(&self.entity_id)?;
        tracing::debug!(entity_id = %self.entity_id, kind = removed.kind_name(), "entity deleted");
        Ok(RequestResult::None)
    }

    fn description(&self) -> String {
        "Delete".to_string()
    }

    fn category(&self) -> &'static str {
        "edit"
    }
}
