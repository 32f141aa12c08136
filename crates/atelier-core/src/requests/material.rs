use async_trait::async_trait;

use super::{Mutation, RequestKind, RequestResult};
use crate::document::EditScope;
use crate::errors::Result;
use crate::model::EntityId;

/// Paint one material onto several entities
#[derive(Debug)]
pub struct ApplyMaterial {
    targets: Vec<EntityId>,
    material: String,
}

impl ApplyMaterial {
    pub fn new(targets: Vec<EntityId>, material: String) -> Self {
        Self { targets, material }
    }
}

#[async_trait(?Send)]
impl Mutation for ApplyMaterial {
    fn kind(&self) -> RequestKind {
        RequestKind::ApplyMaterial
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        // all targets must exist before any is painted
        for id in &self.targets {
            scope.get(id)?;
        }
        let kernel = scope.kernel();
        for id in &self.targets {
            scope.get_mut(id)?.set_material(Some(self.material.clone()));
            kernel.dirty_geometry(id);
        }
        Ok(RequestResult::Entities(self.targets.clone()))
    }

    fn description(&self) -> String {
        format!("Apply material {}", self.material)
    }

    fn category(&self) -> &'static str {
        "material"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, StateDelta};
    use crate::errors::AtelierError;
    use crate::geometry::PlanarKernel;
    use crate::model::{Content, Point2};
    use futures::executor::block_on;

    #[test]
    fn test_missing_target_writes_nothing() {
        let mut doc = Document::new();
        let a = doc.insert(Content::new(Point2::default()).with_id("a"));
        let mut journal = StateDelta::new();
        let kernel = PlanarKernel::default();
        let mut scope = EditScope::new(&mut doc, &mut journal, &kernel);

        let mut paint = ApplyMaterial::new(vec![a.clone(), EntityId::from("ghost")], "oak".into());
        let result = block_on(paint.apply(&mut scope));

        assert!(matches!(result, Err(AtelierError::EntityNotFound { .. })));
        assert!(journal.is_empty());
        assert_eq!(doc.content(&a).unwrap().material, None);
    }
}
