use async_trait::async_trait;

use super::{Mutation, RequestKind, RequestResult};
use crate::document::EditScope;
use crate::errors::{AtelierError, Result};
use crate::model::{Content, EntityId, Point2};

/// Place a new content item
#[derive(Debug)]
pub struct AddContent {
    position: Point2,
    material: Option<String>,
}

impl AddContent {
    pub fn new(position: Point2, material: Option<String>) -> Self {
        Self { position, material }
    }
}

#[async_trait(?Send)]
impl Mutation for AddContent {
    fn kind(&self) -> RequestKind {
        RequestKind::AddContent
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        let mut content = Content::new(self.position);
        content.material = self.material.clone();
        let id = scope.insert(content);
        scope.kernel().dirty_geometry(&id);
        Ok(RequestResult::Entity(id))
    }

    fn description(&self) -> String {
        "Add content".to_string()
    }

    fn category(&self) -> &'static str {
        "content"
    }
}

/// Set one named parameter of a content item
#[derive(Debug)]
pub struct SetParameter {
    entity_id: EntityId,
    name: String,
    value: f64,
}

impl SetParameter {
    pub fn new(entity_id: EntityId, name: String, value: f64) -> Self {
        Self {
            entity_id,
            name,
            value,
        }
    }
}

#[async_trait(?Send)]
impl Mutation for SetParameter {
    fn kind(&self) -> RequestKind {
        RequestKind::SetParameter
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        if !self.value.is_finite() {
            return Err(AtelierError::InvalidParams {
                kind: RequestKind::SetParameter.to_string(),
                reason: format!("{} must be finite", self.name),
            });
        }
        let kernel = scope.kernel();
        scope
            .content_mut(&self.entity_id)?
            .params
            .insert(self.name.clone(), self.value);
        kernel.dirty_geometry(&self.entity_id);
        Ok(RequestResult::Entity(self.entity_id.clone()))
    }

    fn description(&self) -> String {
        format!("Set {}", self.name)
    }

    fn category(&self) -> &'static str {
        "parameter"
    }
}

/// Show or hide a content item
#[derive(Debug)]
pub struct SetContentVisibility {
    entity_id: EntityId,
    visible: bool,
}

impl SetContentVisibility {
    pub fn new(entity_id: EntityId, visible: bool) -> Self {
        Self { entity_id, visible }
    }
}

#[async_trait(?Send)]
impl Mutation for SetContentVisibility {
    fn kind(&self) -> RequestKind {
        RequestKind::SetContentVisibility
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        scope.content_mut(&self.entity_id)?.visible = self.visible;
        Ok(RequestResult::None)
    }

    fn description(&self) -> String {
        if self.visible {
            "Show content".to_string()
        } else {
            "Hide content".to_string()
        }
    }

    fn category(&self) -> &'static str {
        "display"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, StateDelta};
    use crate::geometry::PlanarKernel;
    use futures::executor::block_on;

    #[test]
    fn test_non_finite_parameter_rejected() {
        let mut doc = Document::new();
        let id = doc.insert(Content::new(Point2::default()));
        let mut journal = StateDelta::new();
        let kernel = PlanarKernel::default();
        let mut scope = EditScope::new(&mut doc, &mut journal, &kernel);

        let mut set = SetParameter::new(id, "width".into(), f64::NAN);
        let result = block_on(set.apply(&mut scope));
        assert!(matches!(result, Err(AtelierError::InvalidParams { .. })));
        assert!(journal.is_empty());
    }

    #[test]
    fn test_add_content_records_absence() {
        let mut doc = Document::new();
        let mut journal = StateDelta::new();
        let kernel = PlanarKernel::default();
        let mut scope = EditScope::new(&mut doc, &mut journal, &kernel);

        let mut add = AddContent::new(Point2::new(1.0, 2.0), Some("walnut".into()));
        let id = block_on(add.apply(&mut scope)).unwrap().entity().cloned().unwrap();

        assert_eq!(journal.get(&id), Some(&None));
        assert_eq!(doc.content(&id).unwrap().material.as_deref(), Some("walnut"));
    }
}
