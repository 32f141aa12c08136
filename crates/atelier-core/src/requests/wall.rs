use async_trait::async_trait;

use super::{Mutation, RequestKind, RequestResult};
use crate::document::EditScope;
use crate::errors::{AtelierError, Result};
use crate::model::{EntityId, Point2};

/// Split a wall at a picked point
///
/// The original wall keeps its id and ends at the split point; the second
/// piece is a new wall from the split point to the old end.
#[derive(Debug)]
pub struct CutWall {
    wall_id: EntityId,
    position: Point2,
}

impl CutWall {
    pub fn new(wall_id: EntityId, position: Point2) -> Self {
        Self { wall_id, position }
    }
}

#[async_trait(?Send)]
impl Mutation for CutWall {
    fn kind(&self) -> RequestKind {
        RequestKind::CutWall
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        let kernel = scope.kernel();
        let wall = scope.document().wall(&self.wall_id)?.clone();
        let split = kernel
            .split_segment(wall.from, wall.to, self.position)
            .ok_or_else(|| AtelierError::CommitFailed {
                kind: RequestKind::CutWall.to_string(),
                reason: format!("position does not split wall {}", self.wall_id),
            })?;

        let mut second = wall;
        second.id = EntityId::new();
        second.from = split;

        scope.wall_mut(&self.wall_id)?.to = split;
        let new_id = scope.insert(second);

        kernel.dirty_geometry(&self.wall_id);
        kernel.dirty_geometry(&new_id);
        tracing::debug!(wall_id = %self.wall_id, new_wall_id = %new_id, "wall split");
        Ok(RequestResult::Entity(new_id))
    }

    fn description(&self) -> String {
        "Cut wall".to_string()
    }

    fn category(&self) -> &'static str {
        "wall"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, StateDelta};
    use crate::geometry::PlanarKernel;
    use crate::model::Wall;
    use futures::executor::block_on;

    #[test]
    fn test_cut_wall_splits_in_two() {
        let mut doc = Document::new();
        let wall_id = doc.insert(
            Wall::new(Point2::new(0.0, 0.0), Point2::new(4000.0, 0.0)).with_id("w1"),
        );
        let mut journal = StateDelta::new();
        let kernel = PlanarKernel::default();
        let mut scope = EditScope::new(&mut doc, &mut journal, &kernel);

        let mut cut = CutWall::new(wall_id.clone(), Point2::new(1000.0, 0.0));
        let result = block_on(cut.apply(&mut scope)).unwrap();
        let new_id = result.entity().cloned().unwrap();

        assert_eq!(doc.wall(&wall_id).unwrap().length(), 1000.0);
        assert_eq!(doc.wall(&new_id).unwrap().length(), 3000.0);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn test_cut_at_endpoint_is_commit_failure() {
        let mut doc = Document::new();
        let wall_id = doc.insert(
            Wall::new(Point2::new(0.0, 0.0), Point2::new(4000.0, 0.0)).with_id("w1"),
        );
        let mut journal = StateDelta::new();
        let kernel = PlanarKernel::default();
        let mut scope = EditScope::new(&mut doc, &mut journal, &kernel);

        let mut cut = CutWall::new(wall_id, Point2::new(0.0, 0.0));
        let result = block_on(cut.apply(&mut scope));

        assert!(matches!(result, Err(AtelierError::CommitFailed { .. })));
        assert!(journal.is_empty());
    }
}
