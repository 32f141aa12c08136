//! Geometry collaborator
//!
//! Requests call out to the kernel for splitting and rebuild side effects.
//! The engine never sequences or retries these calls; a kernel failure is
//! folded into the calling request's commit result.

use crate::model::{EntityId, Layer, Point2};

/// Black-box geometry operations consumed by requests
pub trait GeometryKernel {
    /// Project `at` onto the segment `from -> to`
    ///
    /// Returns the split point when it falls strictly inside the segment,
    /// `None` when the segment cannot be split there.
    fn split_segment(&self, from: Point2, to: Point2, at: Point2) -> Option<Point2>;

    /// Recompute floor/ceiling faces after a slab outline changed
    fn rebuild_slab_faces(&self, layer: &Layer);

    /// Mark an entity's cached geometry stale
    fn dirty_geometry(&self, id: &EntityId);
}

/// Plan-view kernel used when no scene kernel is injected
#[derive(Debug, Clone)]
pub struct PlanarKernel {
    /// Max perpendicular distance (mm) between a pick point and the segment
    pub snap_distance: f64,
    /// Minimum length (mm) of either piece after a split
    pub min_piece: f64,
}

impl Default for PlanarKernel {
    fn default() -> Self {
        Self {
            snap_distance: 150.0,
            min_piece: 1.0,
        }
    }
}

impl GeometryKernel for PlanarKernel {
    fn split_segment(&self, from: Point2, to: Point2, at: Point2) -> Option<Point2> {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return None;
        }

        let t = ((at.x - from.x) * dx + (at.y - from.y) * dy) / len_sq;
        let projected = Point2::new(from.x + t * dx, from.y + t * dy);
        if projected.distance(&at) > self.snap_distance {
            return None;
        }

        let len = len_sq.sqrt();
        let along = t * len;
        if along < self.min_piece || len - along < self.min_piece {
            return None;
        }
        Some(projected)
    }

    fn rebuild_slab_faces(&self, layer: &Layer) {
        tracing::debug!(
            layer_id = %layer.id,
            vertices = layer.slab_profile.len(),
            "rebuild slab faces"
        );
    }

    fn dirty_geometry(&self, id: &EntityId) {
        tracing::debug!(entity_id = %id, "dirty geometry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel() -> PlanarKernel {
        PlanarKernel::default()
    }

    #[test]
    fn test_split_projects_onto_segment() {
        let p = kernel().split_segment(
            Point2::new(0.0, 0.0),
            Point2::new(4000.0, 0.0),
            Point2::new(1500.0, 60.0),
        );
        assert_eq!(p, Some(Point2::new(1500.0, 0.0)));
    }

    #[test]
    fn test_split_at_endpoint_fails() {
        let p = kernel().split_segment(
            Point2::new(0.0, 0.0),
            Point2::new(4000.0, 0.0),
            Point2::new(4000.0, 0.0),
        );
        assert_eq!(p, None);
    }

    #[test]
    fn test_split_far_from_segment_fails() {
        let p = kernel().split_segment(
            Point2::new(0.0, 0.0),
            Point2::new(4000.0, 0.0),
            Point2::new(2000.0, 900.0),
        );
        assert_eq!(p, None);
    }

    #[test]
    fn test_degenerate_segment_fails() {
        let origin = Point2::new(10.0, 10.0);
        assert_eq!(kernel().split_segment(origin, origin, origin), None);
    }
}
