pub mod content;
pub mod entity;
pub mod ids;
pub mod layer;
pub mod snapshot;
pub mod wall;

pub use content::Content;
pub use entity::Entity;
pub use ids::{EntityId, Point2};
pub use layer::{Layer, Underlay};
pub use snapshot::Snapshot;
pub use wall::Wall;
