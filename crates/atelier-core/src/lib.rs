//! Atelier Core - entity model and request kinds for the edit engine
//!
//! This crate provides:
//! - The entity model (walls, contents, layers) and its `Snapshot` capability
//! - `Document` plus `EditScope`, the journaled mutation path used by requests
//! - The geometry collaborator trait and a planar default kernel
//! - The closed set of request kinds and their mutations
//! - Error, logging and configuration facilities shared by the engine and CLI

pub mod config;
pub mod document;
pub mod errors;
pub mod geometry;
pub mod logging_facility;
pub mod model;
pub mod requests;

// Re-export commonly used types
pub use config::EngineConfig;
pub use document::{Document, EditScope, StateDelta};
pub use errors::{AtelierError, ExError, ExErrorKind, Result};
pub use geometry::{GeometryKernel, PlanarKernel};
pub use model::{Content, Entity, EntityId, Layer, Point2, Snapshot, Wall};
pub use requests::{build_mutation, Mutation, RequestKind, RequestParams, RequestResult};
