//! Solar ECS -- sparse-set Entity Component System.
//!
//! Each component type lives in its own [`DualSparseSet`](dual_sparse_set::DualSparseSet):
//! a sparse array maps an entity to a position in a packed dense array, and
//! the components sit in a second array kept element-for-element in step with
//! it. Attach, detach and lookup are O(1) and iteration walks contiguous
//! memory. The [`Manager`](manager::Manager) owns every store, allocates
//! entities and dispatches registered [`System`](system::System)s.
//!
//! # Quick Start
//!
//! ```
//! use solar_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut manager = Manager::new();
//! manager.register::<Position>("position");
//! manager.register::<Velocity>("velocity");
//!
//! let entity = manager.create();
//! manager.add(entity, Position { x: 0.0, y: 0.0 }).unwrap();
//! manager.add(entity, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
//!
//! manager.operate2::<Position, Velocity, _>(|_, pos, vel| {
//!     pos.x += vel.dx;
//!     pos.y += vel.dy;
//! });
//!
//! assert_eq!(manager.get::<Position>(entity), &Position { x: 1.0, y: 0.0 });
//! ```

#![deny(unsafe_code)]

pub mod dual_sparse_set;
pub mod entity;
pub mod manager;
pub mod snapshot;
pub mod sparse_set;
pub mod system;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
///
/// Looking up a component an entity does not have through `get` is not an
/// error value: it panics, because it indicates a bug in the caller.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The value does not carry the valid entity tag.
    #[error("{raw:#x} is not a valid entity (missing tag)")]
    InvalidEntity { raw: u64 },

    /// The entity is well formed but not live.
    #[error("entity {entity} does not exist (destroyed or never created)")]
    DeadEntity { entity: entity::Entity },

    /// A component type was referenced that has not been registered.
    #[error("component type '{name}' not registered")]
    UnknownComponent { name: String },

    /// The entity already holds a component of this type.
    #[error("entity {entity} already has a component of type {component}")]
    DuplicateComponent {
        entity: entity::Entity,
        component: &'static str,
    },

    /// The entity has no component of this type.
    #[error("entity {entity} has no '{component}' component")]
    MissingComponent {
        entity: entity::Entity,
        component: String,
    },

    /// The component type was registered without serde support.
    #[error("component '{component}' was not registered as serializable")]
    NotSerializable { component: String },

    /// A snapshot is internally inconsistent and was not restored.
    #[error("invalid snapshot: {details}")]
    InvalidSnapshot { details: String },

    /// JSON conversion of a component value failed.
    #[error("failed to (de)serialize component '{component}': {details}")]
    Serialization { component: String, details: String },
}

impl EcsError {
    pub(crate) fn unknown<T>() -> Self {
        Self::UnknownComponent {
            name: std::any::type_name::<T>().to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::dual_sparse_set::DualSparseSet;
    pub use crate::entity::{Entity, VALID_ENTITY_TAG};
    pub use crate::manager::Manager;
    pub use crate::snapshot::ManagerSnapshot;
    pub use crate::sparse_set::SparseSet;
    pub use crate::system::{DeltaTime, Event, System};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
