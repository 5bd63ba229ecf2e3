//! Error types for distance queries.
//!
//! Query variants are precondition violations: the whole matrix computation
//! is abandoned rather than returning a partial result. `HierarchyLocked` is
//! raised by shape maintenance, never by a query.

use thiserror::Error;

use crate::utils::allocator::EntityId;

/// Failure raised while evaluating a world snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DistanceError {
    /// The object has no shape, or its shape id no longer resolves.
    #[error("collision object {object} has no assigned shape")]
    MissingShape { object: EntityId },
    /// The shape's bounding-volume hierarchy was never built or was released.
    #[error("shape of collision object {object} has no bounding volume hierarchy to lock")]
    MissingBvh { object: EntityId },
    /// The shape contains no triangles.
    #[error("shape of collision object {object} is degenerate: zero triangles")]
    DegenerateShape { object: EntityId },
    /// A hierarchy rebuild or release was attempted while a query holds its lock.
    #[error("bounding volume hierarchy is locked by an active query")]
    HierarchyLocked,
    /// A world mutation referenced an id that is not (or no longer) present.
    #[error("unknown collision object or shape {object}")]
    UnknownObject { object: EntityId },
}

/// Convenient Result alias for distance operations.
pub type Result<T> = std::result::Result<T, DistanceError>;
