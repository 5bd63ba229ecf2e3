use super::types::Transform;
use crate::utils::allocator::EntityId;
use serde::{Deserialize, Serialize};

/// A placed instance of a shape in a collision world.
///
/// `id` is the stable identity assigned at insertion. Several objects may
/// share one shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionObject {
    pub id: EntityId,
    pub shape: Option<EntityId>,
    pub transform: Transform,
}

impl Default for CollisionObject {
    fn default() -> Self {
        Self {
            id: EntityId::default(),
            shape: None,
            transform: Transform::IDENTITY,
        }
    }
}

impl CollisionObject {
    pub fn new(shape: EntityId, transform: Transform) -> Self {
        Self {
            shape: Some(shape),
            transform,
            ..Self::default()
        }
    }

    pub fn unattached(transform: Transform) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }
}
