//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

/// Marker trait for value objects.
///
/// Value objects have **no identity**; two value objects with the same
/// attribute values are the same value. They are immutable and cheap to copy.
///
/// - **Value Object**: `Position { x: 1, y: 2 }`
/// - **Entity**: `Circle { id: Some(7), .. }`
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Integer position of a shape on a drawing.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl ValueObject for Position {}
