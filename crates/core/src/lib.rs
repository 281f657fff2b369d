//! `shapes-core`: entity model for shapes and drawings.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! identifiers, the shape sum type, the drawing aggregate and their JSON codec.

pub mod codec;
pub mod drawing;
pub mod entity;
pub mod error;
pub mod id;
pub mod shape;
pub mod value_object;

pub use codec::EntityCodec;
pub use drawing::Drawing;
pub use entity::IdentifiedEntity;
pub use error::{DomainError, DomainResult};
pub use id::EntityId;
pub use shape::{Circle, Rectangle, SHAPE_TYPE_FIELD, Shape, ShapeBase, ShapeKind, ShapeVariant};
pub use value_object::{Position, ValueObject};
