//! Entity trait: identity + continuity across state changes.

use crate::id::EntityId;

/// An entity whose identity is a store-assigned [`EntityId`].
///
/// The identifier is `None` until the entity has been persisted. Once
/// assigned it never changes; updates are written against it.
pub trait IdentifiedEntity: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Short entity-kind name used in log lines and error messages.
    const KIND: &'static str;

    /// Returns the identifier, if the entity has been persisted.
    fn id(&self) -> Option<EntityId>;

    fn set_id(&mut self, id: Option<EntityId>);

    /// Identity comparison: both sides persisted and carrying the same id.
    ///
    /// Structural `PartialEq` is still available for deep comparisons.
    fn is_same_entity(&self, other: &Self) -> bool {
        matches!((self.id(), other.id()), (Some(a), Some(b)) if a == b)
    }
}
