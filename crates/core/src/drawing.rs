//! Drawing aggregate: a named set of owned shapes.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::IdentifiedEntity;
use crate::id::EntityId;
use crate::shape::Shape;

/// A named drawing owning a set of shapes.
///
/// `shapes` is a set keyed by shape identity: order carries no meaning and a
/// persisted shape appears at most once. Shapes that have not been persisted
/// yet are always distinct members.
///
/// The drawing exclusively owns its shapes. Deleting the drawing deletes them,
/// and a shape dropped from the set is deleted when the drawing is updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub name: String,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Drawing {
    /// New, empty drawing created now.
    ///
    /// The timestamp is kept at millisecond precision so it survives a trip
    /// through the store unchanged.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_creation_date(name, Utc::now())
    }

    pub fn with_creation_date(name: impl Into<String>, creation_date: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name: name.into(),
            creation_date: creation_date.trunc_subsecs(3),
            shapes: Vec::new(),
        }
    }

    /// Adds a shape, replacing any member with the same identifier.
    pub fn add_shape(&mut self, shape: impl Into<Shape>) {
        let shape = shape.into();
        match self.shapes.iter_mut().find(|s| s.is_same_entity(&shape)) {
            Some(existing) => *existing = shape,
            None => self.shapes.push(shape),
        }
    }

    /// Removes the member with the given identifier.
    pub fn remove_shape(&mut self, id: EntityId) -> Option<Shape> {
        let idx = self.shapes.iter().position(|s| s.id() == Some(id))?;
        Some(self.shapes.swap_remove(idx))
    }

    /// Collapses members sharing an identifier, keeping the last occurrence.
    pub fn dedup_shapes(&mut self) {
        let shapes = std::mem::take(&mut self.shapes);
        for shape in shapes {
            self.add_shape(shape);
        }
    }

    /// Identifiers of the persisted members.
    pub fn shape_ids(&self) -> Vec<EntityId> {
        self.shapes.iter().filter_map(|s| s.id()).collect()
    }
}

impl IdentifiedEntity for Drawing {
    const KIND: &'static str = "drawing";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: Option<EntityId>) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Circle, Rectangle};
    use crate::value_object::Position;
    use chrono::TimeZone;
    use serde_json::json;

    fn persisted_circle(id: i64, radius: i32) -> Circle {
        let mut c = Circle::new("red", Position::new(0, 0), radius);
        c.set_id(Some(EntityId::from_i64(id)));
        c
    }

    #[test]
    fn add_shape_replaces_member_with_same_id() {
        let mut d = Drawing::new("sketch");
        d.add_shape(persisted_circle(1, 5));
        d.add_shape(persisted_circle(1, 8));
        d.add_shape(Rectangle::with_defaults("blue", Position::default()));
        d.add_shape(Rectangle::with_defaults("blue", Position::default()));

        assert_eq!(d.shapes.len(), 3);
        match &d.shapes[0] {
            Shape::Circle(c) => assert_eq!(c.radius, 8),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn dedup_keeps_last_occurrence() {
        let mut d = Drawing::new("sketch");
        d.shapes = vec![
            persisted_circle(1, 1).into(),
            persisted_circle(2, 2).into(),
            persisted_circle(1, 3).into(),
        ];
        d.dedup_shapes();

        assert_eq!(d.shapes.len(), 2);
        let mut ids = d.shape_ids();
        ids.sort();
        assert_eq!(ids, vec![EntityId::from_i64(1), EntityId::from_i64(2)]);
    }

    #[test]
    fn dedup_keeps_variants_sharing_an_id_apart() {
        let mut rect = Rectangle::new("blue", Position::new(0, 0), 3, 4);
        rect.set_id(Some(EntityId::from_i64(1)));

        let mut d = Drawing::new("sketch");
        d.add_shape(persisted_circle(1, 5));
        d.add_shape(rect);
        d.dedup_shapes();

        assert_eq!(d.shapes.len(), 2);
        assert!(d.shapes.iter().any(|s| matches!(s, Shape::Circle(_))));
        assert!(d.shapes.iter().any(|s| matches!(s, Shape::Rectangle(_))));
    }

    #[test]
    fn remove_shape_by_id() {
        let mut d = Drawing::new("sketch");
        d.add_shape(persisted_circle(4, 1));
        assert!(d.remove_shape(EntityId::from_i64(4)).is_some());
        assert!(d.remove_shape(EntityId::from_i64(4)).is_none());
        assert!(d.shapes.is_empty());
    }

    #[test]
    fn creation_date_is_truncated_to_millis() {
        let d = Drawing::new("sketch");
        assert_eq!(d.creation_date.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn wire_form_uses_camel_case_and_tagged_shapes() {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let mut d = Drawing::with_creation_date("plan", created);
        d.add_shape(Circle::new("red", Position::new(1, 1), 5));

        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["id"], json!(null));
        assert_eq!(value["name"], json!("plan"));
        assert_eq!(value["creationDate"], json!("2024-01-02T03:04:05Z"));
        assert_eq!(value["shapes"][0]["shapeType"], json!("Circle"));

        let back: Drawing = serde_json::from_value(value).unwrap();
        assert_eq!(back, d);
    }
}
