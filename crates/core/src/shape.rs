//! Shapes: a closed sum type over the concrete variants.
//!
//! Shared fields (`id`, `colour`, `position`) live in [`ShapeBase`], which each
//! variant embeds. On the wire the base fields are flattened into the variant's
//! object and the variant is named by the `shapeType` discriminant.

use serde::{Deserialize, Serialize};

use crate::entity::IdentifiedEntity;
use crate::id::EntityId;
use crate::value_object::Position;

/// Name of the discriminant field in a shape's wire form.
pub const SHAPE_TYPE_FIELD: &str = "shapeType";

/// Which concrete variant a shape is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Rectangle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 2] = [ShapeKind::Circle, ShapeKind::Rectangle];

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Circle => "Circle",
            ShapeKind::Rectangle => "Rectangle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl core::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields common to every shape variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeBase {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub colour: String,
    pub position: Position,
}

impl ShapeBase {
    pub fn new(colour: impl Into<String>, position: Position) -> Self {
        Self {
            id: None,
            colour: colour.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    #[serde(flatten)]
    pub base: ShapeBase,
    #[serde(default = "Circle::default_radius")]
    pub radius: i32,
}

impl Circle {
    pub const DEFAULT_RADIUS: i32 = 10;

    pub fn new(colour: impl Into<String>, position: Position, radius: i32) -> Self {
        Self {
            base: ShapeBase::new(colour, position),
            radius,
        }
    }

    pub fn with_defaults(colour: impl Into<String>, position: Position) -> Self {
        Self::new(colour, position, Self::DEFAULT_RADIUS)
    }

    fn default_radius() -> i32 {
        Self::DEFAULT_RADIUS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(flatten)]
    pub base: ShapeBase,
    #[serde(default = "Rectangle::default_height")]
    pub height: i32,
    #[serde(default = "Rectangle::default_width")]
    pub width: i32,
}

impl Rectangle {
    pub const DEFAULT_HEIGHT: i32 = 10;
    pub const DEFAULT_WIDTH: i32 = 10;

    pub fn new(colour: impl Into<String>, position: Position, height: i32, width: i32) -> Self {
        Self {
            base: ShapeBase::new(colour, position),
            height,
            width,
        }
    }

    pub fn with_defaults(colour: impl Into<String>, position: Position) -> Self {
        Self::new(colour, position, Self::DEFAULT_HEIGHT, Self::DEFAULT_WIDTH)
    }

    fn default_height() -> i32 {
        Self::DEFAULT_HEIGHT
    }

    fn default_width() -> i32 {
        Self::DEFAULT_WIDTH
    }
}

/// A shape of any variant.
///
/// This is the element type of heterogeneous collections; its serialized
/// form always carries the `shapeType` discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shapeType")]
pub enum Shape {
    Circle(Circle),
    Rectangle(Rectangle),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
        }
    }

    pub fn base(&self) -> &ShapeBase {
        match self {
            Shape::Circle(c) => &c.base,
            Shape::Rectangle(r) => &r.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ShapeBase {
        match self {
            Shape::Circle(c) => &mut c.base,
            Shape::Rectangle(r) => &mut r.base,
        }
    }
}

impl IdentifiedEntity for Shape {
    const KIND: &'static str = "shape";

    fn id(&self) -> Option<EntityId> {
        self.base().id
    }

    fn set_id(&mut self, id: Option<EntityId>) {
        self.base_mut().id = id;
    }

    /// Same identifier and same variant.
    fn is_same_entity(&self, other: &Self) -> bool {
        self.kind() == other.kind()
            && matches!((self.id(), other.id()), (Some(a), Some(b)) if a == b)
    }
}

/// A concrete shape variant that can stand on its own as an entity.
///
/// Each variant converts losslessly into [`Shape`] and can be extracted back
/// out of one when the discriminant matches.
pub trait ShapeVariant: IdentifiedEntity + Into<Shape> {
    const SHAPE_KIND: ShapeKind;

    fn from_shape(shape: Shape) -> Option<Self>;
}

macro_rules! impl_shape_variant {
    ($t:ident, $kind:literal) => {
        impl IdentifiedEntity for $t {
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<EntityId> {
                self.base.id
            }

            fn set_id(&mut self, id: Option<EntityId>) {
                self.base.id = id;
            }
        }

        impl From<$t> for Shape {
            fn from(value: $t) -> Self {
                Shape::$t(value)
            }
        }

        impl ShapeVariant for $t {
            const SHAPE_KIND: ShapeKind = ShapeKind::$t;

            fn from_shape(shape: Shape) -> Option<Self> {
                match shape {
                    Shape::$t(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_shape_variant!(Circle, "circle");
impl_shape_variant!(Rectangle, "rectangle");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variants_fall_back_to_defaults() {
        let c = Circle::with_defaults("red", Position::new(0, 0));
        assert_eq!(c.radius, 10);
        assert_eq!(c.id(), None);

        let r = Rectangle::with_defaults("blue", Position::new(1, 1));
        assert_eq!((r.height, r.width), (10, 10));
    }

    #[test]
    fn shape_serializes_with_discriminant_and_flattened_base() {
        let mut c = Circle::new("Black 2000", Position::new(1, 2), 7);
        c.set_id(Some(EntityId::from_i64(3)));

        let value = serde_json::to_value(Shape::from(c)).unwrap();
        assert_eq!(
            value,
            json!({
                "shapeType": "Circle",
                "id": 3,
                "colour": "Black 2000",
                "position": {"x": 1, "y": 2},
                "radius": 7,
            })
        );
    }

    #[test]
    fn discriminant_selects_variant_on_deserialize() {
        let shape: Shape = serde_json::from_value(json!({
            "shapeType": "Rectangle",
            "id": null,
            "colour": "green",
            "position": {"x": 5, "y": 6},
            "height": 3,
            "width": 4,
        }))
        .unwrap();

        assert_eq!(shape.kind(), ShapeKind::Rectangle);
        let r = Rectangle::from_shape(shape).unwrap();
        assert_eq!((r.height, r.width), (3, 4));
        assert_eq!(r.base.colour, "green");
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        let err = serde_json::from_value::<Shape>(json!({
            "shapeType": "Triangle",
            "colour": "green",
            "position": {"x": 0, "y": 0},
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Triangle"));
    }

    #[test]
    fn missing_discriminant_is_rejected_for_heterogeneous_shapes() {
        let res = serde_json::from_value::<Shape>(json!({
            "colour": "green",
            "position": {"x": 0, "y": 0},
            "radius": 1,
        }));
        assert!(res.is_err());
    }

    #[test]
    fn null_radius_is_rejected() {
        let res = serde_json::from_value::<Shape>(json!({
            "shapeType": "Circle",
            "colour": "green",
            "position": {"x": 0, "y": 0},
            "radius": null,
        }));
        assert!(res.is_err());
    }

    #[test]
    fn from_shape_refuses_other_variant() {
        let shape = Shape::from(Circle::with_defaults("x", Position::default()));
        assert!(Rectangle::from_shape(shape).is_none());
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ShapeKind::parse("Triangle"), None);
    }

    #[test]
    fn identity_is_id_based() {
        let mut a = Circle::new("red", Position::new(0, 0), 1);
        let mut b = Circle::new("blue", Position::new(9, 9), 2);
        assert!(!a.is_same_entity(&b));

        a.set_id(Some(EntityId::from_i64(1)));
        b.set_id(Some(EntityId::from_i64(1)));
        assert!(a.is_same_entity(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn shapes_of_different_variants_are_never_the_same_entity() {
        let id = Some(EntityId::from_i64(4));
        let mut c = Circle::new("red", Position::new(0, 0), 1);
        let mut r = Rectangle::new("red", Position::new(0, 0), 1, 1);
        c.set_id(id);
        r.set_id(id);

        let (c, r) = (Shape::from(c), Shape::from(r));
        assert!(!c.is_same_entity(&r));
        assert!(c.is_same_entity(&c.clone()));
    }
}
