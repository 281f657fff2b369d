//! JSON codec for entities crossing the wire.
//!
//! Shape variants always emit the `shapeType` discriminant, even when they are
//! served from a single-variant collection. On input the discriminant may be
//! left out for a single-variant collection (the collection's own variant is
//! assumed); naming a different variant is a deserialization failure.

use chrono::SubsecRound;
use serde_json::Value;

use crate::drawing::Drawing;
use crate::error::{DomainError, DomainResult};
use crate::shape::{SHAPE_TYPE_FIELD, Shape, ShapeVariant};

/// Conversion between an entity and its JSON wire form.
pub trait EntityCodec: Sized {
    fn to_json(&self) -> DomainResult<Value>;

    fn from_json(value: Value) -> DomainResult<Self>;

    fn from_slice(bytes: &[u8]) -> DomainResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json(value)
    }
}

impl<T> EntityCodec for T
where
    T: ShapeVariant,
{
    fn to_json(&self) -> DomainResult<Value> {
        let shape: Shape = self.clone().into();
        Ok(serde_json::to_value(shape)?)
    }

    fn from_json(mut value: Value) -> DomainResult<Self> {
        if let Value::Object(map) = &mut value {
            map.entry(SHAPE_TYPE_FIELD)
                .or_insert_with(|| Value::String(T::SHAPE_KIND.as_str().to_string()));
        }

        let shape: Shape = serde_json::from_value(value)?;
        let kind = shape.kind();
        T::from_shape(shape).ok_or_else(|| {
            DomainError::deserialization(format!(
                "expected shape type {}, got {}",
                T::SHAPE_KIND,
                kind
            ))
        })
    }
}

impl EntityCodec for Drawing {
    fn to_json(&self) -> DomainResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The creation date is cut to millisecond precision, like [`Drawing::new`].
    fn from_json(value: Value) -> DomainResult<Self> {
        let mut drawing: Drawing = serde_json::from_value(value)?;
        drawing.creation_date = drawing.creation_date.trunc_subsecs(3);
        Ok(drawing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::IdentifiedEntity;
    use crate::id::EntityId;
    use crate::shape::{Circle, Rectangle};
    use crate::value_object::Position;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn circle_wire_form_carries_discriminant() {
        let c = Circle::new("Black 2000", Position::new(1, 2), 7);
        let value = c.to_json().unwrap();
        assert_eq!(value["shapeType"], json!("Circle"));
        assert_eq!(value["radius"], json!(7));
        assert_eq!(value["id"], json!(null));
    }

    #[test]
    fn single_variant_decode_accepts_missing_discriminant() {
        let c = Circle::from_json(json!({
            "colour": "red",
            "position": {"x": 0, "y": 0},
            "radius": 3,
        }))
        .unwrap();
        assert_eq!(c.radius, 3);
    }

    #[test]
    fn single_variant_decode_rejects_other_variant() {
        let err = Circle::from_json(json!({
            "shapeType": "Rectangle",
            "colour": "red",
            "position": {"x": 0, "y": 0},
        }))
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::deserialization("expected shape type Circle, got Rectangle")
        );
    }

    #[test]
    fn unknown_discriminant_is_a_deserialization_error() {
        let err = Rectangle::from_json(json!({
            "shapeType": "Hexagon",
            "colour": "red",
            "position": {"x": 0, "y": 0},
        }))
        .unwrap_err();
        assert!(matches!(err, DomainError::Deserialization(msg) if msg.contains("Hexagon")));
    }

    #[test]
    fn unknown_discriminant_inside_drawing_is_rejected() {
        let err = Drawing::from_slice(
            br#"{"name":"d","creationDate":"2024-01-01T00:00:00Z",
                 "shapes":[{"shapeType":"Blob","colour":"c","position":{"x":0,"y":0}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Deserialization(_)));
    }

    #[test]
    fn drawing_creation_date_is_cut_to_millis_on_decode() {
        let drawing = Drawing::from_slice(
            br#"{"name":"d","creationDate":"2024-01-01T00:00:00.123456789Z","shapes":[]}"#,
        )
        .unwrap();
        assert_eq!(drawing.creation_date.timestamp_subsec_nanos(), 123_000_000);

        let value = drawing.to_json().unwrap();
        assert_eq!(value["creationDate"], json!("2024-01-01T00:00:00.123Z"));
    }

    #[test]
    fn malformed_json_is_a_deserialization_error() {
        let err = Circle::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, DomainError::Deserialization(_)));
    }

    fn arb_base() -> impl Strategy<Value = (Option<i64>, String, i32, i32)> {
        (
            proptest::option::of(1i64..i64::MAX),
            "[A-Za-z0-9 ]{0,24}",
            any::<i32>(),
            any::<i32>(),
        )
    }

    fn arb_shape() -> impl Strategy<Value = Shape> {
        prop_oneof![
            (arb_base(), any::<i32>()).prop_map(|((id, colour, x, y), radius)| {
                let mut c = Circle::new(colour, Position::new(x, y), radius);
                c.set_id(id.map(EntityId::from_i64));
                Shape::from(c)
            }),
            (arb_base(), any::<i32>(), any::<i32>()).prop_map(|((id, colour, x, y), h, w)| {
                let mut r = Rectangle::new(colour, Position::new(x, y), h, w);
                r.set_id(id.map(EntityId::from_i64));
                Shape::from(r)
            }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any shape survives encode/decode with its variant intact.
        #[test]
        fn shapes_survive_the_wire(shape in arb_shape()) {
            let value = serde_json::to_value(&shape).unwrap();
            prop_assert_eq!(value[SHAPE_TYPE_FIELD].as_str(), Some(shape.kind().as_str()));

            let back: Shape = serde_json::from_value(value).unwrap();
            prop_assert_eq!(back, shape);
        }

        /// Property: a drawing's heterogeneous shape list decodes to the same variants.
        #[test]
        fn drawing_shapes_survive_the_wire(shapes in prop::collection::vec(arb_shape(), 0..8)) {
            let mut drawing = Drawing::new("prop");
            drawing.shapes = shapes;

            let value = drawing.to_json().unwrap();
            let back = Drawing::from_json(value).unwrap();
            prop_assert_eq!(back, drawing);
        }
    }
}
