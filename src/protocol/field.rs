//! Payload field codec
//!
//! The sender lays base fields out largest primitive first (8, 4, 2, then
//! 1-byte types, declaration order within each width) and appends
//! extension fields untouched. Arrays sort by element width, not by their
//! total length.

use bytes::{Buf, Bytes, BytesMut};

use super::{Fields, Value};
use crate::definitions::{Catalog, EnumSchema, FieldSchema, FieldType, MessageSchema, Primitive};

/// Primitive widths, in wire order
const WIDTH_TIERS: [usize; 4] = [8, 4, 2, 1];

/// Reorder fields from declaration order into wire order.
#[must_use]
pub fn wire_order(fields: &[FieldSchema]) -> Vec<&FieldSchema> {
    let mut ordered = Vec::with_capacity(fields.len());
    for width in WIDTH_TIERS {
        ordered.extend(
            fields
                .iter()
                .filter(|field| !field.extension && field.kind.primitive().size() == width),
        );
    }
    ordered.extend(fields.iter().filter(|field| field.extension));
    ordered
}

/// Decode every field of `message` from `payload`.
///
/// A short payload reads as if zero-filled to the full message size;
/// bytes past the last field are ignored. Enum and bitmask references are
/// resolved through `catalog`.
#[must_use]
pub fn decode_fields(message: &MessageSchema, payload: &[u8], catalog: &Catalog) -> Fields {
    let mut padded = BytesMut::from(payload);
    let needed = message.wire_size();
    if padded.len() < needed {
        padded.resize(needed, 0);
    }
    let mut buf = padded.freeze();

    let mut fields = Fields::new();
    for field in wire_order(&message.fields) {
        let enumeration = field
            .enum_name
            .as_deref()
            .and_then(|name| catalog.enumeration(name));
        let value = decode_field(field.kind, &mut buf, enumeration);
        fields.insert(field.name.clone(), value);
    }
    fields
}

fn decode_field(kind: FieldType, buf: &mut Bytes, enumeration: Option<&EnumSchema>) -> Value {
    let primitive = kind.primitive();
    match kind.array_len() {
        Some(len) if kind.is_string() => read_text(buf, len),
        Some(len) => Value::List(
            (0..len)
                .map(|_| resolve(read_scalar(primitive, buf), enumeration))
                .collect(),
        ),
        None => resolve(read_scalar(primitive, buf), enumeration),
    }
}

fn read_scalar(primitive: Primitive, buf: &mut Bytes) -> Value {
    match primitive {
        Primitive::U8 | Primitive::MavlinkVersion => Value::Unsigned(u64::from(buf.get_u8())),
        Primitive::I8 => Value::Signed(i64::from(buf.get_i8())),
        Primitive::U16 => Value::Unsigned(u64::from(buf.get_u16_le())),
        Primitive::I16 => Value::Signed(i64::from(buf.get_i16_le())),
        Primitive::U32 => Value::Unsigned(u64::from(buf.get_u32_le())),
        Primitive::I32 => Value::Signed(i64::from(buf.get_i32_le())),
        Primitive::U64 => Value::Unsigned(buf.get_u64_le()),
        Primitive::I64 => Value::Signed(buf.get_i64_le()),
        Primitive::F32 => Value::Float(f64::from(buf.get_f32_le())),
        Primitive::F64 => Value::Float(buf.get_f64_le()),
        Primitive::Char => read_text(buf, 1),
    }
}

fn read_text(buf: &mut Bytes, len: usize) -> Value {
    let raw = buf.split_to(len);
    let text = String::from_utf8_lossy(&raw);
    Value::Text(text.trim_end_matches('\0').to_owned())
}

/// Replace an integer with its enum label or bitmask flag list.
#[allow(clippy::cast_sign_loss)]
fn resolve(value: Value, enumeration: Option<&EnumSchema>) -> Value {
    let Some(schema) = enumeration else {
        return value;
    };

    let (key, bits, span) = match value {
        Value::Unsigned(raw) => (i64::try_from(raw).ok(), raw, bit_length(raw)),
        Value::Signed(raw) => (Some(raw), raw as u64, bit_length(raw.unsigned_abs())),
        _ => return value,
    };

    if schema.bitmask {
        return Value::List(bitmask_flags(bits, span, schema));
    }

    match key.and_then(|key| schema.label(key)) {
        Some(label) => Value::Label(label.to_owned()),
        None => value,
    }
}

const fn bit_length(magnitude: u64) -> u32 {
    u64::BITS - magnitude.leading_zeros()
}

/// Set bits below `span` in ascending order, labelled where the enum names
/// them. Signed values span the bit length of their magnitude.
fn bitmask_flags(bits: u64, span: u32, schema: &EnumSchema) -> Vec<Value> {
    (0..span)
        .map(|bit| 1_u64 << bit)
        .filter(|flag| bits & flag != 0)
        .map(|flag| {
            i64::try_from(flag)
                .ok()
                .and_then(|key| schema.label(key))
                .map_or(Value::Unsigned(flag), |label| Value::Label(label.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scalar(name: &str, primitive: Primitive) -> FieldSchema {
        FieldSchema::new(name, FieldType::scalar(primitive))
    }

    fn names<'a>(fields: &[&'a FieldSchema]) -> Vec<&'a str> {
        fields.iter().map(|field| field.name.as_str()).collect()
    }

    fn heartbeat() -> MessageSchema {
        let mut message = MessageSchema::new(0, "HEARTBEAT");
        message.fields = vec![
            scalar("type", Primitive::U8).with_enum("MAV_TYPE"),
            scalar("autopilot", Primitive::U8),
            scalar("base_mode", Primitive::U8).with_enum("MAV_MODE_FLAG"),
            scalar("custom_mode", Primitive::U32),
            scalar("system_status", Primitive::U8),
            scalar("mavlink_version", Primitive::MavlinkVersion),
        ];
        message
    }

    fn mode_flags() -> EnumSchema {
        let mut schema = EnumSchema::new("MAV_MODE_FLAG");
        schema.bitmask = true;
        schema.entries.insert(1, "CUSTOM_MODE_ENABLED".into());
        schema.entries.insert(128, "SAFETY_ARMED".into());
        schema
    }

    fn mav_type() -> EnumSchema {
        let mut schema = EnumSchema::new("MAV_TYPE");
        schema.entries.insert(10, "MAV_TYPE_GROUND_ROVER".into());
        schema
    }

    #[test]
    fn test_wire_order_groups_by_width() {
        let message = heartbeat();
        let order = wire_order(&message.fields);
        assert_eq!(
            names(&order),
            [
                "custom_mode",
                "type",
                "autopilot",
                "base_mode",
                "system_status",
                "mavlink_version"
            ]
        );
    }

    #[test]
    fn test_wire_order_uses_element_width_and_keeps_extensions_last() {
        let fields = vec![
            scalar("flag", Primitive::U8),
            FieldSchema::new("text", FieldType::array(Primitive::Char, 50)),
            FieldSchema::new("cells", FieldType::array(Primitive::U16, 10)),
            scalar("stamp", Primitive::U64),
            scalar("late_u8", Primitive::U8).extension(),
            scalar("late_u64", Primitive::U64).extension(),
        ];
        let order = wire_order(&fields);
        assert_eq!(
            names(&order),
            ["stamp", "cells", "flag", "text", "late_u8", "late_u64"]
        );
    }

    #[test]
    fn test_truncated_payload_reads_as_zero() {
        let mut message = MessageSchema::new(1, "PARTIAL");
        message.fields = vec![
            scalar("wide", Primitive::U32),
            scalar("narrow", Primitive::I16),
            FieldSchema::new("name", FieldType::array(Primitive::Char, 4)),
        ];
        let catalog = Catalog::default();

        let fields = decode_fields(&message, &[0x01, 0x02], &catalog);
        assert_eq!(fields["wide"], Value::Unsigned(0x0201));
        assert_eq!(fields["narrow"], Value::Signed(0));
        assert_eq!(fields["name"], Value::Text(String::new()));
    }

    #[test]
    fn test_enum_labels_and_passthrough() {
        let catalog = Catalog::from_parts([], [mav_type(), mode_flags()]);
        let message = heartbeat();

        let labelled = decode_fields(&message, &[0, 0, 0, 0, 10, 3, 0, 0, 3], &catalog);
        assert_eq!(labelled["type"], Value::Label("MAV_TYPE_GROUND_ROVER".into()));
        assert_eq!(labelled["autopilot"], Value::Unsigned(3));

        let unknown = decode_fields(&message, &[0, 0, 0, 0, 42], &catalog);
        assert_eq!(unknown["type"], Value::Unsigned(42));
    }

    #[test]
    fn test_unresolved_enum_reference_passes_raw_value() {
        let mut message = MessageSchema::new(2, "M");
        message.fields = vec![scalar("mode", Primitive::U8).with_enum("NOT_IN_CATALOG")];
        let fields = decode_fields(&message, &[9], &Catalog::default());
        assert_eq!(fields["mode"], Value::Unsigned(9));
    }

    #[test]
    fn test_bitmask_zero_is_empty_list() {
        let catalog = Catalog::from_parts([], [mode_flags()]);
        let fields = decode_fields(&heartbeat(), &[0; 9], &catalog);
        assert_eq!(fields["base_mode"], Value::List(vec![]));
    }

    #[test]
    fn test_bitmask_ascending_with_unlabelled_bits() {
        let catalog = Catalog::from_parts([], [mode_flags()]);
        // base_mode = bit 0 | bit 3 | bit 7
        let fields = decode_fields(&heartbeat(), &[0, 0, 0, 0, 0, 0, 0x89], &catalog);
        assert_eq!(
            fields["base_mode"],
            Value::List(vec![
                Value::Label("CUSTOM_MODE_ENABLED".into()),
                Value::Unsigned(8),
                Value::Label("SAFETY_ARMED".into()),
            ])
        );
    }

    #[test]
    fn test_signed_bitmask_spans_magnitude_bits() {
        let mut schema = EnumSchema::new("FLAGS");
        schema.bitmask = true;
        schema.entries.insert(2, "SECOND".into());
        let catalog = Catalog::from_parts([], [schema]);
        let mut message = MessageSchema::new(3, "M");
        message.fields = vec![
            scalar("minus_one", Primitive::I8).with_enum("FLAGS"),
            scalar("minus_two", Primitive::I8).with_enum("FLAGS"),
            scalar("minus_six", Primitive::I8).with_enum("FLAGS"),
        ];

        // -1, -2, -6 as int8_t
        let fields = decode_fields(&message, &[0xFF, 0xFE, 0xFA], &catalog);
        assert_eq!(fields["minus_one"], Value::List(vec![Value::Unsigned(1)]));
        assert_eq!(fields["minus_two"], Value::List(vec![Value::Label("SECOND".into())]));
        assert_eq!(fields["minus_six"], Value::List(vec![Value::Label("SECOND".into())]));
    }

    #[test]
    fn test_array_resolves_each_element() {
        let catalog = Catalog::from_parts([], [mav_type()]);
        let mut message = MessageSchema::new(4, "M");
        message.fields = vec![
            FieldSchema::new("kinds", FieldType::array(Primitive::U8, 3)).with_enum("MAV_TYPE"),
        ];

        let fields = decode_fields(&message, &[10, 11, 10], &catalog);
        assert_eq!(
            fields["kinds"],
            Value::List(vec![
                Value::Label("MAV_TYPE_GROUND_ROVER".into()),
                Value::Unsigned(11),
                Value::Label("MAV_TYPE_GROUND_ROVER".into()),
            ])
        );
    }

    #[test]
    fn test_text_strips_only_trailing_nul() {
        let mut message = MessageSchema::new(5, "M");
        message.fields = vec![FieldSchema::new("text", FieldType::array(Primitive::Char, 6))];
        let fields = decode_fields(&message, b"ab\0c\0\0", &Catalog::default());
        assert_eq!(fields["text"], Value::Text("ab\0c".into()));
    }

    fn primitive_strategy() -> impl Strategy<Value = Primitive> {
        prop_oneof![
            Just(Primitive::U8),
            Just(Primitive::I8),
            Just(Primitive::U16),
            Just(Primitive::I16),
            Just(Primitive::U32),
            Just(Primitive::I32),
            Just(Primitive::U64),
            Just(Primitive::I64),
            Just(Primitive::F32),
            Just(Primitive::F64),
            Just(Primitive::Char),
            Just(Primitive::MavlinkVersion),
        ]
    }

    fn fields_strategy() -> impl Strategy<Value = Vec<FieldSchema>> {
        (
            prop::collection::vec((primitive_strategy(), prop::option::of(1usize..8)), 0..12),
            0usize..4,
        )
            .prop_map(|(layouts, extensions)| {
                let base = layouts.len().saturating_sub(extensions);
                layouts
                    .into_iter()
                    .enumerate()
                    .map(|(index, (primitive, len))| {
                        let kind = match len {
                            Some(len) => FieldType::array(primitive, len),
                            None => FieldType::scalar(primitive),
                        };
                        let field = FieldSchema::new(format!("f{index}"), kind);
                        if index >= base { field.extension() } else { field }
                    })
                    .collect()
            })
    }

    proptest! {
        /// Property: wire order depends only on declared order and types
        #[test]
        fn prop_wire_order_deterministic(fields in fields_strategy()) {
            let first = names(&wire_order(&fields));
            let reparsed = fields.clone();
            let second = names(&wire_order(&reparsed));
            prop_assert_eq!(first, second);
        }

        /// Property: wire order is a permutation honouring width tiers
        #[test]
        fn prop_wire_order_is_tiered_permutation(fields in fields_strategy()) {
            let order = wire_order(&fields);
            prop_assert_eq!(order.len(), fields.len());

            let base: Vec<_> = order.iter().take_while(|f| !f.extension).collect();
            prop_assert!(order[base.len()..].iter().all(|f| f.extension));
            let tiered = base
                .windows(2)
                .all(|pair| pair[0].kind.primitive().size() >= pair[1].kind.primitive().size());
            prop_assert!(tiered);

            // declaration order survives inside each width and among extensions
            let position = |name: &str| fields.iter().position(|f| f.name == name).unwrap();
            let stable = order.windows(2).all(|pair| {
                let same_group = pair[0].extension == pair[1].extension
                    && (pair[0].extension
                        || pair[0].kind.primitive().size() == pair[1].kind.primitive().size());
                !same_group || position(&pair[0].name) < position(&pair[1].name)
            });
            prop_assert!(stable);
        }
    }
}
