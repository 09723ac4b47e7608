//! Declarative per-message field tables (§3 "Field descriptor", §9
//! "Descriptor-driven schemas → tagged variants + field tables").
//!
//! Each command/response/topic message is described as a static table of
//! [`FieldSpec`]s; [`decode_body`] interprets a [`RawNode`] map against a
//! table to produce a name-keyed [`FieldValue`] map, and [`encode_fields`]
//! renders a list of `(order, FieldValue)` pairs back to wire text.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::frame::{LIST_DELIMITER, render_field};
use crate::value::{FieldValue, RawNode};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// The semantic type of one field, per §3.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Str,
    Int,
    Float,
    Bool,
    Timestamp,
    /// Enumerated field: the wire value (text) is kept as-is; typed
    /// interpretation happens one layer up (e.g. via `bd_codes`).
    Enum,
    DelimitedList,
    /// Nested repeated group: an array of sub-records.
    Group,
}

/// A field descriptor: its stable wire order, semantic type, and whether
/// the message is well-formed without it.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub order: u32,
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

/// An ordered field table for one message (command, response, or topic
/// class). Orders must be unique within a table; this is checked once at
/// startup by [`MessageSchema::validate`], not on every decode.
#[derive(Debug, Clone, Copy)]
pub struct MessageSchema {
    pub fields: &'static [FieldSpec],
}

impl MessageSchema {
    /// Panics if two fields in this schema share an order — a schema
    /// authoring error, not a runtime/wire error.
    pub fn validate(&self) {
        let mut seen = std::collections::HashSet::new();
        for f in self.fields {
            assert!(
                seen.insert(f.order),
                "duplicate field order {} in schema",
                f.order
            );
        }
    }

    #[must_use]
    pub fn field(&self, order: u32) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.order == order)
    }
}

/// Decode a raw body map against `schema` into a name-keyed field map.
///
/// Unknown orders are logged at debug and ignored (§7: "Unknown field
/// order: log at debug, ignore"). A field that fails to parse is simply
/// omitted (its default, usually absent) rather than failing the frame.
#[must_use]
pub fn decode_body(
    schema: &MessageSchema,
    body: &BTreeMap<u32, RawNode>,
) -> BTreeMap<&'static str, FieldValue> {
    let mut out = BTreeMap::new();
    for (order, node) in body {
        let Some(spec) = schema.field(*order) else {
            debug!(order, "unknown field order, ignoring");
            continue;
        };
        match decode_node(spec, node) {
            Some(v) => {
                out.insert(spec.name, v);
            }
            None => {
                debug!(field = spec.name, order, "field failed to decode, using default");
            }
        }
    }
    out
}

fn decode_node(spec: &FieldSpec, node: &RawNode) -> Option<FieldValue> {
    match (spec.ty, node) {
        (FieldType::Group, RawNode::List(items)) => Some(FieldValue::Group(items.clone())),
        (FieldType::Group, RawNode::Leaf(_)) => None,
        (_, RawNode::List(_)) => None,
        (ty, RawNode::Leaf(text)) => decode_leaf(ty, text),
    }
}

fn decode_leaf(ty: FieldType, text: &str) -> Option<FieldValue> {
    match ty {
        FieldType::Str | FieldType::Enum => Some(FieldValue::Str(text.to_owned())),
        FieldType::Int => text.parse::<i64>().ok().map(FieldValue::Int),
        FieldType::Float => text.parse::<f64>().ok().map(FieldValue::Float),
        FieldType::Bool => match text {
            "T" => Some(FieldValue::Bool(true)),
            "F" => Some(FieldValue::Bool(false)),
            _ => None,
        },
        FieldType::Timestamp => DateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .ok()
            .map(|dt| FieldValue::Timestamp(dt.with_timezone(&Utc))),
        FieldType::DelimitedList => Some(FieldValue::List(
            text.split(LIST_DELIMITER).map(str::to_owned).collect(),
        )),
        FieldType::Group => None,
    }
}

/// Render one field value as its wire text, per §4.1's rendering rules.
#[must_use]
pub fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Str(s) => s.clone(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Bool(b) => if *b { "T" } else { "F" }.to_owned(),
        FieldValue::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        FieldValue::List(items) => items.join(&LIST_DELIMITER.to_string()),
        FieldValue::Group(_) => String::new(),
    }
}

/// Encode an ordered set of `(order, value)` pairs into body text
/// (excluding the command head). Fields are expected in strictly
/// increasing order; absent fields must simply not appear in `fields`.
#[must_use]
pub fn encode_fields(fields: &[(u32, FieldValue)]) -> String {
    let mut out = String::new();
    for (order, value) in fields {
        out.push_str(&render_field(*order, &render_value(value)));
    }
    out
}

/// Field tables for the topic-message classes reachable through the
/// resolver in `topic.rs`. Orders here are a reconstruction for classes
/// not pinned down by a concrete §8 scenario (only `Event1`'s
/// `display_order` at order 1 is scenario-verified) — see `DESIGN.md`.
#[must_use]
pub fn schema_for_topic_class(class: &str) -> MessageSchema {
    const EVENT1: &[FieldSpec] = &[FieldSpec {
        order: 1,
        name: "display_order",
        ty: FieldType::Int,
        required: false,
    }];
    const M_EXCHANGE_INFO: &[FieldSpec] = &[FieldSpec {
        order: 23,
        name: "number_winning_places",
        ty: FieldType::Int,
        required: false,
    }];
    const LANGUAGE4: &[FieldSpec] = &[FieldSpec {
        order: 1,
        name: "name",
        ty: FieldType::Str,
        required: false,
    }];

    let fields: &'static [FieldSpec] = match class {
        "Event1" => EVENT1,
        "MExchangeInfo" => M_EXCHANGE_INFO,
        "Language4" => LANGUAGE4,
        _ => &[],
    };
    MessageSchema { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_fields_in_order_matches_invariant() {
        let fields = vec![
            (0u32, FieldValue::Int(1)),
            (1u32, FieldValue::Timestamp(
                DateTime::parse_from_rfc3339("2020-12-31T15:59:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            )),
        ];
        let body = encode_fields(&fields);
        assert_eq!(
            body,
            "0\u{2}1\u{1}1\u{2}2020-12-31T15:59:00.000000Z\u{1}"
        );
    }

    #[test]
    fn decode_delimited_list() {
        let schema = MessageSchema {
            fields: &[FieldSpec {
                order: 3,
                name: "subscription_ids",
                ty: FieldType::DelimitedList,
                required: false,
            }],
        };
        let mut body = BTreeMap::new();
        body.insert(3, RawNode::Leaf("2~3".to_owned()));
        let decoded = decode_body(&schema, &body);
        assert_eq!(
            decoded.get("subscription_ids").unwrap().as_list().unwrap(),
            &["2".to_owned(), "3".to_owned()]
        );
    }

    #[test]
    fn unknown_order_is_ignored_not_fatal() {
        let schema = MessageSchema { fields: &[] };
        let mut body = BTreeMap::new();
        body.insert(99, RawNode::Leaf("x".to_owned()));
        let decoded = decode_body(&schema, &body);
        assert!(decoded.is_empty());
    }

    #[test]
    #[should_panic(expected = "duplicate field order")]
    fn validate_catches_duplicate_orders() {
        let schema = MessageSchema {
            fields: &[
                FieldSpec { order: 1, name: "a", ty: FieldType::Int, required: false },
                FieldSpec { order: 1, name: "b", ty: FieldType::Int, required: false },
            ],
        };
        schema.validate();
    }
}
