//! Conversion of store records into JSON-ready documents.
//!
//! Row merge policy:
//! - the first node-valued field is flattened into the row: `id` first, then
//!   the node's properties in store order;
//! - any further node-valued field is nested, flattened the same way, under
//!   its alias;
//! - scalar fields are kept under their alias.
//!
//! The identity always lives under [`IDENTITY_KEY`]. Reserved top-level keys
//! are never taken by data of another kind:
//! - a node property whose name is reserved is kept, under its own name,
//!   inside the nested [`SHADOWED_PROPERTIES_KEY`] object;
//! - a field whose alias is reserved or already present in the row is kept,
//!   under its alias, inside the nested [`SHADOWED_FIELDS_KEY`] object.
//!
//! Both shadow keys are themselves reserved, so no value is ever overwritten.

use resgraph_core::{FieldValue, GraphNode, Record};
use serde_json::{Map, Value};

pub const IDENTITY_KEY: &str = "id";
/// Holds node properties whose names are reserved at the top level.
pub const SHADOWED_PROPERTIES_KEY: &str = "properties";
/// Holds fields whose aliases collide with keys already in the row.
pub const SHADOWED_FIELDS_KEY: &str = "fields";

/// Ordered JSON object for one row.
pub type Document = Map<String, Value>;

pub fn parse_records(records: &[Record]) -> Vec<Document> {
    records.iter().map(parse_record).collect()
}

pub fn parse_record(record: &Record) -> Document {
    parse_record_reserving(record, &[])
}

/// Like [`parse_record`], additionally keeping the top-level `reserved` keys
/// free for the caller to fill in.
pub fn parse_record_reserving(record: &Record, reserved: &[&str]) -> Document {
    let is_reserved = |key: &str| {
        key == IDENTITY_KEY
            || key == SHADOWED_PROPERTIES_KEY
            || key == SHADOWED_FIELDS_KEY
            || reserved.iter().any(|r| *r == key)
    };
    let mut doc = Document::new();

    let primary = record
        .fields()
        .iter()
        .position(|(_, value)| matches!(value, FieldValue::Node(_)));
    if let Some((_, FieldValue::Node(node))) = primary.map(|i| &record.fields()[i]) {
        flatten_node(node, &mut doc, &is_reserved);
    }

    let mut shadowed = Document::new();
    for (i, (alias, value)) in record.fields().iter().enumerate() {
        if Some(i) == primary {
            continue;
        }
        let value = match value {
            FieldValue::Node(node) => Value::Object(node_document(node)),
            FieldValue::Scalar(scalar) => scalar.clone().into(),
        };
        if is_reserved(alias.as_str()) || doc.contains_key(alias) {
            shadowed.insert(alias.clone(), value);
        } else {
            doc.insert(alias.clone(), value);
        }
    }
    if !shadowed.is_empty() {
        doc.insert(SHADOWED_FIELDS_KEY.to_string(), Value::Object(shadowed));
    }

    doc
}

/// Flatten `node` into a document of its own.
pub fn node_document(node: &GraphNode) -> Document {
    let mut doc = Document::new();
    flatten_node(node, &mut doc, &|key| {
        key == IDENTITY_KEY || key == SHADOWED_PROPERTIES_KEY
    });
    doc
}

fn flatten_node(node: &GraphNode, doc: &mut Document, is_reserved: &dyn Fn(&str) -> bool) {
    doc.insert(IDENTITY_KEY.to_string(), Value::from(node.id.get()));
    let mut shadowed = Document::new();
    for (key, value) in &node.properties {
        if is_reserved(key.as_str()) {
            shadowed.insert(key.clone(), value.clone().into());
        } else {
            doc.insert(key.clone(), value.clone().into());
        }
    }
    if !shadowed.is_empty() {
        doc.insert(SHADOWED_PROPERTIES_KEY.to_string(), Value::Object(shadowed));
    }
}
