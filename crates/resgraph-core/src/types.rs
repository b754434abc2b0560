use crate::{ResGraphError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label carried by every node the REST surface exposes.
pub const RESOURCE_LABEL: &str = "Resource";

/// Store-assigned node identity. Always non-negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct NodeId(i64);

impl NodeId {
    pub fn new(raw: i64) -> Option<Self> {
        (raw >= 0).then_some(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// The identity following this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl TryFrom<i64> for NodeId {
    type Error = ResGraphError;

    fn try_from(raw: i64) -> Result<Self> {
        Self::new(raw).ok_or_else(|| {
            ResGraphError::InvalidOperation(format!("node id must be non-negative, got {raw}"))
        })
    }
}

impl From<NodeId> for i64 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl FromStr for NodeId {
    type Err = ResGraphError;

    /// Only plain decimal digits are accepted: no sign, no padding.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ResGraphError::InvalidOperation(format!("invalid node id: {s:?}"));
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let raw: i64 = s.parse().map_err(|_| invalid())?;
        Self::try_from(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A schemaless property value as stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<PropertyValue> for serde_json::Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(b) => serde_json::Value::Bool(b),
            PropertyValue::Integer(i) => serde_json::Value::from(i),
            // Non-finite floats have no JSON form.
            PropertyValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::String(s) => serde_json::Value::String(s),
            PropertyValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
        }
    }
}

/// Insertion-ordered property map of a node.
pub type Properties = IndexMap<String, PropertyValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl GraphNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            labels: Vec::new(),
            properties: Properties::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Value bound to one alias of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Node(GraphNode),
    Scalar(PropertyValue),
}

/// One row returned by the graph store: aliases in RETURN order. Aliases are
/// unique within a row, as Cypher result columns are.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, alias: impl Into<String>, value: FieldValue) -> Self {
        self.push(alias, value);
        self
    }

    pub fn push(&mut self, alias: impl Into<String>, value: FieldValue) {
        self.fields.push((alias.into(), value));
    }

    pub fn get(&self, alias: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_rejects_negative_and_garbage() {
        assert!("-1".parse::<NodeId>().is_err());
        assert!("abc".parse::<NodeId>().is_err());
        assert!("1.5".parse::<NodeId>().is_err());
        assert_eq!("42".parse::<NodeId>().unwrap().get(), 42);
        assert_eq!("007".parse::<NodeId>().unwrap().get(), 7);
        for raw in ["", "+5", " 5", "5 ", "\t5", "٣", "99999999999999999999"] {
            assert!(raw.parse::<NodeId>().is_err(), "{raw:?}");
        }
        assert!(serde_json::from_str::<NodeId>("-3").is_err());
    }

    #[test]
    fn property_values_deserialize_to_natural_variants() {
        let raw = r#"{"name":"db","port":5432,"load":0.5,"up":true,"tags":["a"],"x":null}"#;
        let props: Properties = serde_json::from_str(raw).unwrap();
        assert_eq!(props["name"], PropertyValue::String("db".into()));
        assert_eq!(props["port"], PropertyValue::Integer(5432));
        assert_eq!(props["load"], PropertyValue::Float(0.5));
        assert_eq!(props["up"], PropertyValue::Bool(true));
        assert_eq!(
            props["tags"],
            PropertyValue::List(vec![PropertyValue::String("a".into())])
        );
        assert_eq!(props["x"], PropertyValue::Null);
        let keys: Vec<_> = props.keys().cloned().collect();
        assert_eq!(keys, ["name", "port", "load", "up", "tags", "x"]);
    }

    #[test]
    fn non_finite_float_becomes_json_null() {
        let v: serde_json::Value = PropertyValue::Float(f64::NAN).into();
        assert!(v.is_null());
    }

    #[test]
    fn record_lookup_by_alias() {
        let record = Record::new()
            .with_field("n", FieldValue::Scalar(PropertyValue::Integer(1)))
            .with_field("m", FieldValue::Scalar(PropertyValue::Integer(2)));
        assert_eq!(record.len(), 2);
        assert_eq!(
            record.get("m"),
            Some(&FieldValue::Scalar(PropertyValue::Integer(2)))
        );
        assert!(record.get("missing").is_none());
    }
}
