//! The three query shapes the REST layer issues, and the functions that run
//! them inside a caller-provided transaction.

use crate::filter::NodeFilter;
use crate::store::GraphTransaction;
use resgraph_core::{FieldValue, NodeId, PropertyValue, Record, ResGraphError, Result};

/// Node variable used by every query that returns nodes.
pub const NODE_ALIAS: &str = "r";
/// Column carrying the target identity of a dependency edge.
pub const DEPENDENCY_ALIAS: &str = "dependency_id";

/// A value bound to a `$name` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Node,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnColumn {
    pub alias: &'static str,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryShape {
    /// All nodes with `label` satisfying `filter`.
    MatchNodes { label: String, filter: NodeFilter },
    /// The node with `label` and store identity `id`.
    GetNode { label: String, id: NodeId },
    /// Targets of the outgoing relationships of node `id`.
    Dependencies { id: NodeId },
}

/// A query in both structured and Cypher form. Backends that speak Cypher use
/// [`GraphQuery::cypher`] and [`GraphQuery::params`]; others evaluate
/// [`GraphQuery::shape`] directly.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    shape: QueryShape,
    cypher: String,
    params: Vec<(String, QueryParam)>,
    columns: Vec<ReturnColumn>,
}

impl GraphQuery {
    pub fn match_nodes(label: &str, filter: NodeFilter) -> Self {
        let rendered = filter.render(NODE_ALIAS);
        let mut cypher = format!("MATCH ({}:{})", NODE_ALIAS, quote_identifier(label));
        if !rendered.clause.is_empty() {
            cypher.push(' ');
            cypher.push_str(&rendered.clause);
        }
        cypher.push_str(&format!(" RETURN {NODE_ALIAS}"));

        Self {
            shape: QueryShape::MatchNodes {
                label: label.to_string(),
                filter,
            },
            cypher,
            params: rendered.params,
            columns: vec![ReturnColumn {
                alias: NODE_ALIAS,
                kind: ColumnKind::Node,
            }],
        }
    }

    pub fn get_node(label: &str, id: NodeId) -> Self {
        Self {
            shape: QueryShape::GetNode {
                label: label.to_string(),
                id,
            },
            cypher: format!(
                "MATCH ({a}:{l}) WHERE id({a}) = $id RETURN {a}",
                a = NODE_ALIAS,
                l = quote_identifier(label)
            ),
            params: vec![("id".to_string(), QueryParam::Int(id.get()))],
            columns: vec![ReturnColumn {
                alias: NODE_ALIAS,
                kind: ColumnKind::Node,
            }],
        }
    }

    pub fn dependencies(id: NodeId) -> Self {
        Self {
            shape: QueryShape::Dependencies { id },
            cypher: format!("MATCH (n)-->(d) WHERE id(n) = $id RETURN id(d) AS {DEPENDENCY_ALIAS}"),
            params: vec![("id".to_string(), QueryParam::Int(id.get()))],
            columns: vec![ReturnColumn {
                alias: DEPENDENCY_ALIAS,
                kind: ColumnKind::Integer,
            }],
        }
    }

    pub fn shape(&self) -> &QueryShape {
        &self.shape
    }

    pub fn cypher(&self) -> &str {
        &self.cypher
    }

    pub fn params(&self) -> &[(String, QueryParam)] {
        &self.params
    }

    pub fn columns(&self) -> &[ReturnColumn] {
        &self.columns
    }
}

/// Backtick-quote a label or property name, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// All nodes labelled `label` that satisfy `filter`. Order is store-defined.
pub async fn match_nodes(
    tx: &mut dyn GraphTransaction,
    label: &str,
    filter: &NodeFilter,
) -> Result<Vec<Record>> {
    tx.execute(&GraphQuery::match_nodes(label, filter.clone()))
        .await
}

/// The node with identity `id`, or no records when it does not exist.
pub async fn get_node(
    tx: &mut dyn GraphTransaction,
    label: &str,
    id: NodeId,
) -> Result<Vec<Record>> {
    tx.execute(&GraphQuery::get_node(label, id)).await
}

/// One record per outgoing dependency edge of `id`. A missing node and a node
/// without dependencies both yield no records.
pub async fn get_dependencies(tx: &mut dyn GraphTransaction, id: NodeId) -> Result<Vec<Record>> {
    tx.execute(&GraphQuery::dependencies(id)).await
}

/// Flatten dependency records into target identities.
pub fn dependency_ids(records: &[Record]) -> Result<Vec<NodeId>> {
    records
        .iter()
        .map(|record| match record.get(DEPENDENCY_ALIAS) {
            Some(FieldValue::Scalar(PropertyValue::Integer(raw))) => NodeId::new(*raw)
                .ok_or_else(|| {
                    ResGraphError::Decode(format!("store returned negative node id {raw}"))
                }),
            Some(FieldValue::Node(node)) => Ok(node.id),
            other => Err(ResGraphError::Decode(format!(
                "expected integer `{DEPENDENCY_ALIAS}` column, got {other:?}"
            ))),
        })
        .collect()
}
