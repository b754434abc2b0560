//! In-process property graph implementing [`GraphStore`].
//!
//! Used for local runs (optionally seeded from a JSON fixture) and as the
//! store behind the test suites. Transactions read an immutable snapshot
//! taken at `begin`, so concurrent writers never tear a running query.

use crate::query::{GraphQuery, QueryShape, DEPENDENCY_ALIAS, NODE_ALIAS};
use crate::store::{GraphStore, GraphTransaction};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use resgraph_core::{
    FieldValue, GraphNode, NodeId, Properties, PropertyValue, Record, ResGraphError, Result,
    RESOURCE_LABEL,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Relationship type given to fixture edges that do not name one.
pub const DEFAULT_RELATIONSHIP: &str = "DEPENDS_ON";

#[derive(Debug, Clone)]
struct MemoryEdge {
    from: NodeId,
    to: NodeId,
    rel_type: String,
}

#[derive(Debug, Clone, Default)]
struct MemoryGraph {
    nodes: BTreeMap<NodeId, GraphNode>,
    edges: Vec<MemoryEdge>,
    next_id: NodeId,
}

/// Counters of finished transactions.
#[derive(Debug, Default)]
pub struct TransactionStats {
    begun: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl TransactionStats {
    pub fn begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graph: RwLock<Arc<MemoryGraph>>,
    stats: Arc<TransactionStats>,
    fail_next: Mutex<Option<String>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON fixture on disk.
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: SeedGraph = serde_json::from_str(&raw)?;
        let store = Self::new();
        let keys = store.load_seed(&seed)?;
        info!(
            nodes = keys.len(),
            edges = seed.edges.len(),
            "Seeded in-memory graph from {:?}",
            path
        );
        Ok(store)
    }

    /// Create a node and return its store-assigned identity.
    pub fn create_node<L, S>(&self, labels: L, properties: Properties) -> NodeId
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut guard = self.graph.write();
        let graph = Arc::make_mut(&mut *guard);
        let id = graph.next_id;
        graph.next_id = id.next();
        graph.nodes.insert(
            id,
            GraphNode {
                id,
                labels: labels.into_iter().map(Into::into).collect(),
                properties,
            },
        );
        id
    }

    /// Create a `Resource` node.
    pub fn create_resource(&self, properties: Properties) -> NodeId {
        self.create_node([RESOURCE_LABEL], properties)
    }

    /// Create a directed relationship `from -> to`. Both ends must exist.
    pub fn create_edge(&self, from: NodeId, to: NodeId, rel_type: &str) -> Result<()> {
        let mut guard = self.graph.write();
        let graph = Arc::make_mut(&mut *guard);
        for end in [from, to] {
            if !graph.nodes.contains_key(&end) {
                return Err(ResGraphError::NodeNotFound(end.to_string()));
            }
        }
        graph.edges.push(MemoryEdge {
            from,
            to,
            rel_type: rel_type.to_string(),
        });
        Ok(())
    }

    /// Load a fixture. Returns the identity assigned to each fixture key.
    pub fn load_seed(&self, seed: &SeedGraph) -> Result<HashMap<String, NodeId>> {
        let mut keys = HashMap::with_capacity(seed.nodes.len());
        for node in &seed.nodes {
            if keys.contains_key(&node.key) {
                return Err(ResGraphError::InvalidOperation(format!(
                    "duplicate seed node key `{}`",
                    node.key
                )));
            }
            let id = self.create_node(node.labels.iter().cloned(), node.properties.clone());
            keys.insert(node.key.clone(), id);
        }
        for edge in &seed.edges {
            let resolve = |key: &str| {
                keys.get(key).copied().ok_or_else(|| {
                    ResGraphError::InvalidOperation(format!(
                        "seed edge references unknown node `{key}`"
                    ))
                })
            };
            self.create_edge(resolve(&edge.from)?, resolve(&edge.to)?, &edge.rel_type)?;
        }
        Ok(keys)
    }

    pub fn node_count(&self) -> usize {
        self.graph.read().nodes.len()
    }

    /// All relationships as `(from, to, type)`, in creation order.
    pub fn relationships(&self) -> Vec<(NodeId, NodeId, String)> {
        self.graph
            .read()
            .edges
            .iter()
            .map(|edge| (edge.from, edge.to, edge.rel_type.clone()))
            .collect()
    }

    pub fn stats(&self) -> &TransactionStats {
        &self.stats
    }

    /// Make the next transaction's first query fail with a database error.
    pub fn fail_next_query(&self, message: impl Into<String>) {
        *self.fail_next.lock() = Some(message.into());
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        self.stats.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryTransaction {
            snapshot: Arc::clone(&*self.graph.read()),
            stats: Arc::clone(&self.stats),
            pending_failure: self.fail_next.lock().take(),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTransaction {
    snapshot: Arc<MemoryGraph>,
    stats: Arc<TransactionStats>,
    pending_failure: Option<String>,
}

impl MemoryTransaction {
    fn node_record(node: &GraphNode) -> Record {
        Record::new().with_field(NODE_ALIAS, FieldValue::Node(node.clone()))
    }
}

#[async_trait]
impl GraphTransaction for MemoryTransaction {
    async fn execute(&mut self, query: &GraphQuery) -> Result<Vec<Record>> {
        if let Some(message) = self.pending_failure.take() {
            return Err(ResGraphError::Database(message));
        }

        let graph = &self.snapshot;
        let records = match query.shape() {
            QueryShape::MatchNodes { label, filter } => graph
                .nodes
                .values()
                .filter(|node| node.has_label(label) && filter.matches(&node.properties))
                .map(Self::node_record)
                .collect(),
            QueryShape::GetNode { label, id } => graph
                .nodes
                .get(id)
                .filter(|node| node.has_label(label))
                .map(Self::node_record)
                .into_iter()
                .collect(),
            QueryShape::Dependencies { id } => graph
                .edges
                .iter()
                .filter(|edge| edge.from == *id)
                .map(|edge| {
                    Record::new().with_field(
                        DEPENDENCY_ALIAS,
                        FieldValue::Scalar(PropertyValue::Integer(edge.to.get())),
                    )
                })
                .collect(),
        };
        Ok(records)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.stats.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.stats.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// JSON fixture format:
///
/// ```json
/// {
///   "nodes": [{"key": "db", "properties": {"name": "db"}}],
///   "edges": [{"from": "api", "to": "db", "type": "DEPENDS_ON"}]
/// }
/// ```
///
/// `labels` defaults to `["Resource"]` and `type` to `DEPENDS_ON`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SeedGraph {
    #[serde(default)]
    pub nodes: Vec<SeedNode>,
    #[serde(default)]
    pub edges: Vec<SeedEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedNode {
    pub key: String,
    #[serde(default = "SeedNode::default_labels")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl SeedNode {
    fn default_labels() -> Vec<String> {
        vec![RESOURCE_LABEL.to_string()]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type", default = "SeedEdge::default_rel_type")]
    pub rel_type: String,
}

impl SeedEdge {
    fn default_rel_type() -> String {
        DEFAULT_RELATIONSHIP.to_string()
    }
}
