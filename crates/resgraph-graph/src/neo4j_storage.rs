use crate::query::{ColumnKind, GraphQuery, QueryParam, ReturnColumn};
use crate::store::{GraphStore, GraphTransaction};
use async_trait::async_trait;
use neo4rs::{query, BoltType, ConfigBuilder, Graph, Node, Row, Txn};
use resgraph_core::{
    FieldValue, GraphNode, Neo4jConfig, NodeId, Properties, PropertyValue, Record, ResGraphError,
    Result,
};
use tracing::{debug, info};

/// Neo4j storage over a pooled Bolt connection.
#[derive(Clone)]
pub struct Neo4jStorage {
    graph: Graph,
}

impl Neo4jStorage {
    pub async fn connect(config: &Neo4jConfig, password: &str) -> Result<Self> {
        info!(
            "Initializing Neo4j storage with connection: {} (database: {})",
            config.uri, config.database
        );

        let bolt_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| ResGraphError::Config(format!("Invalid Neo4j configuration: {}", e)))?;

        let graph = Graph::connect(bolt_config)
            .await
            .map_err(|e| ResGraphError::Database(format!("Failed to connect: {}", e)))?;

        info!("Neo4j storage initialized successfully");
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphStore for Neo4jStorage {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        let txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| ResGraphError::Database(format!("Failed to start transaction: {}", e)))?;
        Ok(Box::new(Neo4jTransaction { txn }))
    }

    fn backend_name(&self) -> &'static str {
        "neo4j"
    }
}

struct Neo4jTransaction {
    txn: Txn,
}

#[async_trait]
impl GraphTransaction for Neo4jTransaction {
    async fn execute(&mut self, graph_query: &GraphQuery) -> Result<Vec<Record>> {
        let mut bolt_query = query(graph_query.cypher());
        for (name, param) in graph_query.params() {
            bolt_query = match param {
                QueryParam::Int(value) => bolt_query.param(name, *value),
                QueryParam::Str(value) => bolt_query.param(name, value.as_str()),
            };
        }
        debug!(cypher = graph_query.cypher(), "executing query");

        let mut stream = self
            .txn
            .execute(bolt_query)
            .await
            .map_err(|e| ResGraphError::Query(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(row) = stream
            .next(self.txn.handle())
            .await
            .map_err(|e| ResGraphError::Query(e.to_string()))?
        {
            records.push(decode_row(&row, graph_query.columns())?);
        }
        Ok(records)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.txn
            .commit()
            .await
            .map_err(|e| ResGraphError::Database(format!("Commit failed: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.txn
            .rollback()
            .await
            .map_err(|e| ResGraphError::Database(format!("Rollback failed: {}", e)))
    }
}

fn decode_row(row: &Row, columns: &[ReturnColumn]) -> Result<Record> {
    let mut record = Record::new();
    for column in columns {
        let value = match column.kind {
            ColumnKind::Node => {
                let node: Node = row.get(column.alias).map_err(|e| {
                    ResGraphError::Decode(format!("column `{}`: {}", column.alias, e))
                })?;
                FieldValue::Node(decode_node(&node)?)
            }
            ColumnKind::Integer => {
                let raw: i64 = row.get(column.alias).map_err(|e| {
                    ResGraphError::Decode(format!("column `{}`: {}", column.alias, e))
                })?;
                FieldValue::Scalar(PropertyValue::Integer(raw))
            }
        };
        record.push(column.alias, value);
    }
    Ok(record)
}

fn decode_node(node: &Node) -> Result<GraphNode> {
    let id = NodeId::try_from(node.id())?;

    // Bolt maps are unordered; sort for stable output.
    let mut keys = node.keys();
    keys.sort_unstable();

    let mut properties = Properties::with_capacity(keys.len());
    for key in keys {
        let value: BoltType = node
            .get(key)
            .map_err(|e| ResGraphError::Decode(format!("property `{}`: {}", key, e)))?;
        properties.insert(key.to_string(), decode_value(value));
    }

    Ok(GraphNode {
        id,
        labels: node.labels().into_iter().map(str::to_string).collect(),
        properties,
    })
}

fn decode_value(value: BoltType) -> PropertyValue {
    match value {
        BoltType::Null(_) => PropertyValue::Null,
        BoltType::Boolean(b) => PropertyValue::Bool(b.value),
        BoltType::Integer(i) => PropertyValue::Integer(i.value),
        BoltType::Float(f) => PropertyValue::Float(f.value),
        BoltType::String(s) => PropertyValue::String(s.value),
        BoltType::List(list) => {
            PropertyValue::List(list.value.into_iter().map(decode_value).collect())
        }
        // Temporal and spatial values have no scalar JSON form; keep their debug rendering.
        other => PropertyValue::String(format!("{:?}", other)),
    }
}
