use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use resgraph_core::{NodeId, Record, Result as GraphResult, RESOURCE_LABEL};
use resgraph_graph::{
    build_equality_filter, dependency_ids, parse_record, parse_record_reserving, parse_records,
    query, Document, GraphTransaction,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Key under which `/depends` lists dependency identities.
pub const DEPENDS_KEY: &str = "depends";

/// Envelope of every resource response. `data` is a list of resources, a
/// single resource, or `[]` when nothing matched.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse {
    #[schema(value_type = Object)]
    pub data: Value,
}

impl DataResponse {
    fn empty() -> Self {
        Self {
            data: Value::Array(Vec::new()),
        }
    }

    fn list(docs: Vec<Document>) -> Self {
        Self {
            data: Value::Array(docs.into_iter().map(Value::Object).collect()),
        }
    }

    fn one(doc: Document) -> Self {
        Self {
            data: Value::Object(doc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub version: String,
}

fn parse_id(raw: &str) -> ApiResult<NodeId> {
    raw.parse::<NodeId>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid resource id: {raw}")))
}

// -------- Resources --------

/// List resources. Every query-string pair `key=value` becomes an equality
/// constraint on the resource property `key`; repeated keys all apply.
#[utoipa::path(
    get,
    path = "/resources",
    tag = "resources",
    responses(
        (status = 200, description = "Matching resources", body = DataResponse),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 500, description = "Graph store failure")
    )
)]
pub async fn list_resources(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<DataResponse>> {
    let filter = build_equality_filter(pairs);
    let records = state
        .session
        .run(move |tx| {
            Box::pin(async move { query::match_nodes(tx, RESOURCE_LABEL, &filter).await })
        })
        .await?;

    Ok(Json(DataResponse::list(parse_records(&records))))
}

/// Get a resource by its graph identity
#[utoipa::path(
    get,
    path = "/resources/{id}",
    tag = "resources",
    params(
        ("id" = i64, Path, description = "Non-negative node identity")
    ),
    responses(
        (status = 200, description = "The resource, or an empty list when absent", body = DataResponse),
        (status = 400, description = "Invalid ID format"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 500, description = "Graph store failure")
    )
)]
pub async fn show_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse>> {
    let id = parse_id(&id)?;
    let records = state
        .session
        .run(move |tx| Box::pin(async move { query::get_node(tx, RESOURCE_LABEL, id).await }))
        .await?;

    Ok(Json(match records.first() {
        Some(record) => DataResponse::one(parse_record(record)),
        None => DataResponse::empty(),
    }))
}

/// Get a resource together with the identities of its direct dependencies
#[utoipa::path(
    get,
    path = "/resources/{id}/depends",
    tag = "resources",
    params(
        ("id" = i64, Path, description = "Non-negative node identity")
    ),
    responses(
        (status = 200, description = "The resource with a `depends` list, or an empty list when absent", body = DataResponse),
        (status = 400, description = "Invalid ID format"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 500, description = "Graph store failure")
    )
)]
pub async fn resource_dependencies(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse>> {
    let id = parse_id(&id)?;
    let found = state
        .session
        .run(move |tx| Box::pin(async move { node_with_dependencies(tx, id).await }))
        .await?;

    let Some((node, dependencies)) = found else {
        return Ok(Json(DataResponse::empty()));
    };

    let mut doc = parse_record_reserving(&node, &[DEPENDS_KEY]);
    let ids = dependency_ids(&dependencies)?;
    doc.insert(
        DEPENDS_KEY.to_string(),
        Value::Array(ids.into_iter().map(|id| Value::from(id.get())).collect()),
    );

    Ok(Json(DataResponse::one(doc)))
}

/// Both lookups share the caller's transaction. `None` when the node is absent.
async fn node_with_dependencies(
    tx: &mut dyn GraphTransaction,
    id: NodeId,
) -> GraphResult<Option<(Record, Vec<Record>)>> {
    let mut nodes = query::get_node(&mut *tx, RESOURCE_LABEL, id).await?;
    if nodes.is_empty() {
        return Ok(None);
    }
    let node = nodes.swap_remove(0);
    let dependencies = query::get_dependencies(tx, id).await?;
    Ok(Some((node, dependencies)))
}

// -------- Health --------

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        backend: state.backend_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
