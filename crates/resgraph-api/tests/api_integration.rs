use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use resgraph_api::{create_router, AppState, API_KEY_HEADER};
use resgraph_core::{NodeId, Properties, PropertyValue, Settings};
use resgraph_graph::{MemoryGraphStore, DEFAULT_RELATIONSHIP};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;

struct Graph {
    store: Arc<MemoryGraphStore>,
    db: NodeId,
    cache: NodeId,
}

fn props(pairs: &[(&str, &str)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), PropertyValue::from(*v)))
        .collect()
}

fn seeded() -> Graph {
    let store = Arc::new(MemoryGraphStore::new());
    let db = store.create_resource(props(&[("name", "db")]));
    let cache = store.create_resource(props(&[("name", "cache")]));
    store.create_edge(db, cache, DEFAULT_RELATIONSHIP).unwrap();
    Graph { store, db, cache }
}

fn open_settings() -> Settings {
    let mut settings = Settings::default();
    settings.security.require_auth = false;
    settings
}

fn server_for(store: Arc<MemoryGraphStore>, settings: &Settings) -> TestServer {
    let state = AppState::with_store(store, settings);
    TestServer::new(create_router(state)).unwrap()
}

fn open_server(graph: &Graph) -> TestServer {
    server_for(graph.store.clone(), &open_settings())
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let server = open_server(&seeded());

    let resp = server.get("/health").await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn lists_lookups_and_dependencies_end_to_end() {
    let graph = seeded();
    let server = open_server(&graph);

    let resp = server.get("/resources").await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(
        body,
        json!({"data": [
            {"id": graph.db.get(), "name": "db"},
            {"id": graph.cache.get(), "name": "cache"}
        ]})
    );

    let resp = server
        .get(&format!("/resources/{}/depends", graph.db))
        .await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(
        body,
        json!({"data": {"id": graph.db.get(), "name": "db", "depends": [graph.cache.get()]}})
    );

    let resp = server.get("/resources/999").await;
    assert_eq!(resp.status_code(), 200);
    assert_eq!(resp.json::<Value>(), json!({"data": []}));
}

#[tokio::test]
async fn show_returns_the_single_resource() {
    let graph = seeded();
    let server = open_server(&graph);

    let resp = server.get(&format!("/resources/{}", graph.cache)).await;
    assert_eq!(resp.status_code(), 200);
    assert_eq!(
        resp.json::<Value>(),
        json!({"data": {"id": graph.cache.get(), "name": "cache"}})
    );
}

#[tokio::test]
async fn query_string_filters_by_property() {
    let graph = seeded();
    let server = open_server(&graph);

    let resp = server.get("/resources").add_query_param("name", "db").await;
    assert_eq!(resp.status_code(), 200);
    assert_eq!(
        resp.json::<Value>(),
        json!({"data": [{"id": graph.db.get(), "name": "db"}]})
    );

    let resp = server.get("/resources?name=db&name=cache").await;
    assert_eq!(resp.json::<Value>(), json!({"data": []}));

    let resp = server
        .get("/resources")
        .add_query_param("name", "db' OR 1=1 //")
        .await;
    assert_eq!(resp.json::<Value>(), json!({"data": []}));
}

#[tokio::test]
async fn leaf_and_missing_dependencies() {
    let graph = seeded();
    let server = open_server(&graph);

    let resp = server
        .get(&format!("/resources/{}/depends", graph.cache))
        .await;
    assert_eq!(
        resp.json::<Value>(),
        json!({"data": {"id": graph.cache.get(), "name": "cache", "depends": []}})
    );

    let resp = server.get("/resources/4242/depends").await;
    assert_eq!(resp.status_code(), 200);
    assert_eq!(resp.json::<Value>(), json!({"data": []}));
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let server = open_server(&seeded());

    for path in [
        "/resources/abc",
        "/resources/-1",
        "/resources/+5",
        "/resources/%205",
        "/resources/1.5/depends",
    ] {
        let resp = server.get(path).expect_failure().await;
        assert_eq!(resp.status_code(), 400, "{path}");
        let body: Value = resp.json();
        assert_eq!(body["status"], 400);
    }
}

#[tokio::test]
async fn depends_keeps_properties_that_share_reserved_names() {
    let store = Arc::new(MemoryGraphStore::new());
    let app = store.create_resource(props(&[
        ("name", "app"),
        ("depends", "legacy"),
        ("properties.depends", "other"),
        ("id", "ext-17"),
    ]));
    let lib = store.create_resource(props(&[("name", "lib")]));
    store.create_edge(app, lib, DEFAULT_RELATIONSHIP).unwrap();
    let server = server_for(store, &open_settings());

    let resp = server.get(&format!("/resources/{app}/depends")).await;
    assert_eq!(resp.status_code(), 200);
    assert_eq!(
        resp.json::<Value>(),
        json!({"data": {
            "id": app.get(),
            "name": "app",
            "properties.depends": "other",
            "properties": {"depends": "legacy", "id": "ext-17"},
            "depends": [lib.get()]
        }})
    );

    let resp = server.get(&format!("/resources/{app}")).await;
    assert_eq!(
        resp.json::<Value>(),
        json!({"data": {
            "id": app.get(),
            "name": "app",
            "depends": "legacy",
            "properties.depends": "other",
            "properties": {"id": "ext-17"}
        }})
    );
}

#[tokio::test]
async fn store_failure_is_server_error_and_rolled_back() {
    let graph = seeded();
    let server = open_server(&graph);

    graph.store.fail_next_query("bolt connection reset");
    let resp = server.get("/resources").expect_failure().await;
    assert_eq!(resp.status_code(), 500);
    let body: Value = resp.json();
    assert_eq!(body["status"], 500);
    assert_eq!(graph.store.stats().rollbacks(), 1);

    let resp = server.get("/resources").await;
    assert_eq!(resp.status_code(), 200);
    assert_eq!(graph.store.stats().commits(), 1);
}

#[tokio::test]
async fn depends_runs_in_a_single_transaction() {
    let graph = seeded();
    let server = open_server(&graph);

    server
        .get(&format!("/resources/{}/depends", graph.db))
        .await
        .assert_status_ok();
    assert_eq!(graph.store.stats().begun(), 1);
    assert_eq!(graph.store.stats().commits(), 1);
}

fn basic_value(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Basic {token}")).unwrap()
}

fn secured_settings() -> Settings {
    let mut settings = Settings::default();
    settings.security.require_auth = true;
    settings.security.username = Some("admin".into());
    settings.secrets.password = Some(SecretString::from("s3cret".to_string()));
    settings.secrets.api_key = Some(SecretString::from("key-123".to_string()));
    settings
}

#[tokio::test]
async fn resources_require_credentials_when_enabled() {
    let graph = seeded();
    let server = server_for(graph.store.clone(), &secured_settings());

    let resp = server.get("/resources").expect_failure().await;
    assert_eq!(resp.status_code(), 401);
    assert_eq!(
        resp.headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok()),
        Some("Basic realm=\"resgraph\"")
    );

    let token = STANDARD.encode("admin:s3cret");
    server
        .get("/resources")
        .add_header(header::AUTHORIZATION, basic_value(&token))
        .await
        .assert_status_ok();

    server
        .get(&format!("/resources/{}", graph.db))
        .add_header(HeaderName::from_static(API_KEY_HEADER), HeaderValue::from_static("key-123"))
        .await
        .assert_status_ok();

    let wrong = STANDARD.encode("admin:nope");
    server
        .get("/resources")
        .add_header(header::AUTHORIZATION, basic_value(&wrong))
        .expect_failure()
        .await
        .assert_status_unauthorized();

    // Health stays public.
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = open_server(&seeded());

    let resp = server.get("/api-docs/openapi.json").await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert!(body["paths"]["/resources/{id}/depends"].is_object());
}

#[tokio::test]
async fn seeded_state_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed.json");
    std::fs::write(
        &seed,
        r#"{"nodes":[{"key":"db","properties":{"name":"db"}}]}"#,
    )
    .unwrap();

    let mut settings = open_settings();
    settings.database.memory.seed_path = Some(seed.to_string_lossy().into_owned());
    let config = Arc::new(resgraph_core::ConfigManager::from_settings(settings).unwrap());
    let state = AppState::new(config).await.unwrap();
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/resources").await;
    assert_eq!(resp.json::<Value>(), json!({"data": [{"id": 0, "name": "db"}]}));
}
