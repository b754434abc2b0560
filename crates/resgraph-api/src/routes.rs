use crate::{auth::auth_middleware, rest::handlers, AppState};
use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

#[cfg(not(feature = "openapi-ui"))]
use crate::rest::ApiDoc;
#[cfg(not(feature = "openapi-ui"))]
use axum::Json;
#[cfg(not(feature = "openapi-ui"))]
use utoipa::OpenApi;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

pub fn create_router(state: AppState) -> Router {
    let resources = Router::new()
        .route("/resources", get(handlers::list_resources))
        .route("/resources/{id}", get(handlers::show_resource))
        .route("/resources/{id}/depends", get(handlers::resource_dependencies))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health))
        .merge(resources);

    // API documentation
    #[cfg(feature = "openapi-ui")]
    let router = {
        use crate::rest::ApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router.merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
    };
    #[cfg(not(feature = "openapi-ui"))]
    let router = router.route(OPENAPI_JSON_PATH, get(openapi_json));

    let cors = cors_layer(&state.allowed_origins);

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

#[cfg(not(feature = "openapi-ui"))]
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Any origin when none are configured.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
