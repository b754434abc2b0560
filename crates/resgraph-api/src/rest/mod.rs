pub mod handlers;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_resources,
        handlers::show_resource,
        handlers::resource_dependencies,
        handlers::health,
    ),
    components(
        schemas(
            handlers::DataResponse,
            handlers::HealthResponse,
        )
    ),
    tags(
        (name = "resources", description = "Resource dependency graph"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;
