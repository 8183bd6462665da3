use crate::state::AppState;
use crate::{api, logging};
use axum::middleware;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "floodwatch API",
        description = "Composite flood and cholera risk scoring REST API",
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Regions", description = "Administrative region registry"),
        (name = "Observations", description = "Environmental and case-report ingestion"),
        (name = "RiskScores", description = "Score queries and recompute"),
        (name = "Alerts", description = "Alerts, lifecycle, and rule management")
    )
)]
struct ApiDoc;

pub fn build_http_app(state: AppState) -> Router {
    let (router, api_spec) = api::api_routes().split_for_parts();

    let mut merged_spec = ApiDoc::openapi();
    merged_spec.merge(api_spec);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/v1/openapi.json", merged_spec))
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging))
}
