use axum::{http::StatusCode, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod pages;
pub mod prices;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    service::observability::encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: print pages, JSON API, ops endpoints
/// and static assets.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let static_dir = ServeDir::new(&state.render.static_dir);

    // Printable pages
    let pages = Router::new()
        .route("/", get(pages::index))
        .route("/prices/:category", get(pages::category));

    // JSON API
    let api = Router::new().route("/api/prices", get(prices::get_prices));

    // Ops
    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    // Compose
    pages
        .merge(api)
        .merge(ops)
        .nest_service("/static", static_dir)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request, with method and path, at INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx at ERROR
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
