use axum::{extract::State, http::header, response::IntoResponse, Json};

use crate::errors::ApiError;
use crate::state::AppState;

/// Caching happens in memory inside the service; clients must not cache.
const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

/// All categories with their items, in display order.
#[utoipa::path(
    get, path = "/api/prices", tag = "prices",
    responses(
        (status = 200, description = "Category name to ordered price items", body = crate::openapi::PriceListDoc),
        (status = 500, description = "Spreadsheet unavailable or misconfigured", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn get_prices(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let prices = state.cache.get_prices().await?;
    Ok((NO_CACHE, Json(prices)))
}
