use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};
use tracing::{error, warn};

use crate::errors::PageError;
use crate::render::{PriceListView, LOAD_ERROR, NOT_FOUND};
use crate::state::AppState;

/// Selector with the first category opened.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    render(&state, None).await
}

/// Selector with the named category opened.
pub async fn category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Html<String>, PageError> {
    render(&state, Some(category)).await
}

async fn render(state: &AppState, requested: Option<String>) -> Result<Html<String>, PageError> {
    let view = PriceListView::new(&state.render, state.layout);

    let data = state.cache.get_prices().await.map_err(|e| {
        error!(code = e.code(), error = %e, "error loading prices for page");
        PageError { status: StatusCode::INTERNAL_SERVER_ERROR, html: view.error_document(LOAD_ERROR) }
    })?;

    let selected = match requested {
        Some(name) if data.get(&name).is_some() => Some(name),
        Some(name) => {
            warn!(category = %name, "unknown price list category");
            return Err(PageError { status: StatusCode::NOT_FOUND, html: view.error_document(NOT_FOUND) });
        }
        None => data.first().map(|(name, _)| name.to_string()),
    };

    Ok(Html(view.document(&data, selected.as_deref())))
}
