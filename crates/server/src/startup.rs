use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, LayoutConfig, ServerConfig};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::{
    pagination::PageLayout,
    sheets::{GoogleSheetsClient, PriceSource},
    storage::snapshot::SnapshotWriter,
    PriceCache,
};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

pub fn page_layout(cfg: &LayoutConfig) -> PageLayout {
    PageLayout {
        page_height: cfg.page_height,
        margin: cfg.margin,
        header_height: cfg.header_height,
        footer_height: cfg.footer_height,
        row_height: cfg.row_height,
    }
}

fn load_bind_addr(cfg: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.host, cfg.port).parse()?)
}

/// Wire the price cache around `source` according to `cfg`.
pub fn build_state_with_source(cfg: &AppConfig, source: Arc<dyn PriceSource>) -> AppState {
    let mut cache = PriceCache::new(source, cfg.sheets.categories.clone(), cfg.cache.ttl());
    if cfg.snapshot.enabled {
        cache = cache.with_snapshot(SnapshotWriter::new(&cfg.snapshot.path));
    }
    AppState {
        cache: Arc::new(cache),
        layout: page_layout(&cfg.layout),
        render: Arc::new(cfg.render.clone()),
    }
}

/// State backed by the Google Sheets client. Credentials are read from the
/// environment here but only parsed on first fetch.
pub fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let credentials = std::env::var(&cfg.sheets.credentials_env).ok();
    if credentials.is_none() {
        warn!(
            env = %cfg.sheets.credentials_env,
            "spreadsheet credentials not set; price requests will fail until provided"
        );
    }
    let client = GoogleSheetsClient::new(
        &cfg.sheets.api_base,
        &cfg.sheets.spreadsheet_id,
        credentials,
        cfg.sheets.connect_timeout(),
    )
    .map_err(|e| StartupError::Runtime(e.to_string()))?;
    Ok(build_state_with_source(cfg, Arc::new(client)))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let snapshot_path = cfg.snapshot.enabled.then_some(cfg.snapshot.path.as_str());
    common::env::ensure_env(&cfg.render.static_dir, snapshot_path).await?;

    let state = build_state(&cfg)?;
    info!(
        categories = cfg.sheets.categories.len(),
        ttl_ms = cfg.cache.ttl_ms,
        items_per_page = state.layout.items_per_page(),
        "price cache configured"
    );

    let app: Router = routes::build_router(state, build_cors());

    let addr = load_bind_addr(&cfg.server)?;
    info!(%addr, "starting price list server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
