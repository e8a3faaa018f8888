//! Environment/runtime helpers
//!
//! Sanity checks run once at startup, before the router is built.

use std::path::Path;

use tracing::warn;

/// Warn when the static assets directory is missing and make sure the
/// snapshot directory can be created. Neither condition is fatal: the logo
/// would 404 and snapshot writes are best effort anyway.
pub async fn ensure_env(static_dir: &str, snapshot_path: Option<&str>) -> anyhow::Result<()> {
    if tokio::fs::metadata(static_dir).await.is_err() {
        warn!(%static_dir, "static assets directory not found; logo may 404");
    }
    if let Some(parent) = snapshot_path.and_then(|p| Path::new(p).parent()) {
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            warn!(dir = %parent.display(), error = %e, "cannot create snapshot directory; snapshots will be skipped");
        }
    }
    Ok(())
}
