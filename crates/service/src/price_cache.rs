//! Time-boxed cache in front of the spreadsheet fetch.
//!
//! One un-keyed slot holds the whole dataset. A filled slot younger than the
//! TTL is FRESH and served as is; otherwise the next caller refreshes it.
//! Refreshes are single-flight: concurrent callers that find the slot stale
//! queue behind the in-flight fetch and reuse its outcome, error included.
//! The JSON snapshot is written in the background after a successful fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use models::PriceCategory;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::errors::PriceError;
use crate::observability::{
    CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL, REFRESH_DURATION, SNAPSHOT_ERRORS_TOTAL, UPSTREAM_ERRORS_TOTAL,
};
use crate::sheets::PriceSource;
use crate::storage::snapshot::SnapshotWriter;

/// An immutable snapshot and the instant it was fetched.
#[derive(Debug)]
pub struct CacheEntry {
    pub data: Arc<PriceCategory>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    categories: Vec<String>,
    ttl: Duration,
    slot: ArcSwapOption<CacheEntry>,
    /// Outcome of the last completed refresh, guarded for single flight.
    refresh: Mutex<Option<Result<Arc<PriceCategory>, PriceError>>>,
    /// Bumped each time a refresh completes.
    generation: AtomicU64,
    snapshot: Option<SnapshotWriter>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>, categories: Vec<String>, ttl: Duration) -> Self {
        Self {
            source,
            categories,
            ttl,
            slot: ArcSwapOption::empty(),
            refresh: Mutex::new(None),
            generation: AtomicU64::new(0),
            snapshot: None,
        }
    }

    /// Write a JSON backup after every successful refresh.
    pub fn with_snapshot(mut self, writer: SnapshotWriter) -> Self {
        self.snapshot = Some(writer);
        self
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the next `get_prices` would be served without a fetch.
    pub fn is_fresh(&self) -> bool {
        self.fresh().is_some()
    }

    /// Full category mapping, fetched at most once per TTL window.
    pub async fn get_prices(&self) -> Result<Arc<PriceCategory>, PriceError> {
        if let Some(data) = self.fresh() {
            CACHE_HITS_TOTAL.inc();
            debug!(event = "cache_hit", "returning cached prices");
            return Ok(data);
        }

        let seen = self.generation.load(Ordering::Acquire);
        let mut last = self.refresh.lock().await;
        // a refresh finished while we waited for the guard: share its outcome
        if self.generation.load(Ordering::Acquire) != seen {
            if let Some(outcome) = last.as_ref() {
                debug!(event = "refresh_shared", ok = outcome.is_ok(), "reusing outcome of a concurrent refresh");
                return outcome.clone();
            }
        }
        if let Some(data) = self.fresh() {
            CACHE_HITS_TOTAL.inc();
            return Ok(data);
        }

        CACHE_MISSES_TOTAL.inc();
        let outcome = self.refresh_locked().await;
        *last = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::Release);
        outcome
    }

    fn fresh(&self) -> Option<Arc<PriceCategory>> {
        let entry = self.slot.load_full()?;
        entry.is_fresh(self.ttl).then(|| Arc::clone(&entry.data))
    }

    async fn refresh_locked(&self) -> Result<Arc<PriceCategory>, PriceError> {
        let started = Instant::now();
        info!(event = "refresh_start", categories = self.categories.len(), "fetching fresh prices");

        let data = match self.source.fetch_categories(&self.categories).await {
            Ok(data) => Arc::new(data),
            Err(e) => {
                UPSTREAM_ERRORS_TOTAL.inc();
                error!(event = "refresh_failed", code = e.code(), error = %e, "error fetching prices");
                return Err(e);
            }
        };

        self.slot.store(Some(Arc::new(CacheEntry { data: Arc::clone(&data), fetched_at: Instant::now() })));
        let elapsed = started.elapsed();
        REFRESH_DURATION.observe(elapsed.as_secs_f64());
        info!(
            event = "refresh_done",
            elapsed_ms = elapsed.as_millis() as u64,
            categories = data.len(),
            "fetched fresh prices"
        );

        if let Some(writer) = self.snapshot.clone() {
            let data = Arc::clone(&data);
            tokio::spawn(async move {
                match writer.write(&data).await {
                    Ok(()) => debug!(path = %writer.path().display(), "updated price snapshot"),
                    Err(e) => {
                        SNAPSHOT_ERRORS_TOTAL.inc();
                        warn!(path = %writer.path().display(), error = %e, "could not update price snapshot (read-only storage?)");
                    }
                }
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::mock::MockPriceSource;
    use models::PriceItem;
    use serde_json::json;

    fn sample(price: &str) -> PriceCategory {
        let mut cats = PriceCategory::new();
        cats.insert("Маникюр", vec![PriceItem::from_row(&[json!("Маникюр"), json!(price)])]);
        cats.insert("Педикюр", vec![]);
        cats
    }

    async fn wait_for_file(path: &std::path::Path) -> std::io::Result<String> {
        for _ in 0..100 {
            if let Ok(text) = tokio::fs::read_to_string(path).await {
                return Ok(text);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::fs::read_to_string(path).await
    }

    fn cache(source: &Arc<MockPriceSource>, ttl_ms: u64) -> PriceCache {
        let source: Arc<dyn PriceSource> = source.clone();
        PriceCache::new(source, vec!["Маникюр".into(), "Педикюр".into()], Duration::from_millis(ttl_ms))
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_within_ttl_hits_cache() {
        let source = Arc::new(MockPriceSource::with_data(sample("1500")));
        let cache = cache(&source, 1000);

        let first = cache.get_prices().await.unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        let second = cache.get_prices().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_fresh());
    }

    #[tokio::test(start_paused = true)]
    async fn call_after_ttl_refreshes_exactly_once() {
        let source = Arc::new(MockPriceSource::with_data(sample("1500")));
        let cache = cache(&source, 1000);

        let first = cache.get_prices().await.unwrap();
        source.set_data(sample("1700"));
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(!cache.is_fresh());

        let second = cache.get_prices().await.unwrap();
        let third = cache.get_prices().await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(second, third);
        assert_ne!(first, second);
        // the earlier snapshot is untouched
        assert_eq!(first.get("Маникюр").unwrap()[0].price.to_string(), "1500");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_calls_on_empty_cache_share_one_fetch() {
        let source = Arc::new(MockPriceSource::with_data(sample("1500")).with_delay(Duration::from_millis(200)));
        let cache = Arc::new(cache(&source, 60_000));

        let (a, b) = tokio::join!(cache.get_prices(), cache.get_prices());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(source.calls(), 1);
        assert_eq!(a.names().collect::<Vec<_>>(), vec!["Маникюр", "Педикюр"]);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_a_failed_refresh() {
        let source = Arc::new(MockPriceSource::failing("HTTP 503").with_delay(Duration::from_millis(200)));
        let cache = Arc::new(cache(&source, 60_000));

        let started = Instant::now();
        let (a, b, c) = tokio::join!(cache.get_prices(), cache.get_prices(), cache.get_prices());
        assert!(matches!(a, Err(PriceError::Upstream(_))));
        assert!(matches!(b, Err(PriceError::Upstream(_))));
        assert!(matches!(c, Err(PriceError::Upstream(_))));
        assert_eq!(source.calls(), 1);
        assert!(started.elapsed() < Duration::from_millis(400));

        // a later caller starts a new refresh
        source.set_data(sample("1500"));
        assert!(cache.get_prices().await.is_ok());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_propagates_and_is_not_cached() {
        let source = Arc::new(MockPriceSource::failing("HTTP 503"));
        let cache = cache(&source, 1000);

        let err = cache.get_prices().await.unwrap_err();
        assert!(matches!(err, PriceError::Upstream(_)));
        assert!(!cache.is_fresh());

        source.set_data(sample("1500"));
        assert!(cache.get_prices().await.is_ok());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_is_not_served_when_refresh_fails() {
        let source = Arc::new(MockPriceSource::with_data(sample("1500")));
        let cache = cache(&source, 1000);
        cache.get_prices().await.unwrap();

        source.set_failure("timeout");
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get_prices().await.is_err());
    }

    #[tokio::test]
    async fn refresh_writes_snapshot() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prices.json");
        let source = Arc::new(MockPriceSource::with_data(sample("1500")));
        let cache = cache(&source, 1000).with_snapshot(SnapshotWriter::new(&path));

        cache.get_prices().await?;
        let text = wait_for_file(&path).await?;
        let back: PriceCategory = serde_json::from_str(&text)?;
        assert_eq!(back, sample("1500"));
        Ok(())
    }

    #[tokio::test]
    async fn snapshot_failure_is_swallowed() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("file");
        tokio::fs::write(&blocker, b"x").await?;
        let source = Arc::new(MockPriceSource::with_data(sample("1500")));
        let cache = cache(&source, 1000).with_snapshot(SnapshotWriter::new(blocker.join("prices.json")));

        let data = cache.get_prices().await?;
        assert_eq!(data.len(), 2);
        Ok(())
    }
}
