use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::debug;
use tokio::sync::Mutex;

use crate::data::SnapshotProvider;
use crate::domain::InstrumentSnapshot;

/// Time-bounded cache around the snapshot provider.
///
/// Owns `{data, fetch timestamp, ttl}` explicitly; there is no ambient
/// state; components that need the table hold a reference to the cache.
/// A screening run makes many snapshot reads (stage-1 plus per-candidate
/// realtime lookups) and all of them within the TTL share one fetch.
pub struct SnapshotCache {
    provider: Arc<dyn SnapshotProvider>,
    ttl: Duration,
    state: Mutex<Option<CachedTable>>,
}

struct CachedTable {
    rows: Arc<Vec<InstrumentSnapshot>>,
    fetched_at: Instant,
}

impl SnapshotCache {
    pub fn new(provider: Arc<dyn SnapshotProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            state: Mutex::new(None),
        }
    }

    /// The cached table if still fresh, otherwise one new fetch.
    /// A fetch failure here is the only fatal error in the pipeline.
    pub async fn get_or_refresh(&self) -> Result<Arc<Vec<InstrumentSnapshot>>> {
        let mut guard = self.state.lock().await;

        if let Some(cached) = guard.as_ref() {
            let age = cached.fetched_at.elapsed();
            if age < self.ttl {
                debug!(
                    "[cache] snapshot reuse, {:.0}s left of ttl",
                    (self.ttl - age).as_secs_f64()
                );
                return Ok(Arc::clone(&cached.rows));
            }
        }

        let rows = Arc::new(self.provider.fetch_snapshot().await?);
        *guard = Some(CachedTable {
            rows: Arc::clone(&rows),
            fetched_at: Instant::now(),
        });
        Ok(rows)
    }

    /// Realtime row for one symbol out of the cached table.
    pub async fn realtime(&self, symbol: &str) -> Result<Option<InstrumentSnapshot>> {
        let rows = self.get_or_refresh().await?;
        Ok(rows.iter().find(|r| r.symbol == symbol).cloned())
    }
}
