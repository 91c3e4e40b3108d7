//! Refreshable snapshot of node names
//!
//! Query-time consumers match user mentions against the names in the graph.
//! Listing every name per request is too slow, so they hold a
//! [`NodeNameCache`] and read a shared snapshot that is swapped wholesale on
//! refresh.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::store::{GraphStore, StoreResult};

#[derive(Debug, Default)]
struct Snapshot {
    names: Arc<Vec<String>>,
    refreshed_at: Option<Instant>,
}

/// Time-boxed cache of node names read from a [`GraphStore`]
pub struct NodeNameCache {
    store: Arc<dyn GraphStore>,
    ttl: Duration,
    limit: Option<usize>,
    snapshot: RwLock<Snapshot>,
}

impl NodeNameCache {
    /// `limit` caps how many names one refresh loads.
    pub fn new(store: Arc<dyn GraphStore>, ttl: Duration, limit: Option<usize>) -> Self {
        Self {
            store,
            ttl,
            limit,
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Reload names from the store and swap the snapshot.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> StoreResult<Arc<Vec<String>>> {
        let names = match self.store.node_names(self.limit).await {
            Ok(names) => Arc::new(names),
            Err(e) => {
                warn!("Node name refresh failed, keeping previous snapshot: {}", e);
                return Err(e);
            }
        };

        let mut snapshot = self.snapshot.write();
        snapshot.names = Arc::clone(&names);
        snapshot.refreshed_at = Some(Instant::now());
        debug!("Node name cache refreshed with {} names", names.len());
        Ok(names)
    }

    /// Current snapshot, refreshed first when forced, empty or older than the TTL.
    pub async fn get(&self, force_refresh: bool) -> StoreResult<Arc<Vec<String>>> {
        let current = {
            let snapshot = self.snapshot.read();
            let fresh = snapshot
                .refreshed_at
                .map(|at| at.elapsed() < self.ttl)
                .unwrap_or(false);
            if !force_refresh && fresh && !snapshot.names.is_empty() {
                Some(Arc::clone(&snapshot.names))
            } else {
                None
            }
        };

        match current {
            Some(names) => Ok(names),
            None => self.refresh().await,
        }
    }

    /// Snapshot without touching the store
    pub fn peek(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.snapshot.read().names)
    }
}
