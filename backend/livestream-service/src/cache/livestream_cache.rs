use crate::error::Result;
use crate::metrics;
use crate::models::Livestream;
use crate::store::EntityStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

const FAMILY: &str = "livestreams";

#[derive(Debug, Default)]
pub struct LivestreamCache {
    by_id: RwLock<HashMap<i64, Livestream>>,
}

impl LivestreamCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn warm_up(&self, store: &dyn EntityStore) -> Result<usize> {
        let started = Instant::now();
        let rows = match store.select_livestreams().await {
            Ok(rows) => rows,
            Err(e) => {
                metrics::observe_warm_up(FAMILY, false, started.elapsed());
                warn!(error = %e, "Livestream cache warm-up failed, keeping previous snapshot");
                return Err(e);
            }
        };

        let snapshot: HashMap<i64, Livestream> = rows.into_iter().map(|l| (l.id, l)).collect();
        let count = snapshot.len();
        *self.by_id.write() = snapshot;

        metrics::observe_warm_up(FAMILY, true, started.elapsed());
        info!(livestreams = count, "Livestream cache warmed up");
        Ok(count)
    }

    pub fn get(&self, livestream_id: i64) -> Option<Livestream> {
        let livestream = self.by_id.read().get(&livestream_id).cloned();
        metrics::record_cache_lookup(FAMILY, livestream.is_some());
        livestream
    }

    pub fn get_many(&self, livestream_ids: &[i64]) -> HashMap<i64, Livestream> {
        let mut keys = livestream_ids.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let by_id = self.by_id.read();
        keys.into_iter()
            .filter_map(|id| by_id.get(&id).map(|l| (id, l.clone())))
            .collect()
    }

    pub fn all(&self) -> Vec<Livestream> {
        self.by_id.read().values().cloned().collect()
    }

    pub fn upsert(&self, livestream: Livestream) {
        debug!(
            livestream_id = livestream.id,
            user_id = livestream.user_id,
            "Upserting livestream cache entry"
        );
        self.by_id.write().insert(livestream.id, livestream);
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
