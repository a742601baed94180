use crate::error::Result;
use crate::metrics;
use crate::models::NgWord;
use crate::store::EntityStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

const FAMILY: &str = "ng_words";

/// NG-words grouped by livestream, each list newest first.
#[derive(Debug, Default)]
pub struct NgWordCache {
    by_livestream: RwLock<HashMap<i64, Vec<NgWord>>>,
}

impl NgWordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn warm_up(&self, store: &dyn EntityStore) -> Result<usize> {
        let started = Instant::now();
        let mut rows = match store.select_ng_words().await {
            Ok(rows) => rows,
            Err(e) => {
                metrics::observe_warm_up(FAMILY, false, started.elapsed());
                warn!(error = %e, "NG-word cache warm-up failed, keeping previous snapshot");
                return Err(e);
            }
        };
        rows.sort_by(|a, b| b.id.cmp(&a.id));

        let count = rows.len();
        let mut snapshot: HashMap<i64, Vec<NgWord>> = HashMap::new();
        for word in rows {
            snapshot.entry(word.livestream_id).or_default().push(word);
        }
        *self.by_livestream.write() = snapshot;

        metrics::observe_warm_up(FAMILY, true, started.elapsed());
        info!(ng_words = count, "NG-word cache warmed up");
        Ok(count)
    }

    /// Words registered on `livestream_id` by `user_id`, newest first.
    pub fn words_for(&self, livestream_id: i64, user_id: i64) -> Vec<NgWord> {
        let words: Option<Vec<NgWord>> = self
            .by_livestream
            .read()
            .get(&livestream_id)
            .map(|list| list.iter().filter(|w| w.user_id == user_id).cloned().collect());
        metrics::record_cache_lookup(FAMILY, words.is_some());
        words.unwrap_or_default()
    }

    pub fn get_many(&self, livestream_ids: &[i64]) -> HashMap<i64, Vec<NgWord>> {
        let mut keys = livestream_ids.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let by_livestream = self.by_livestream.read();
        keys.into_iter()
            .filter_map(|id| by_livestream.get(&id).map(|words| (id, words.clone())))
            .collect()
    }

    pub fn add(&self, word: NgWord) {
        debug!(
            livestream_id = word.livestream_id,
            ng_word_id = word.id,
            "Adding NG-word to cache"
        );
        self.by_livestream
            .write()
            .entry(word.livestream_id)
            .or_default()
            .insert(0, word);
    }

    pub fn len(&self) -> usize {
        self.by_livestream.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
