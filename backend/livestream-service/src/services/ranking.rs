use crate::cache::CacheLayer;
use crate::error::Result;
use crate::models::SubjectKind;
use crate::store::EntityStore;
use std::collections::HashMap;
use std::sync::Arc;

/// 1-based rank of `target` counting from the highest score down.
///
/// Entries are ordered by `(score, key)` ascending, so on equal scores the
/// larger key ranks higher. A target that is not present gets `len + 1`.
pub fn rank_from_top<K: Ord>(mut entries: Vec<(i64, K)>, target: &K) -> i64 {
    entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut rank: i64 = 1;
    for (_, key) in entries.iter().rev() {
        if key == target {
            break;
        }
        rank += 1;
    }
    rank
}

/// Recomputes rankings on every call from the score table and the cached
/// entity set.
#[derive(Clone)]
pub struct RankingEngine {
    store: Arc<dyn EntityStore>,
    caches: Arc<CacheLayer>,
}

impl RankingEngine {
    pub fn new(store: Arc<dyn EntityStore>, caches: Arc<CacheLayer>) -> Self {
        Self { store, caches }
    }

    async fn scores(&self, kind: SubjectKind) -> Result<HashMap<i64, i64>> {
        let entries = self.store.select_scores(kind).await?;
        Ok(entries.into_iter().map(|e| (e.subject_id, e.score)).collect())
    }

    /// Users tie-break on name.
    pub async fn user_rank(&self, username: &str) -> Result<i64> {
        let scores = self.scores(SubjectKind::User).await?;
        let entries: Vec<(i64, String)> = self
            .caches
            .users
            .all()
            .into_iter()
            .map(|u| (scores.get(&u.id).copied().unwrap_or(0), u.name))
            .collect();

        let rank = rank_from_top(entries, &username.to_string());
        tracing::debug!(username = %username, rank, "Computed user rank");
        Ok(rank)
    }

    /// Livestreams tie-break on id.
    pub async fn livestream_rank(&self, livestream_id: i64) -> Result<i64> {
        let scores = self.scores(SubjectKind::Livestream).await?;
        let entries: Vec<(i64, i64)> = self
            .caches
            .livestreams
            .all()
            .into_iter()
            .map(|l| (scores.get(&l.id).copied().unwrap_or(0), l.id))
            .collect();

        let rank = rank_from_top(entries, &livestream_id);
        tracing::debug!(livestream_id, rank, "Computed livestream rank");
        Ok(rank)
    }
}
