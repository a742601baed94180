use super::ranking::RankingEngine;
use crate::cache::CacheLayer;
use crate::error::{LivestreamError, Result};
use crate::models::{LivestreamStatistics, UserStatistics};
use crate::store::EntityStore;
use std::sync::Arc;

/// Statistics are ranked over the cached entity sets, so the subject itself
/// is looked up in the cache only. A subject the cache does not hold yet is
/// `NotFound` rather than ranked outside the set.
#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn EntityStore>,
    caches: Arc<CacheLayer>,
    ranking: RankingEngine,
}

impl StatsService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        caches: Arc<CacheLayer>,
        ranking: RankingEngine,
    ) -> Self {
        Self {
            store,
            caches,
            ranking,
        }
    }

    pub async fn user_statistics(&self, username: &str) -> Result<UserStatistics> {
        let user = self
            .caches
            .users
            .get_by_name(username)
            .ok_or_else(|| LivestreamError::NotFound(format!("user {username}")))?;
        let rank = self.ranking.user_rank(&user.name).await?;
        let activity = self.store.user_activity(user.id).await?;
        Ok(UserStatistics::new(rank, activity))
    }

    pub async fn livestream_statistics(&self, livestream_id: i64) -> Result<LivestreamStatistics> {
        let livestream = self
            .caches
            .livestreams
            .get(livestream_id)
            .ok_or_else(|| LivestreamError::NotFound(format!("livestream {livestream_id}")))?;
        let rank = self.ranking.livestream_rank(livestream.id).await?;
        let activity = self.store.livestream_activity(livestream.id).await?;
        Ok(LivestreamStatistics::new(rank, activity))
    }
}
