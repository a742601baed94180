pub mod livecomments;
pub mod livestreams;
pub mod ranking;
pub mod reactions;
pub mod spam_filter;
pub mod stats;
pub mod users;

pub use livecomments::{LivecommentService, ModerationOutcome};
pub use livestreams::LivestreamService;
pub use ranking::RankingEngine;
pub use reactions::ReactionService;
pub use spam_filter::is_spam;
pub use stats::StatsService;
pub use users::{IconImage, UserService};

use crate::cache::CacheLayer;
use crate::config::Config;
use crate::error::{LivestreamError, Result};
use crate::store::EntityStore;
use std::sync::Arc;

/// Reject a negative row limit before it reaches the store.
pub(crate) fn check_limit(limit: Option<i64>) -> Result<Option<i64>> {
    match limit {
        Some(l) if l < 0 => Err(LivestreamError::InvalidInput(format!("negative limit {l}"))),
        _ => Ok(limit),
    }
}

/// Every service wired to one store and one cache layer.
#[derive(Clone)]
pub struct Services {
    pub caches: Arc<CacheLayer>,
    pub users: UserService,
    pub livestreams: LivestreamService,
    pub livecomments: LivecommentService,
    pub reactions: ReactionService,
    pub ranking: RankingEngine,
    pub stats: StatsService,
}

impl Services {
    pub fn new(config: &Config, store: Arc<dyn EntityStore>, caches: Arc<CacheLayer>) -> Self {
        let users = UserService::new(store.clone(), caches.clone(), config.fallback_icon_hash.clone());
        let livestreams = LivestreamService::new(
            store.clone(),
            caches.clone(),
            users.clone(),
            config.reservation(),
        );
        let livecomments = LivecommentService::new(
            store.clone(),
            caches.clone(),
            users.clone(),
            livestreams.clone(),
        );
        let reactions = ReactionService::new(store.clone(), users.clone(), livestreams.clone());
        let ranking = RankingEngine::new(store.clone(), caches.clone());
        let stats = StatsService::new(store, caches.clone(), ranking.clone());

        Self {
            caches,
            users,
            livestreams,
            livecomments,
            reactions,
            ranking,
            stats,
        }
    }
}
