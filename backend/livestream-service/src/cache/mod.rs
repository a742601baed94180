//! Read-mostly caches in front of the entity store.
//!
//! Each family has its own `RwLock`. Warm-up builds the new map without the
//! lock and swaps it in with one write; no lock is held across a store call.

pub mod livestream_cache;
pub mod ngword_cache;
pub mod user_cache;

pub use livestream_cache::LivestreamCache;
pub use ngword_cache::NgWordCache;
pub use user_cache::UserCache;

use crate::error::Result;
use crate::store::EntityStore;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WarmUpReport {
    pub users: usize,
    pub livestreams: usize,
    pub ng_words: usize,
}

/// The three cache families. Constructed once and shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct CacheLayer {
    pub users: UserCache,
    pub livestreams: LivestreamCache,
    pub ng_words: NgWordCache,
}

impl CacheLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warm every family. All three are attempted even when one fails; a failed
    /// family keeps its previous snapshot and the first error is returned.
    pub async fn warm_up_all(&self, store: &dyn EntityStore) -> Result<WarmUpReport> {
        let (users, livestreams, ng_words) = tokio::join!(
            self.users.warm_up(store),
            self.livestreams.warm_up(store),
            self.ng_words.warm_up(store),
        );

        let report = WarmUpReport {
            users: users?,
            livestreams: livestreams?,
            ng_words: ng_words?,
        };
        info!(
            users = report.users,
            livestreams = report.livestreams,
            ng_words = report.ng_words,
            "All caches warmed up"
        );
        Ok(report)
    }
}
