use crate::error::Result;
use crate::metrics;
use crate::models::User;
use crate::store::EntityStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

const FAMILY: &str = "users";

/// Both mappings live behind the same lock so a reader never sees a name
/// pointing at an id that is not (yet) in `by_id`.
#[derive(Debug, Default)]
struct UserSnapshot {
    by_id: HashMap<i64, User>,
    id_by_name: HashMap<String, i64>,
}

impl UserSnapshot {
    fn from_rows(rows: Vec<User>) -> Self {
        let mut snapshot = Self {
            by_id: HashMap::with_capacity(rows.len()),
            id_by_name: HashMap::with_capacity(rows.len()),
        };
        for user in rows {
            snapshot.insert(user);
        }
        snapshot
    }

    fn insert(&mut self, user: User) {
        if let Some(previous) = self.by_id.get(&user.id) {
            if previous.name != user.name {
                self.id_by_name.remove(&previous.name);
            }
        }
        self.id_by_name.insert(user.name.clone(), user.id);
        self.by_id.insert(user.id, user);
    }
}

#[derive(Debug, Default)]
pub struct UserCache {
    inner: RwLock<UserSnapshot>,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot with every user row in the store. On error
    /// the previous snapshot stays in place.
    pub async fn warm_up(&self, store: &dyn EntityStore) -> Result<usize> {
        let started = Instant::now();
        let rows = match store.select_users().await {
            Ok(rows) => rows,
            Err(e) => {
                metrics::observe_warm_up(FAMILY, false, started.elapsed());
                warn!(error = %e, "User cache warm-up failed, keeping previous snapshot");
                return Err(e);
            }
        };

        let snapshot = UserSnapshot::from_rows(rows);
        let count = snapshot.by_id.len();
        *self.inner.write() = snapshot;

        metrics::observe_warm_up(FAMILY, true, started.elapsed());
        info!(users = count, "User cache warmed up");
        Ok(count)
    }

    pub fn get(&self, user_id: i64) -> Option<User> {
        let user = self.inner.read().by_id.get(&user_id).cloned();
        metrics::record_cache_lookup(FAMILY, user.is_some());
        user
    }

    pub fn get_by_name(&self, name: &str) -> Option<User> {
        let user = {
            let snapshot = self.inner.read();
            snapshot
                .id_by_name
                .get(name)
                .and_then(|id| snapshot.by_id.get(id))
                .cloned()
        };
        metrics::record_cache_lookup(FAMILY, user.is_some());
        user
    }

    /// Look up several users at once. Missing ids are left out of the result.
    pub fn get_many(&self, user_ids: &[i64]) -> HashMap<i64, User> {
        let mut keys = user_ids.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let snapshot = self.inner.read();
        keys.into_iter()
            .filter_map(|id| snapshot.by_id.get(&id).map(|u| (id, u.clone())))
            .collect()
    }

    pub fn all(&self) -> Vec<User> {
        self.inner.read().by_id.values().cloned().collect()
    }

    pub fn upsert(&self, user: User) {
        debug!(user_id = user.id, name = %user.name, "Upserting user cache entry");
        self.inner.write().insert(user);
    }

    /// Only touches users already cached. Returns whether an entry changed.
    pub fn update_icon_hash(&self, user_id: i64, icon_hash: &str) -> bool {
        let mut snapshot = self.inner.write();
        match snapshot.by_id.get_mut(&user_id) {
            Some(user) => {
                user.icon_hash = icon_hash.to_string();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
