use crate::cache::CacheLayer;
use crate::error::{LivestreamError, Result};
use crate::models::{NewUser, Theme, User, UserProfile};
use crate::session::SessionValues;
use crate::store::EntityStore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Reserved for the platform's own subdomain.
pub const RESERVED_USER_NAME: &str = "pipe";

pub fn icon_hash(image: &[u8]) -> String {
    hex::encode(Sha256::digest(image))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconImage {
    /// The client's copy already matches the current fingerprint.
    NotModified,
    Image(Vec<u8>),
    /// No icon was ever uploaded; serve the bundled "no image" icon.
    Fallback,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn EntityStore>,
    caches: Arc<CacheLayer>,
    fallback_icon_hash: String,
}

impl UserService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        caches: Arc<CacheLayer>,
        fallback_icon_hash: impl Into<String>,
    ) -> Self {
        Self {
            store,
            caches,
            fallback_icon_hash: fallback_icon_hash.into(),
        }
    }

    pub async fn register(&self, user: NewUser) -> Result<UserProfile> {
        if user.name.is_empty() {
            return Err(LivestreamError::InvalidInput("user name is empty".to_string()));
        }
        if user.name == RESERVED_USER_NAME {
            return Err(LivestreamError::InvalidInput(format!(
                "user name {RESERVED_USER_NAME} is reserved"
            )));
        }

        let user = self.store.insert_user(user).await?;
        info!(user_id = user.id, name = %user.name, "User registered");

        let profile = self.profile(&user);
        self.caches.users.upsert(user);
        Ok(profile)
    }

    pub async fn find(&self, user_id: i64) -> Result<Option<User>> {
        if let Some(user) = self.caches.users.get(user_id) {
            return Ok(Some(user));
        }
        debug!(user_id, "User not cached, reading from store");
        self.store.find_user(user_id).await
    }

    pub async fn get(&self, user_id: i64) -> Result<User> {
        self.find(user_id)
            .await?
            .ok_or_else(|| LivestreamError::NotFound(format!("user {user_id}")))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<User> {
        if let Some(user) = self.caches.users.get_by_name(name) {
            return Ok(user);
        }
        debug!(name = %name, "User not cached, reading from store");
        self.store
            .find_user_by_name(name)
            .await?
            .ok_or_else(|| LivestreamError::NotFound(format!("user {name}")))
    }

    /// Cache lookup for every id, then one store read per id the cache missed.
    /// Ids unknown to the store are left out.
    pub async fn resolve_many(&self, user_ids: &[i64]) -> Result<HashMap<i64, User>> {
        let mut found = self.caches.users.get_many(user_ids);
        let mut missing: Vec<i64> = user_ids
            .iter()
            .copied()
            .filter(|id| !found.contains_key(id))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        for user_id in missing {
            debug!(user_id, "User not cached, reading from store");
            if let Some(user) = self.store.find_user(user_id).await? {
                found.insert(user_id, user);
            }
        }
        Ok(found)
    }

    pub async fn profile_by_name(&self, name: &str) -> Result<UserProfile> {
        let user = self.get_by_name(name).await?;
        Ok(self.profile(&user))
    }

    pub async fn theme(&self, name: &str) -> Result<Theme> {
        let user = self.get_by_name(name).await?;
        Ok(Theme {
            id: user.id,
            dark_mode: user.dark_mode,
        })
    }

    /// Store the icon and its sha256 fingerprint. Returns the new icon id.
    pub async fn update_icon(&self, session: &SessionValues, image: &[u8]) -> Result<i64> {
        let hash = icon_hash(image);
        let icon_id = self.store.update_icon(session.user_id, image, &hash).await?;

        let cached = self.caches.users.update_icon_hash(session.user_id, &hash);
        info!(
            user_id = session.user_id,
            icon_id,
            cached,
            "User icon updated"
        );
        Ok(icon_id)
    }

    /// Fetch a user's icon. `if_none_match` is the client's entity tag
    /// header; when it carries the current fingerprint no image is read.
    pub async fn icon(&self, name: &str, if_none_match: Option<&str>) -> Result<IconImage> {
        let user = self.get_by_name(name).await?;
        let hash = self.profile(&user).icon_hash;
        if if_none_match.map_or(false, |etag| etag.contains(&hash)) {
            return Ok(IconImage::NotModified);
        }

        match self.store.find_icon(user.id).await? {
            Some(image) => Ok(IconImage::Image(image)),
            None => {
                debug!(user_id = user.id, "No stored icon, using fallback");
                Ok(IconImage::Fallback)
            }
        }
    }

    pub fn profile(&self, user: &User) -> UserProfile {
        user.to_profile(&self.fallback_icon_hash)
    }
}
