//! Shared fixtures: a `MemoryStore`, a fresh cache layer and the wired services.
#![allow(dead_code)]

use livestream_service::models::{Livestream, NewLivestream, NewUser, UserProfile};
use livestream_service::store::{EntityStore, MemoryStore};
use livestream_service::{CacheLayer, Config, Services, SessionValues};
use std::sync::Arc;

pub const SLOT_SECS: i64 = 3600;

pub struct Harness {
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub caches: Arc<CacheLayer>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_slot_capacity(5)
    }

    pub fn with_slot_capacity(capacity: i64) -> Self {
        let config = Config::default();
        let store = Arc::new(MemoryStore::with_reservation_slots(
            config.reservation(),
            capacity,
        ));
        let caches = Arc::new(CacheLayer::new());
        let dyn_store: Arc<dyn EntityStore> = store.clone();
        let services = Services::new(&config, dyn_store, caches.clone());

        Self {
            config,
            store,
            caches,
            services,
        }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    /// Start of the `hour`-th slot of the reservation term.
    pub fn slot_start(&self, hour: i64) -> i64 {
        self.config.reservation_term_start + hour * SLOT_SECS
    }

    pub async fn register(&self, name: &str) -> SessionValues {
        let profile: UserProfile = self
            .services
            .users
            .register(new_user(name))
            .await
            .expect("register user");
        SessionValues::new(profile.id, profile.name)
    }

    /// Reserve a one-hour livestream in slot `hour`.
    pub async fn reserve(&self, session: &SessionValues, hour: i64) -> Livestream {
        let view = self
            .services
            .livestreams
            .reserve(session, new_livestream(self.slot_start(hour), vec![1, 2]))
            .await
            .expect("reserve livestream");
        self.services
            .livestreams
            .get(view.id)
            .await
            .expect("reserved livestream is readable")
    }
}

pub fn new_user(name: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        display_name: format!("{name} display"),
        description: String::new(),
        hashed_password: "$2a$04$hashed".to_string(),
        dark_mode: false,
    }
}

pub fn new_livestream(start_at: i64, tags: Vec<i64>) -> NewLivestream {
    NewLivestream {
        user_id: 0,
        title: "stream".to_string(),
        description: "test stream".to_string(),
        playlist_url: "https://media.example/playlist.m3u8".to_string(),
        thumbnail_url: "https://media.example/thumb.jpg".to_string(),
        start_at,
        end_at: start_at + SLOT_SECS,
        tags,
    }
}
