use super::tag::{self, Tag};
use super::user::UserProfile;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `livestreams` table; `raw_tags` is the comma-joined tag id list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Livestream {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub playlist_url: String,
    pub thumbnail_url: String,
    pub start_at: i64,
    pub end_at: i64,
    pub raw_tags: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLivestream {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub playlist_url: String,
    pub thumbnail_url: String,
    pub start_at: i64,
    pub end_at: i64,
    pub tags: Vec<i64>,
}

impl NewLivestream {
    pub fn raw_tags(&self) -> String {
        tag::encode_raw_tags(&self.tags)
    }

    pub fn into_livestream(self, id: i64) -> Livestream {
        let raw_tags = self.raw_tags();
        Livestream {
            id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            playlist_url: self.playlist_url,
            thumbnail_url: self.thumbnail_url,
            start_at: self.start_at,
            end_at: self.end_at,
            raw_tags,
        }
    }
}

/// Inclusive range of reservation slot ids a livestream occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: i64,
    pub end: i64,
}

impl SlotRange {
    pub fn contains(&self, slot: i64) -> bool {
        self.start <= slot && slot <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LivestreamView {
    pub id: i64,
    pub owner: UserProfile,
    pub title: String,
    pub description: String,
    pub playlist_url: String,
    pub thumbnail_url: String,
    pub tags: Vec<Tag>,
    pub start_at: i64,
    pub end_at: i64,
}

impl LivestreamView {
    pub fn new(livestream: &Livestream, owner: UserProfile) -> Self {
        Self {
            id: livestream.id,
            owner,
            title: livestream.title.clone(),
            description: livestream.description.clone(),
            playlist_url: livestream.playlist_url.clone(),
            thumbnail_url: livestream.thumbnail_url.clone(),
            tags: tag::decode_raw_tags(&livestream.raw_tags),
            start_at: livestream.start_at,
            end_at: livestream.end_at,
        }
    }
}
