//! Entity store contract.
//!
//! The relational store is the source of truth. Every write method here is a
//! single committed transaction: when it returns `Ok`, the row is durable and
//! the caller may reflect it into the in-memory caches.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgEntityStore;

use crate::error::Result;
use crate::models::{
    Livecomment, LivecommentReport, Livestream, LivestreamActivity, LivestreamViewer,
    NewLivecomment, NewLivecommentReport, NewLivestream, NewNgWord, NewReaction, NewUser, NgWord,
    Reaction, ScoreEntry, SlotRange, SubjectKind, User, UserActivity,
};
use async_trait::async_trait;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Every user row, for cache warm-up.
    async fn select_users(&self) -> Result<Vec<User>>;

    /// Every livestream row, for cache warm-up.
    async fn select_livestreams(&self) -> Result<Vec<Livestream>>;

    /// Every NG-word row, newest (highest id) first.
    async fn select_ng_words(&self) -> Result<Vec<NgWord>>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>>;

    async fn find_livestream(&self, livestream_id: i64) -> Result<Option<Livestream>>;

    /// Insert a user and return it with the assigned id.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    /// Replace the user's icon and icon fingerprint. Returns the new icon id.
    async fn update_icon(&self, user_id: i64, image: &[u8], icon_hash: &str) -> Result<i64>;

    /// Take one unit of capacity from every slot in `slots` and insert the
    /// livestream with its tags. Fails with `ReservationUnavailable` without
    /// changing anything when any slot is exhausted.
    async fn reserve_livestream(
        &self,
        livestream: NewLivestream,
        slots: SlotRange,
    ) -> Result<Livestream>;

    /// Livestream ids, newest (highest id) first.
    async fn select_livestream_ids(&self, limit: Option<i64>) -> Result<Vec<i64>>;

    /// Ids of livestreams carrying `tag_id`, newest first.
    async fn select_livestream_ids_by_tag(&self, tag_id: i64) -> Result<Vec<i64>>;

    /// Ids of livestreams owned by `user_id`, in id order.
    async fn select_livestream_ids_by_user(&self, user_id: i64) -> Result<Vec<i64>>;

    /// The stored icon image of a user, if one was ever uploaded.
    async fn find_icon(&self, user_id: i64) -> Result<Option<Vec<u8>>>;

    async fn insert_viewer(&self, viewer: LivestreamViewer) -> Result<()>;

    /// Delete every history entry of the user on the livestream. Returns the
    /// number of deleted entries.
    async fn delete_viewer(&self, user_id: i64, livestream_id: i64) -> Result<u64>;

    async fn insert_livecomment(&self, livecomment: NewLivecomment) -> Result<Livecomment>;

    async fn find_livecomment(&self, livecomment_id: i64) -> Result<Option<Livecomment>>;

    /// Comments on a livestream, newest first.
    async fn select_livecomments(
        &self,
        livestream_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Livecomment>>;

    async fn insert_livecomment_report(
        &self,
        report: NewLivecommentReport,
    ) -> Result<LivecommentReport>;

    /// Reports filed against a livestream's comments, in id order.
    async fn select_livecomment_reports(
        &self,
        livestream_id: i64,
    ) -> Result<Vec<LivecommentReport>>;

    async fn insert_reaction(&self, reaction: NewReaction) -> Result<Reaction>;

    /// Reactions on a livestream, newest first.
    async fn select_reactions(
        &self,
        livestream_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Reaction>>;

    /// Insert the NG-word and delete every comment on the same livestream
    /// containing it. Returns the stored word and the number of purged comments.
    async fn insert_ng_word_and_purge(&self, ng_word: NewNgWord) -> Result<(NgWord, u64)>;

    /// All (subject id, score) pairs of one score table, in no particular order.
    async fn select_scores(&self, kind: SubjectKind) -> Result<Vec<ScoreEntry>>;

    async fn user_activity(&self, user_id: i64) -> Result<UserActivity>;

    async fn livestream_activity(&self, livestream_id: i64) -> Result<LivestreamActivity>;
}
