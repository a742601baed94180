//! In-process entity store used by tests and local runs without PostgreSQL.
//!
//! Each trait method holds the table lock for its whole body, so writes are
//! as atomic as the SQL transactions they stand in for. Individual operations
//! can be made to fail to exercise store error paths.

use super::EntityStore;
use crate::config::ReservationConfig;
use crate::error::{LivestreamError, Result};
use crate::models::{
    Livecomment, LivecommentReport, Livestream, LivestreamActivity, LivestreamViewer,
    NewLivecomment, NewLivecommentReport, NewLivestream, NewNgWord, NewReaction, NewUser, NgWord,
    Reaction, ScoreEntry, SlotRange, SubjectKind, User, UserActivity,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
struct LivestreamScore {
    user_id: i64,
    score: i64,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    icons: HashMap<i64, (i64, Vec<u8>)>,
    livestreams: BTreeMap<i64, Livestream>,
    livestream_tags: Vec<(i64, i64)>,
    reservation_slots: BTreeMap<i64, i64>,
    livecomments: BTreeMap<i64, Livecomment>,
    ng_words: BTreeMap<i64, NgWord>,
    reactions: BTreeMap<i64, Reaction>,
    viewers: Vec<LivestreamViewer>,
    reports: BTreeMap<i64, LivecommentReport>,
    scores: HashMap<i64, LivestreamScore>,
    sequences: HashMap<&'static str, i64>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    fn take(limit: Option<i64>) -> usize {
        limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(0))
    }

    fn owned_livestream_ids(&self, user_id: i64) -> HashSet<i64> {
        self.livestreams
            .values()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.id)
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose reservation table covers the whole term with `capacity`
    /// bookings per slot.
    pub fn with_reservation_slots(reservation: ReservationConfig, capacity: i64) -> Self {
        let store = Self::new();
        let last = (reservation.term_end - reservation.term_start) / reservation.slot_secs;
        store.add_reservation_slots(SlotRange { start: 0, end: last }, capacity);
        store
    }

    /// Make `operation` (a trait method name) fail until `recover` is called.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().remove(operation);
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.failing.lock().contains(operation) {
            return Err(LivestreamError::Store(format!(
                "injected failure in {operation}"
            )));
        }
        Ok(())
    }

    pub fn add_reservation_slots(&self, slots: SlotRange, capacity: i64) {
        let mut tables = self.tables.lock();
        for slot in slots.start..=slots.end {
            tables.reservation_slots.insert(slot, capacity);
        }
    }

    pub fn remaining_capacity(&self, slot: i64) -> Option<i64> {
        self.tables.lock().reservation_slots.get(&slot).copied()
    }

    pub fn set_livestream_score(&self, livestream_id: i64, user_id: i64, score: i64) {
        self.tables
            .lock()
            .scores
            .insert(livestream_id, LivestreamScore { user_id, score });
    }

    /// Insert a livestream row directly, bypassing reservation capacity.
    pub fn insert_livestream_row(&self, livestream: NewLivestream) -> Livestream {
        let mut tables = self.tables.lock();
        let id = tables.next_id("livestreams");
        let livestream = livestream.into_livestream(id);
        tables.livestreams.insert(id, livestream.clone());
        livestream
    }

    pub fn tag_ids(&self, livestream_id: i64) -> Vec<i64> {
        self.tables
            .lock()
            .livestream_tags
            .iter()
            .filter(|(id, _)| *id == livestream_id)
            .map(|(_, tag_id)| *tag_id)
            .collect()
    }

    /// Every stored comment, across all livestreams, in id order.
    pub fn all_livecomments(&self) -> Vec<Livecomment> {
        self.tables.lock().livecomments.values().cloned().collect()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn select_users(&self) -> Result<Vec<User>> {
        self.check("select_users")?;
        Ok(self.tables.lock().users.values().cloned().collect())
    }

    async fn select_livestreams(&self) -> Result<Vec<Livestream>> {
        self.check("select_livestreams")?;
        Ok(self.tables.lock().livestreams.values().cloned().collect())
    }

    async fn select_ng_words(&self) -> Result<Vec<NgWord>> {
        self.check("select_ng_words")?;
        Ok(self.tables.lock().ng_words.values().rev().cloned().collect())
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        self.check("find_user")?;
        Ok(self.tables.lock().users.get(&user_id).cloned())
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        self.check("find_user_by_name")?;
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .find(|u| u.name == name)
            .cloned())
    }

    async fn find_livestream(&self, livestream_id: i64) -> Result<Option<Livestream>> {
        self.check("find_livestream")?;
        Ok(self.tables.lock().livestreams.get(&livestream_id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        self.check("insert_user")?;
        let mut tables = self.tables.lock();
        if tables.users.values().any(|u| u.name == user.name) {
            return Err(LivestreamError::Store(format!(
                "duplicate user name: {}",
                user.name
            )));
        }
        let id = tables.next_id("users");
        let user = user.into_user(id);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_icon(&self, user_id: i64, image: &[u8], icon_hash: &str) -> Result<i64> {
        self.check("update_icon")?;
        let mut tables = self.tables.lock();
        let icon_id = tables.next_id("icons");
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.icon_hash = icon_hash.to_string();
        }
        tables.icons.insert(user_id, (icon_id, image.to_vec()));
        Ok(icon_id)
    }

    async fn reserve_livestream(
        &self,
        livestream: NewLivestream,
        slots: SlotRange,
    ) -> Result<Livestream> {
        self.check("reserve_livestream")?;
        if slots.start > slots.end {
            return Err(LivestreamError::ReservationUnavailable {
                start_slot: slots.start,
                end_slot: slots.end,
            });
        }
        let mut tables = self.tables.lock();

        let min_remaining = tables
            .reservation_slots
            .range(slots.start..=slots.end)
            .map(|(_, remaining)| *remaining)
            .min();
        if min_remaining.map_or(true, |min| min < 1) {
            return Err(LivestreamError::ReservationUnavailable {
                start_slot: slots.start,
                end_slot: slots.end,
            });
        }

        for (_, remaining) in tables.reservation_slots.range_mut(slots.start..=slots.end) {
            *remaining -= 1;
        }

        let id = tables.next_id("livestreams");
        let tag_ids = livestream.tags.clone();
        let livestream = livestream.into_livestream(id);
        tables.livestreams.insert(id, livestream.clone());
        tables
            .livestream_tags
            .extend(tag_ids.into_iter().map(|tag_id| (id, tag_id)));
        Ok(livestream)
    }

    async fn select_livestream_ids(&self, limit: Option<i64>) -> Result<Vec<i64>> {
        self.check("select_livestream_ids")?;
        Ok(self
            .tables
            .lock()
            .livestreams
            .keys()
            .rev()
            .take(Tables::take(limit))
            .copied()
            .collect())
    }

    async fn select_livestream_ids_by_tag(&self, tag_id: i64) -> Result<Vec<i64>> {
        self.check("select_livestream_ids_by_tag")?;
        let tables = self.tables.lock();
        let mut ids: Vec<i64> = tables
            .livestream_tags
            .iter()
            .filter(|(_, t)| *t == tag_id)
            .map(|(livestream_id, _)| *livestream_id)
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.dedup();
        Ok(ids)
    }

    async fn select_livestream_ids_by_user(&self, user_id: i64) -> Result<Vec<i64>> {
        self.check("select_livestream_ids_by_user")?;
        Ok(self
            .tables
            .lock()
            .livestreams
            .values()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.id)
            .collect())
    }

    async fn find_icon(&self, user_id: i64) -> Result<Option<Vec<u8>>> {
        self.check("find_icon")?;
        Ok(self
            .tables
            .lock()
            .icons
            .get(&user_id)
            .map(|(_, image)| image.clone()))
    }

    async fn insert_viewer(&self, viewer: LivestreamViewer) -> Result<()> {
        self.check("insert_viewer")?;
        self.tables.lock().viewers.push(viewer);
        Ok(())
    }

    async fn delete_viewer(&self, user_id: i64, livestream_id: i64) -> Result<u64> {
        self.check("delete_viewer")?;
        let mut tables = self.tables.lock();
        let before = tables.viewers.len();
        tables
            .viewers
            .retain(|v| !(v.user_id == user_id && v.livestream_id == livestream_id));
        Ok((before - tables.viewers.len()) as u64)
    }

    async fn insert_livecomment(&self, livecomment: NewLivecomment) -> Result<Livecomment> {
        self.check("insert_livecomment")?;
        let mut tables = self.tables.lock();
        let id = tables.next_id("livecomments");
        let livecomment = livecomment.into_livecomment(id);
        tables.livecomments.insert(id, livecomment.clone());
        Ok(livecomment)
    }

    async fn find_livecomment(&self, livecomment_id: i64) -> Result<Option<Livecomment>> {
        self.check("find_livecomment")?;
        Ok(self.tables.lock().livecomments.get(&livecomment_id).cloned())
    }

    async fn select_livecomments(
        &self,
        livestream_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Livecomment>> {
        self.check("select_livecomments")?;
        Ok(self
            .tables
            .lock()
            .livecomments
            .values()
            .rev()
            .filter(|c| c.livestream_id == livestream_id)
            .take(Tables::take(limit))
            .cloned()
            .collect())
    }

    async fn insert_livecomment_report(
        &self,
        report: NewLivecommentReport,
    ) -> Result<LivecommentReport> {
        self.check("insert_livecomment_report")?;
        let mut tables = self.tables.lock();
        let id = tables.next_id("livecomment_reports");
        let report = report.into_report(id);
        tables.reports.insert(id, report.clone());
        Ok(report)
    }

    async fn select_livecomment_reports(
        &self,
        livestream_id: i64,
    ) -> Result<Vec<LivecommentReport>> {
        self.check("select_livecomment_reports")?;
        Ok(self
            .tables
            .lock()
            .reports
            .values()
            .filter(|r| r.livestream_id == livestream_id)
            .cloned()
            .collect())
    }

    async fn insert_reaction(&self, reaction: NewReaction) -> Result<Reaction> {
        self.check("insert_reaction")?;
        let mut tables = self.tables.lock();
        let id = tables.next_id("reactions");
        let reaction = reaction.into_reaction(id);
        tables.reactions.insert(id, reaction.clone());
        Ok(reaction)
    }

    async fn select_reactions(
        &self,
        livestream_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Reaction>> {
        self.check("select_reactions")?;
        let tables = self.tables.lock();
        let mut reactions: Vec<Reaction> = tables
            .reactions
            .values()
            .filter(|r| r.livestream_id == livestream_id)
            .cloned()
            .collect();
        reactions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        reactions.truncate(Tables::take(limit));
        Ok(reactions)
    }

    async fn insert_ng_word_and_purge(&self, ng_word: NewNgWord) -> Result<(NgWord, u64)> {
        self.check("insert_ng_word_and_purge")?;
        let mut tables = self.tables.lock();
        let id = tables.next_id("ng_words");
        let ng_word = ng_word.into_ng_word(id);
        tables.ng_words.insert(id, ng_word.clone());

        let before = tables.livecomments.len();
        tables.livecomments.retain(|_, c| {
            !(c.livestream_id == ng_word.livestream_id && c.comment.contains(&ng_word.word))
        });
        let purged = (before - tables.livecomments.len()) as u64;

        Ok((ng_word, purged))
    }

    async fn select_scores(&self, kind: SubjectKind) -> Result<Vec<ScoreEntry>> {
        self.check("select_scores")?;
        let tables = self.tables.lock();
        let scores = match kind {
            SubjectKind::Livestream => tables
                .scores
                .iter()
                .map(|(livestream_id, s)| ScoreEntry {
                    subject_id: *livestream_id,
                    score: s.score,
                })
                .collect(),
            SubjectKind::User => {
                let mut per_user: HashMap<i64, i64> = HashMap::new();
                for s in tables.scores.values() {
                    *per_user.entry(s.user_id).or_insert(0) += s.score;
                }
                per_user
                    .into_iter()
                    .map(|(subject_id, score)| ScoreEntry { subject_id, score })
                    .collect()
            }
        };
        Ok(scores)
    }

    async fn user_activity(&self, user_id: i64) -> Result<UserActivity> {
        self.check("user_activity")?;
        let tables = self.tables.lock();
        let owned = tables.owned_livestream_ids(user_id);

        let mut emoji_counts: HashMap<&str, i64> = HashMap::new();
        for reaction in tables
            .reactions
            .values()
            .filter(|r| owned.contains(&r.livestream_id))
        {
            *emoji_counts.entry(reaction.emoji_name.as_str()).or_insert(0) += 1;
        }
        let total_reactions: i64 = emoji_counts.values().sum();
        let favorite_emoji = emoji_counts
            .iter()
            .max_by(|(a_name, a_count), (b_name, b_count)| {
                a_count.cmp(b_count).then_with(|| a_name.cmp(b_name))
            })
            .map(|(name, _)| (*name).to_string())
            .unwrap_or_default();

        let comments: Vec<&Livecomment> = tables
            .livecomments
            .values()
            .filter(|c| owned.contains(&c.livestream_id))
            .collect();

        Ok(UserActivity {
            viewers_count: tables
                .viewers
                .iter()
                .filter(|v| owned.contains(&v.livestream_id))
                .count() as i64,
            total_reactions,
            total_livecomments: comments.len() as i64,
            total_tip: comments.iter().map(|c| c.tip).sum(),
            favorite_emoji,
        })
    }

    async fn livestream_activity(&self, livestream_id: i64) -> Result<LivestreamActivity> {
        self.check("livestream_activity")?;
        let tables = self.tables.lock();

        Ok(LivestreamActivity {
            viewers_count: tables
                .viewers
                .iter()
                .filter(|v| v.livestream_id == livestream_id)
                .count() as i64,
            total_reactions: tables
                .reactions
                .values()
                .filter(|r| r.livestream_id == livestream_id)
                .count() as i64,
            total_reports: tables
                .reports
                .values()
                .filter(|r| r.livestream_id == livestream_id)
                .count() as i64,
            max_tip: tables
                .livecomments
                .values()
                .filter(|c| c.livestream_id == livestream_id)
                .map(|c| c.tip)
                .max()
                .unwrap_or(0),
        })
    }
}
