use super::check_limit;
use super::users::UserService;
use crate::cache::CacheLayer;
use crate::config::ReservationConfig;
use crate::error::{LivestreamError, Result};
use crate::models::{tag, Livestream, LivestreamView, LivestreamViewer, NewLivestream, SlotRange};
use crate::session::SessionValues;
use crate::store::EntityStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Slot ids covered by `[start_at, end_at]`: the first slot boundary at or
/// after the start through the last boundary at or before the end. A window
/// that contains no whole slot is `ReservationUnavailable`.
pub fn slot_range(term: &ReservationConfig, start_at: i64, end_at: i64) -> Result<SlotRange> {
    if end_at <= start_at {
        return Err(LivestreamError::InvalidInput(format!(
            "reservation end {end_at} is not after start {start_at}"
        )));
    }
    if start_at >= term.term_end || end_at <= term.term_start {
        return Err(LivestreamError::InvalidInput(format!(
            "reservation {start_at}..{end_at} is outside the term {}..{}",
            term.term_start, term.term_end
        )));
    }

    let out_of_range = || {
        LivestreamError::InvalidInput(format!(
            "reservation {start_at}..{end_at} is out of range"
        ))
    };
    let from_start = start_at.checked_sub(term.term_start).ok_or_else(out_of_range)?;
    let from_end = end_at.checked_sub(term.term_start).ok_or_else(out_of_range)?;

    let mut start = from_start.div_euclid(term.slot_secs);
    if from_start.rem_euclid(term.slot_secs) != 0 {
        start += 1;
    }
    let end = from_end.div_euclid(term.slot_secs);
    if start > end {
        return Err(LivestreamError::ReservationUnavailable {
            start_slot: start,
            end_slot: end,
        });
    }
    Ok(SlotRange { start, end })
}

#[derive(Clone)]
pub struct LivestreamService {
    store: Arc<dyn EntityStore>,
    caches: Arc<CacheLayer>,
    users: UserService,
    term: ReservationConfig,
}

impl LivestreamService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        caches: Arc<CacheLayer>,
        users: UserService,
        term: ReservationConfig,
    ) -> Self {
        Self {
            store,
            caches,
            users,
            term,
        }
    }

    /// Reserve a livestream for the session user. The request's `user_id` is
    /// ignored in favour of the session.
    pub async fn reserve(
        &self,
        session: &SessionValues,
        mut request: NewLivestream,
    ) -> Result<LivestreamView> {
        let slots = slot_range(&self.term, request.start_at, request.end_at)?;
        if let Some(unknown) = request.tags.iter().find(|id| tag::tag_by_id(**id).is_none()) {
            return Err(LivestreamError::InvalidInput(format!("unknown tag id {unknown}")));
        }
        request.user_id = session.user_id;

        let livestream = self.store.reserve_livestream(request, slots).await?;
        info!(
            livestream_id = livestream.id,
            user_id = livestream.user_id,
            start_slot = slots.start,
            end_slot = slots.end,
            "Livestream reserved"
        );
        self.caches.livestreams.upsert(livestream.clone());

        self.view(&livestream).await
    }

    pub async fn find(&self, livestream_id: i64) -> Result<Option<Livestream>> {
        if let Some(livestream) = self.caches.livestreams.get(livestream_id) {
            return Ok(Some(livestream));
        }
        debug!(livestream_id, "Livestream not cached, reading from store");
        self.store.find_livestream(livestream_id).await
    }

    pub async fn get(&self, livestream_id: i64) -> Result<Livestream> {
        self.find(livestream_id)
            .await?
            .ok_or_else(|| LivestreamError::NotFound(format!("livestream {livestream_id}")))
    }

    pub async fn get_many(&self, livestream_ids: &[i64]) -> Result<HashMap<i64, Livestream>> {
        let mut found = self.caches.livestreams.get_many(livestream_ids);
        let mut missing: Vec<i64> = livestream_ids
            .iter()
            .copied()
            .filter(|id| !found.contains_key(id))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        for livestream_id in missing {
            debug!(livestream_id, "Livestream not cached, reading from store");
            if let Some(livestream) = self.store.find_livestream(livestream_id).await? {
                found.insert(livestream_id, livestream);
            }
        }
        Ok(found)
    }

    /// Livestreams carrying the named tag, or every livestream when `tag_name`
    /// is `None`. Newest first, at most `limit` of them.
    pub async fn search(
        &self,
        tag_name: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<LivestreamView>> {
        let limit = check_limit(limit)?;
        let ids = match tag_name {
            Some(name) => {
                let tag_id = tag::tag_id_by_name(name)
                    .ok_or_else(|| LivestreamError::NotFound(format!("tag {name}")))?;
                let mut ids = self.store.select_livestream_ids_by_tag(tag_id).await?;
                if let Some(limit) = limit {
                    ids.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
                }
                ids
            }
            None => self.store.select_livestream_ids(limit).await?,
        };
        self.views(&ids).await
    }

    pub async fn mine(&self, session: &SessionValues) -> Result<Vec<LivestreamView>> {
        let ids = self.store.select_livestream_ids_by_user(session.user_id).await?;
        self.views(&ids).await
    }

    pub async fn by_user(&self, username: &str) -> Result<Vec<LivestreamView>> {
        let user = self.users.get_by_name(username).await?;
        let ids = self.store.select_livestream_ids_by_user(user.id).await?;
        self.views(&ids).await
    }

    /// Record that the session user started watching a livestream.
    pub async fn enter(&self, session: &SessionValues, livestream_id: i64) -> Result<()> {
        let livestream = self.get(livestream_id).await?;
        self.store
            .insert_viewer(LivestreamViewer {
                user_id: session.user_id,
                livestream_id: livestream.id,
                created_at: chrono::Utc::now().timestamp(),
            })
            .await?;
        debug!(livestream_id, user_id = session.user_id, "Viewer entered");
        Ok(())
    }

    /// Drop the session user's viewer history on a livestream.
    pub async fn exit(&self, session: &SessionValues, livestream_id: i64) -> Result<u64> {
        let livestream = self.get(livestream_id).await?;
        let removed = self
            .store
            .delete_viewer(session.user_id, livestream.id)
            .await?;
        debug!(livestream_id, user_id = session.user_id, removed, "Viewer exited");
        Ok(removed)
    }

    /// Views for `livestream_ids` in the given order. Ids unknown to the
    /// store are left out.
    async fn views(&self, livestream_ids: &[i64]) -> Result<Vec<LivestreamView>> {
        let livestreams = self.get_many(livestream_ids).await?;
        let owner_ids: Vec<i64> = livestreams.values().map(|l| l.user_id).collect();
        let owners = self.users.resolve_many(&owner_ids).await?;

        livestream_ids
            .iter()
            .filter_map(|id| livestreams.get(id))
            .map(|livestream| {
                let owner = owners.get(&livestream.user_id).ok_or_else(|| {
                    LivestreamError::NotFound(format!("user {}", livestream.user_id))
                })?;
                Ok(LivestreamView::new(livestream, self.users.profile(owner)))
            })
            .collect()
    }

    pub async fn view(&self, livestream: &Livestream) -> Result<LivestreamView> {
        let owner = self.users.get(livestream.user_id).await?;
        Ok(LivestreamView::new(livestream, self.users.profile(&owner)))
    }

    pub async fn view_by_id(&self, livestream_id: i64) -> Result<LivestreamView> {
        let livestream = self.get(livestream_id).await?;
        self.view(&livestream).await
    }
}
