use super::check_limit;
use super::livestreams::LivestreamService;
use super::spam_filter;
use super::users::UserService;
use crate::cache::CacheLayer;
use crate::error::{LivestreamError, Result};
use crate::metrics;
use crate::models::{
    Livecomment, LivecommentReportView, LivecommentView, Livestream, LivestreamView,
    NewLivecomment, NewLivecommentReport, NewNgWord, NgWord, User,
};
use crate::session::SessionValues;
use crate::store::EntityStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModerationOutcome {
    pub ng_word: NgWord,
    pub purged_livecomments: u64,
}

#[derive(Clone)]
pub struct LivecommentService {
    store: Arc<dyn EntityStore>,
    caches: Arc<CacheLayer>,
    users: UserService,
    livestreams: LivestreamService,
}

impl LivecommentService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        caches: Arc<CacheLayer>,
        users: UserService,
        livestreams: LivestreamService,
    ) -> Self {
        Self {
            store,
            caches,
            users,
            livestreams,
        }
    }

    /// Post a comment unless it contains one of the livestream owner's NG-words.
    pub async fn post(
        &self,
        session: &SessionValues,
        livestream_id: i64,
        comment: &str,
        tip: i64,
    ) -> Result<LivecommentView> {
        let livestream = self.livestreams.get(livestream_id).await?;

        let words = self
            .caches
            .ng_words
            .words_for(livestream.id, livestream.user_id);
        if let Some(hit) = spam_filter::first_hit(comment, &words) {
            metrics::record_spam_rejection();
            warn!(
                livestream_id,
                user_id = session.user_id,
                ng_word_id = hit.id,
                "Rejected comment containing NG-word"
            );
            return Err(LivestreamError::Spam);
        }

        let livecomment = self
            .store
            .insert_livecomment(NewLivecomment {
                user_id: session.user_id,
                livestream_id,
                comment: comment.to_string(),
                tip,
                created_at: chrono::Utc::now().timestamp(),
            })
            .await?;
        info!(
            livecomment_id = livecomment.id,
            livestream_id,
            user_id = session.user_id,
            tip,
            "Livecomment posted"
        );

        let users = self
            .users
            .resolve_many(&[livecomment.user_id, livestream.user_id])
            .await?;
        self.fill(livecomment, &livestream, &users)
    }

    /// Comments on a livestream, newest first.
    pub async fn list(
        &self,
        livestream_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<LivecommentView>> {
        let limit = check_limit(limit)?;
        let livestream = self.livestreams.get(livestream_id).await?;
        let livecomments = self.store.select_livecomments(livestream_id, limit).await?;

        let mut user_ids: Vec<i64> = livecomments.iter().map(|c| c.user_id).collect();
        user_ids.push(livestream.user_id);
        let users = self.users.resolve_many(&user_ids).await?;

        livecomments
            .into_iter()
            .map(|c| self.fill(c, &livestream, &users))
            .collect()
    }

    /// File a report against a comment on `livestream_id`.
    pub async fn report(
        &self,
        session: &SessionValues,
        livestream_id: i64,
        livecomment_id: i64,
    ) -> Result<LivecommentReportView> {
        let livestream = self.livestreams.get(livestream_id).await?;
        let livecomment = self
            .store
            .find_livecomment(livecomment_id)
            .await?
            .filter(|c| c.livestream_id == livestream.id)
            .ok_or_else(|| LivestreamError::NotFound(format!("livecomment {livecomment_id}")))?;

        let report = self
            .store
            .insert_livecomment_report(NewLivecommentReport {
                user_id: session.user_id,
                livestream_id,
                livecomment_id,
                created_at: chrono::Utc::now().timestamp(),
            })
            .await?;
        info!(
            report_id = report.id,
            livestream_id,
            livecomment_id,
            user_id = session.user_id,
            "Livecomment reported"
        );

        let users = self
            .users
            .resolve_many(&[report.user_id, livecomment.user_id, livestream.user_id])
            .await?;
        let reporter = users
            .get(&report.user_id)
            .ok_or_else(|| LivestreamError::NotFound(format!("user {}", report.user_id)))?;
        let reporter = self.users.profile(reporter);
        let livecomment = self.fill(livecomment, &livestream, &users)?;
        Ok(LivecommentReportView::new(&report, reporter, livecomment))
    }

    /// Reports filed on a livestream the session user owns. Reports whose
    /// comment has since been purged are left out.
    pub async fn reports(
        &self,
        session: &SessionValues,
        livestream_id: i64,
    ) -> Result<Vec<LivecommentReportView>> {
        let livestream = self.livestreams.get(livestream_id).await?;
        if livestream.user_id != session.user_id {
            return Err(LivestreamError::Forbidden(format!(
                "user {} does not own livestream {livestream_id}",
                session.user_id
            )));
        }

        let reports = self.store.select_livecomment_reports(livestream_id).await?;
        let mut reported = Vec::with_capacity(reports.len());
        for report in reports {
            match self.store.find_livecomment(report.livecomment_id).await? {
                Some(livecomment) => reported.push((report, livecomment)),
                None => debug!(
                    report_id = report.id,
                    livecomment_id = report.livecomment_id,
                    "Reported livecomment no longer exists"
                ),
            }
        }

        let mut user_ids: Vec<i64> = reported
            .iter()
            .flat_map(|(r, c)| [r.user_id, c.user_id])
            .collect();
        user_ids.push(livestream.user_id);
        let users = self.users.resolve_many(&user_ids).await?;

        reported
            .into_iter()
            .map(|(report, livecomment)| {
                let reporter = users.get(&report.user_id).ok_or_else(|| {
                    LivestreamError::NotFound(format!("user {}", report.user_id))
                })?;
                let reporter = self.users.profile(reporter);
                let livecomment = self.fill(livecomment, &livestream, &users)?;
                Ok(LivecommentReportView::new(&report, reporter, livecomment))
            })
            .collect()
    }

    /// Register an NG-word on a livestream the session user owns and purge
    /// the livestream's existing comments that contain it.
    pub async fn moderate(
        &self,
        session: &SessionValues,
        livestream_id: i64,
        word: &str,
    ) -> Result<ModerationOutcome> {
        if word.is_empty() {
            return Err(LivestreamError::InvalidInput("NG-word is empty".to_string()));
        }

        let livestream = self.livestreams.get(livestream_id).await?;
        if livestream.user_id != session.user_id {
            warn!(
                livestream_id,
                owner_id = livestream.user_id,
                user_id = session.user_id,
                "Moderation attempted by non-owner"
            );
            return Err(LivestreamError::Forbidden(format!(
                "user {} does not own livestream {livestream_id}",
                session.user_id
            )));
        }

        let (ng_word, purged) = self
            .store
            .insert_ng_word_and_purge(NewNgWord {
                user_id: session.user_id,
                livestream_id,
                word: word.to_string(),
                created_at: chrono::Utc::now().timestamp(),
            })
            .await?;
        self.caches.ng_words.add(ng_word.clone());
        metrics::record_purged_livecomments(purged);
        info!(
            livestream_id,
            ng_word_id = ng_word.id,
            purged,
            "NG-word registered"
        );

        Ok(ModerationOutcome {
            ng_word,
            purged_livecomments: purged,
        })
    }

    /// NG-words the session user registered on a livestream, newest first.
    pub fn ng_words(&self, session: &SessionValues, livestream_id: i64) -> Vec<NgWord> {
        self.caches.ng_words.words_for(livestream_id, session.user_id)
    }

    fn fill(
        &self,
        livecomment: Livecomment,
        livestream: &Livestream,
        users: &HashMap<i64, User>,
    ) -> Result<LivecommentView> {
        let author = users
            .get(&livecomment.user_id)
            .ok_or_else(|| LivestreamError::NotFound(format!("user {}", livecomment.user_id)))?;
        let owner = users
            .get(&livestream.user_id)
            .ok_or_else(|| LivestreamError::NotFound(format!("user {}", livestream.user_id)))?;

        let livestream = LivestreamView::new(livestream, self.users.profile(owner));
        Ok(LivecommentView::new(
            livecomment,
            self.users.profile(author),
            livestream,
        ))
    }
}
