use super::check_limit;
use super::livestreams::LivestreamService;
use super::users::UserService;
use crate::error::{LivestreamError, Result};
use crate::models::{LivestreamView, NewReaction, Reaction, ReactionView};
use crate::session::SessionValues;
use crate::store::EntityStore;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ReactionService {
    store: Arc<dyn EntityStore>,
    users: UserService,
    livestreams: LivestreamService,
}

impl ReactionService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        users: UserService,
        livestreams: LivestreamService,
    ) -> Self {
        Self {
            store,
            users,
            livestreams,
        }
    }

    pub async fn post(
        &self,
        session: &SessionValues,
        livestream_id: i64,
        emoji_name: &str,
    ) -> Result<ReactionView> {
        if emoji_name.is_empty() {
            return Err(LivestreamError::InvalidInput("emoji name is empty".to_string()));
        }
        let livestream = self.livestreams.get(livestream_id).await?;

        let reaction = self
            .store
            .insert_reaction(NewReaction {
                user_id: session.user_id,
                livestream_id: livestream.id,
                emoji_name: emoji_name.to_string(),
                created_at: chrono::Utc::now().timestamp(),
            })
            .await?;
        info!(
            reaction_id = reaction.id,
            livestream_id,
            user_id = session.user_id,
            emoji = %reaction.emoji_name,
            "Reaction posted"
        );

        let livestream = self.livestreams.view(&livestream).await?;
        self.fill(reaction, &livestream).await
    }

    /// Reactions on a livestream, newest first.
    pub async fn list(&self, livestream_id: i64, limit: Option<i64>) -> Result<Vec<ReactionView>> {
        let limit = check_limit(limit)?;
        let livestream = self.livestreams.view_by_id(livestream_id).await?;
        let reactions = self.store.select_reactions(livestream_id, limit).await?;

        let user_ids: Vec<i64> = reactions.iter().map(|r| r.user_id).collect();
        let users = self.users.resolve_many(&user_ids).await?;

        reactions
            .into_iter()
            .map(|reaction| {
                let user = users.get(&reaction.user_id).ok_or_else(|| {
                    LivestreamError::NotFound(format!("user {}", reaction.user_id))
                })?;
                Ok(ReactionView::new(
                    reaction,
                    self.users.profile(user),
                    livestream.clone(),
                ))
            })
            .collect()
    }

    async fn fill(&self, reaction: Reaction, livestream: &LivestreamView) -> Result<ReactionView> {
        let user = self.users.get(reaction.user_id).await?;
        Ok(ReactionView::new(
            reaction,
            self.users.profile(&user),
            livestream.clone(),
        ))
    }
}
