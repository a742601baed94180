use super::livestream::LivestreamView;
use super::user::UserProfile;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Reaction {
    pub id: i64,
    pub user_id: i64,
    pub livestream_id: i64,
    pub emoji_name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReaction {
    pub user_id: i64,
    pub livestream_id: i64,
    pub emoji_name: String,
    pub created_at: i64,
}

impl NewReaction {
    pub fn into_reaction(self, id: i64) -> Reaction {
        Reaction {
            id,
            user_id: self.user_id,
            livestream_id: self.livestream_id,
            emoji_name: self.emoji_name,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionView {
    pub id: i64,
    pub emoji_name: String,
    pub user: UserProfile,
    pub livestream: LivestreamView,
    pub created_at: i64,
}

impl ReactionView {
    pub fn new(reaction: Reaction, user: UserProfile, livestream: LivestreamView) -> Self {
        Self {
            id: reaction.id,
            emoji_name: reaction.emoji_name,
            user,
            livestream,
            created_at: reaction.created_at,
        }
    }
}
