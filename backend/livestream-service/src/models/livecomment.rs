use super::livestream::LivestreamView;
use super::user::UserProfile;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Livecomment {
    pub id: i64,
    pub user_id: i64,
    pub livestream_id: i64,
    pub comment: String,
    pub tip: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLivecomment {
    pub user_id: i64,
    pub livestream_id: i64,
    pub comment: String,
    pub tip: i64,
    pub created_at: i64,
}

impl NewLivecomment {
    pub fn into_livecomment(self, id: i64) -> Livecomment {
        Livecomment {
            id,
            user_id: self.user_id,
            livestream_id: self.livestream_id,
            comment: self.comment,
            tip: self.tip,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LivecommentView {
    pub id: i64,
    pub user: UserProfile,
    pub livestream: LivestreamView,
    pub comment: String,
    pub tip: i64,
    pub created_at: i64,
}

impl LivecommentView {
    pub fn new(livecomment: Livecomment, user: UserProfile, livestream: LivestreamView) -> Self {
        Self {
            id: livecomment.id,
            user,
            livestream,
            comment: livecomment.comment,
            tip: livecomment.tip,
            created_at: livecomment.created_at,
        }
    }
}
