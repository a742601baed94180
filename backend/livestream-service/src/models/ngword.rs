use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A banned substring registered by a streamer for one of their livestreams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NgWord {
    pub id: i64,
    pub user_id: i64,
    pub livestream_id: i64,
    pub word: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNgWord {
    pub user_id: i64,
    pub livestream_id: i64,
    pub word: String,
    pub created_at: i64,
}

impl NewNgWord {
    pub fn into_ng_word(self, id: i64) -> NgWord {
        NgWord {
            id,
            user_id: self.user_id,
            livestream_id: self.livestream_id,
            word: self.word,
            created_at: self.created_at,
        }
    }
}
