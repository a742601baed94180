use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Which score table a ranking reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    User,
    Livestream,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::User => "user",
            SubjectKind::Livestream => "livestream",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ScoreEntry {
    pub subject_id: i64,
    pub score: i64,
}

/// Aggregates over every livestream a user owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserActivity {
    pub viewers_count: i64,
    pub total_reactions: i64,
    pub total_livecomments: i64,
    pub total_tip: i64,
    pub favorite_emoji: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivestreamActivity {
    pub viewers_count: i64,
    pub total_reactions: i64,
    pub total_reports: i64,
    pub max_tip: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatistics {
    pub rank: i64,
    pub viewers_count: i64,
    pub total_reactions: i64,
    pub total_livecomments: i64,
    pub total_tip: i64,
    pub favorite_emoji: String,
}

impl UserStatistics {
    pub fn new(rank: i64, activity: UserActivity) -> Self {
        Self {
            rank,
            viewers_count: activity.viewers_count,
            total_reactions: activity.total_reactions,
            total_livecomments: activity.total_livecomments,
            total_tip: activity.total_tip,
            favorite_emoji: activity.favorite_emoji,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LivestreamStatistics {
    pub rank: i64,
    pub viewers_count: i64,
    pub total_reactions: i64,
    pub total_reports: i64,
    pub max_tip: i64,
}

impl LivestreamStatistics {
    pub fn new(rank: i64, activity: LivestreamActivity) -> Self {
        Self {
            rank,
            viewers_count: activity.viewers_count,
            total_reactions: activity.total_reactions,
            total_reports: activity.total_reports,
            max_tip: activity.max_tip,
        }
    }
}
