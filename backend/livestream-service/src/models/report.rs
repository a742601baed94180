use super::livecomment::LivecommentView;
use super::user::UserProfile;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A viewer's report against one livecomment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LivecommentReport {
    pub id: i64,
    pub user_id: i64,
    pub livestream_id: i64,
    pub livecomment_id: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLivecommentReport {
    pub user_id: i64,
    pub livestream_id: i64,
    pub livecomment_id: i64,
    pub created_at: i64,
}

impl NewLivecommentReport {
    pub fn into_report(self, id: i64) -> LivecommentReport {
        LivecommentReport {
            id,
            user_id: self.user_id,
            livestream_id: self.livestream_id,
            livecomment_id: self.livecomment_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LivecommentReportView {
    pub id: i64,
    pub reporter: UserProfile,
    pub livecomment: LivecommentView,
    pub created_at: i64,
}

impl LivecommentReportView {
    pub fn new(
        report: &LivecommentReport,
        reporter: UserProfile,
        livecomment: LivecommentView,
    ) -> Self {
        Self {
            id: report.id,
            reporter,
            livecomment,
            created_at: report.created_at,
        }
    }
}
