use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One entry of a livestream's viewer history. Leaving the livestream deletes
/// the viewer's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LivestreamViewer {
    pub user_id: i64,
    pub livestream_id: i64,
    pub created_at: i64,
}
