use crate::error::{LivestreamError, Result};
use serde::{Deserialize, Serialize};

/// Session fields as decoded by the transport layer, before verification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSession {
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
}

/// A verified session. Holding one means both fields were present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionValues {
    pub user_id: i64,
    pub user_name: String,
}

impl SessionValues {
    pub fn new(user_id: i64, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

impl TryFrom<RawSession> for SessionValues {
    type Error = LivestreamError;

    fn try_from(raw: RawSession) -> Result<Self> {
        let user_id = raw
            .user_id
            .filter(|id| *id != 0)
            .ok_or_else(|| LivestreamError::Unauthorized("session has no user id".to_string()))?;
        let user_name = raw
            .user_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                LivestreamError::Unauthorized("session has no user name".to_string())
            })?;

        Ok(Self { user_id, user_name })
    }
}
