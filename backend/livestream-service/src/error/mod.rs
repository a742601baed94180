use thiserror::Error;

#[derive(Debug, Error)]
pub enum LivestreamError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Failure reported by a non-SQL store backend.
    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No reservation capacity left between slots {start_slot} and {end_slot}")]
    ReservationUnavailable { start_slot: i64, end_slot: i64 },

    #[error("Comment rejected as spam")]
    Spam,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LivestreamError {
    /// True when the error came out of the entity store rather than from
    /// validation in this crate.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            LivestreamError::Database(_) | LivestreamError::Store(_) | LivestreamError::Migration(_)
        )
    }
}

impl From<envy::Error> for LivestreamError {
    fn from(err: envy::Error) -> Self {
        LivestreamError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LivestreamError>;
