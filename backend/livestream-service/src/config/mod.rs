use crate::error::Result;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// sha256 of the bundled "no image" icon.
pub const DEFAULT_FALLBACK_ICON_HASH: &str =
    "d9f8294e9d895f81ce62e73dc7d5dff862a4fa40bd4e0fecf53f7526a8edcac0";

const ENV_PREFIX: &str = "LIVESTREAM_";

#[derive(Clone, Deserialize)]
pub struct Config {
    // Service configuration
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    // Database configuration
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    // Cache configuration
    #[serde(default = "default_warmup_on_start")]
    pub warmup_on_start: bool,

    // Reservation term
    #[serde(default = "default_reservation_term_start")]
    pub reservation_term_start: i64,
    #[serde(default = "default_reservation_term_end")]
    pub reservation_term_end: i64,
    #[serde(default = "default_reservation_slot_secs")]
    pub reservation_slot_secs: i64,

    #[serde(default = "default_fallback_icon_hash")]
    pub fallback_icon_hash: String,
}

/// Bookable term and slot width, all in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationConfig {
    pub term_start: i64,
    pub term_end: i64,
    pub slot_secs: i64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("service_name", &self.service_name)
            .field("environment", &self.environment)
            .field("http_port", &self.http_port)
            .field("database_url", &"[REDACTED]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("warmup_on_start", &self.warmup_on_start)
            .field("reservation", &self.reservation())
            .field("fallback_icon_hash", &self.fallback_icon_hash)
            .finish()
    }
}

impl Config {
    /// Load `.env` (if any) and read `LIVESTREAM_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::prefixed(ENV_PREFIX).from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn reservation(&self) -> ReservationConfig {
        ReservationConfig {
            term_start: self.reservation_term_start,
            term_end: self.reservation_term_end,
            slot_secs: self.reservation_slot_secs,
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        use crate::error::LivestreamError;

        if self.db_min_connections > self.db_max_connections {
            return Err(LivestreamError::Config(format!(
                "db_min_connections ({}) exceeds db_max_connections ({})",
                self.db_min_connections, self.db_max_connections
            )));
        }
        if self.reservation_slot_secs <= 0 {
            return Err(LivestreamError::Config(
                "reservation_slot_secs must be positive".to_string(),
            ));
        }
        if self.reservation_term_end <= self.reservation_term_start {
            return Err(LivestreamError::Config(
                "reservation term end must be after its start".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            http_port: default_http_port(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            warmup_on_start: default_warmup_on_start(),
            reservation_term_start: default_reservation_term_start(),
            reservation_term_end: default_reservation_term_end(),
            reservation_slot_secs: default_reservation_slot_secs(),
            fallback_icon_hash: default_fallback_icon_hash(),
        }
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            term_start: default_reservation_term_start(),
            term_end: default_reservation_term_end(),
            slot_secs: default_reservation_slot_secs(),
        }
    }
}

// Default functions
fn default_service_name() -> String {
    "livestream-service".to_string()
}
fn default_environment() -> String {
    "development".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_database_url() -> String {
    "postgres://localhost/livestream".to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_acquire_timeout_secs() -> u64 {
    10
}
fn default_warmup_on_start() -> bool {
    true
}
// 2023-11-25T01:00:00Z
fn default_reservation_term_start() -> i64 {
    1_700_874_000
}
// 2024-11-25T01:00:00Z
fn default_reservation_term_end() -> i64 {
    1_732_496_400
}
fn default_reservation_slot_secs() -> i64 {
    3600
}
fn default_fallback_icon_hash() -> String {
    DEFAULT_FALLBACK_ICON_HASH.to_string()
}
