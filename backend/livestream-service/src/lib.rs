pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod session;
pub mod store;

pub use cache::CacheLayer;
pub use config::Config;
pub use error::{LivestreamError, Result};
pub use services::Services;
pub use session::SessionValues;
pub use store::EntityStore;
