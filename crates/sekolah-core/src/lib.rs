pub mod auth;
pub mod config;
pub mod engagement;
pub mod error;
pub mod ip;
pub mod models;
pub mod stats;
pub mod store;
pub mod tracing_setup;

pub use config::CoreConfig;
pub use engagement::{EngagementStore, LikeOutcome, HOME_LIMIT};
pub use error::{CoreError, Result};
