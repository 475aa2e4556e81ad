//! Shelfwise Common Library
//!
//! Shared code for the Shelfwise services including:
//! - Database models and repository patterns
//! - Catalog core (rating aggregation, favorites, stats)
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use catalog::{FavoritesManager, RatingAggregator, StatsReporter};
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Valid review ratings are 1..=5 inclusive
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
