//! Catalog core
//!
//! The pieces with real invariants:
//! - rating aggregation (book rating == mean of its current reviews)
//! - favorites with soft book references
//! - on-demand aggregate stats

pub mod favorites;
pub mod ratings;
pub mod stats;

pub use favorites::FavoritesManager;
pub use ratings::{mean_rating, NewReview, RatingAggregator};
pub use stats::{ReviewCountBucket, StatsReporter};
