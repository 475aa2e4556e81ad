//! On-demand aggregate stats
//!
//! Read-only views computed from the review rows on every call; nothing
//! is cached or incrementally maintained.

use crate::db::{BookRatingStat, Repository};
use crate::errors::Result;
use serde::Serialize;
use uuid::Uuid;

/// Review-count bucket boundaries: [1,5), [5,10), [10,20), then "20+"
const BUCKET_BOUNDARIES: [i64; 4] = [1, 5, 10, 20];

/// One review-count bucket: the users whose authored-review count falls
/// inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCountBucket {
    pub label: String,
    pub users: Vec<Uuid>,
    pub count: u64,
}

/// Computes aggregate reporting views over the catalog
#[derive(Clone)]
pub struct StatsReporter {
    repo: Repository,
}

impl StatsReporter {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// (average rating, review count) per book with at least one review,
    /// sorted descending by average rating
    pub async fn rating_stats(&self) -> Result<Vec<BookRatingStat>> {
        self.repo.rating_stats().await
    }

    /// Users partitioned by authored-review count into the boundary
    /// buckets. Users with zero reviews never appear; empty buckets are
    /// omitted.
    pub async fn review_count_buckets(&self) -> Result<Vec<ReviewCountBucket>> {
        let counts = self.repo.review_counts_by_user().await?;
        Ok(bucket_review_counts(counts))
    }
}

/// Partition (user, review count) pairs into the boundary buckets
pub fn bucket_review_counts(counts: Vec<(Uuid, i64)>) -> Vec<ReviewCountBucket> {
    let mut buckets: Vec<ReviewCountBucket> = bucket_labels()
        .into_iter()
        .map(|label| ReviewCountBucket {
            label,
            users: Vec::new(),
            count: 0,
        })
        .collect();

    for (user_id, count) in counts {
        if let Some(index) = bucket_index(count) {
            buckets[index].users.push(user_id);
            buckets[index].count += 1;
        }
    }

    buckets.retain(|b| b.count > 0);
    buckets
}

fn bucket_labels() -> Vec<String> {
    let mut labels: Vec<String> = BUCKET_BOUNDARIES
        .windows(2)
        .map(|pair| format!("[{},{})", pair[0], pair[1]))
        .collect();
    labels.push(format!("{}+", BUCKET_BOUNDARIES[BUCKET_BOUNDARIES.len() - 1]));
    labels
}

fn bucket_index(count: i64) -> Option<usize> {
    if count < BUCKET_BOUNDARIES[0] {
        return None;
    }

    for (i, pair) in BUCKET_BOUNDARIES.windows(2).enumerate() {
        if count < pair[1] {
            return Some(i);
        }
    }

    Some(BUCKET_BOUNDARIES.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_scenario() {
        // counts [1,4,5,19,20] -> {[1,5): 2, [5,10): 1, [10,20): 1, 20+: 1}
        let counts: Vec<(Uuid, i64)> = [1, 4, 5, 19, 20]
            .into_iter()
            .map(|c| (Uuid::new_v4(), c))
            .collect();

        let buckets = bucket_review_counts(counts);

        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].label, "[1,5)");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[1].label, "[5,10)");
        assert_eq!(buckets[1].count, 1);
        assert_eq!(buckets[2].label, "[10,20)");
        assert_eq!(buckets[2].count, 1);
        assert_eq!(buckets[3].label, "20+");
        assert_eq!(buckets[3].count, 1);
    }

    #[test]
    fn test_empty_buckets_omitted() {
        let counts = vec![(Uuid::new_v4(), 2), (Uuid::new_v4(), 25)];
        let buckets = bucket_review_counts(counts);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "[1,5)");
        assert_eq!(buckets[1].label, "20+");
    }

    #[test]
    fn test_boundary_values() {
        assert_eq!(bucket_index(1), Some(0));
        assert_eq!(bucket_index(4), Some(0));
        assert_eq!(bucket_index(5), Some(1));
        assert_eq!(bucket_index(10), Some(2));
        assert_eq!(bucket_index(19), Some(2));
        assert_eq!(bucket_index(20), Some(3));
        assert_eq!(bucket_index(1000), Some(3));
    }

    #[test]
    fn test_zero_counts_never_bucketed() {
        assert_eq!(bucket_index(0), None);
        let buckets = bucket_review_counts(vec![(Uuid::new_v4(), 0)]);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_user_ids_collected_in_bucket() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let buckets = bucket_review_counts(vec![(a, 2), (b, 3)]);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].users, vec![a, b]);
    }
}
