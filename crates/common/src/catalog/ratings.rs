//! Rating aggregation
//!
//! Keeps `Book.rating` equal to the mean of its reviews' ratings. Every
//! review create/delete runs in one transaction that also updates the
//! book's `review_refs` cache and recomputes the rating from a fresh read
//! of the full review set. Recomputation (not an incremental delta) is the
//! required strategy: each persisted value is then consistent with an
//! actual snapshot of the review set even under concurrent edits.
//!
//! Ordering across concurrent recomputes of the same book is
//! last-writer-wins; that is an accepted weak-consistency limitation.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::{MAX_RATING, MIN_RATING};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

/// Input for creating a review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub book_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

/// Recomputes a book's derived rating on every review mutation
#[derive(Clone)]
pub struct RatingAggregator {
    pool: DbPool,
}

impl RatingAggregator {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a review and synchronously recompute the book's rating.
    ///
    /// In one transaction: inserts the review, appends its id to the
    /// book's `review_refs`, re-reads all reviews for the book, and
    /// persists the new mean.
    pub async fn review_created(&self, author_id: Uuid, input: NewReview) -> Result<Review> {
        validate_review(&input)?;

        let txn = self.pool.write().begin().await?;

        let book = BookEntity::find_by_id(input.book_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::BookNotFound {
                id: input.book_id.to_string(),
            })?;

        let now = chrono::Utc::now();

        let review = ReviewActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(author_id),
            book_id: Set(input.book_id),
            rating: Set(input.rating),
            comment: Set(input.comment),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let mut refs = book.review_refs.clone();
        refs.push(review.id);

        let ratings = ratings_for_book(&txn, input.book_id).await?;
        let new_rating = mean_rating(&ratings);

        let mut active: BookActiveModel = book.into();
        active.review_refs = Set(refs);
        active.rating = Set(new_rating);
        active.update(&txn).await?;

        txn.commit().await?;

        metrics::record_review_created();

        tracing::info!(
            review_id = %review.id,
            book_id = %review.book_id,
            rating = new_rating,
            "Review created, book rating recomputed"
        );

        Ok(review)
    }

    /// Delete a review and synchronously recompute the book's rating.
    ///
    /// Fails with ReviewNotFound when the review does not exist. The
    /// review row, its entry in the book's `review_refs`, and the rating
    /// update commit as one unit. Returns the book's new rating (0 when
    /// no reviews remain, or when the owning book was already deleted).
    pub async fn review_deleted(&self, review_id: Uuid) -> Result<f64> {
        let txn = self.pool.write().begin().await?;

        let review = ReviewEntity::find_by_id(review_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?;

        let book_id = review.book_id;
        review.delete(&txn).await?;

        // The owning book may be gone: book deletion does not cascade to
        // reviews, so orphaned reviews remain deletable.
        let new_rating = match BookEntity::find_by_id(book_id).one(&txn).await? {
            Some(book) => {
                let refs: Vec<Uuid> = book
                    .review_refs
                    .iter()
                    .copied()
                    .filter(|id| *id != review_id)
                    .collect();

                let ratings = ratings_for_book(&txn, book_id).await?;
                let new_rating = mean_rating(&ratings);

                let mut active: BookActiveModel = book.into();
                active.review_refs = Set(refs);
                active.rating = Set(new_rating);
                active.update(&txn).await?;

                new_rating
            }
            None => 0.0,
        };

        txn.commit().await?;

        metrics::record_review_deleted();

        tracing::info!(
            review_id = %review_id,
            book_id = %book_id,
            rating = new_rating,
            "Review deleted, book rating recomputed"
        );

        Ok(new_rating)
    }
}

/// Fetch the ratings of all reviews currently referencing a book
async fn ratings_for_book<C: ConnectionTrait>(conn: &C, book_id: Uuid) -> Result<Vec<i32>> {
    Ok(ReviewEntity::find()
        .filter(ReviewColumn::BookId.eq(book_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.rating)
        .collect())
}

/// Arithmetic mean of the given ratings; exactly 0 for an empty set
pub fn mean_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    sum as f64 / ratings.len() as f64
}

/// Validate a review input before insertion
pub fn validate_review(input: &NewReview) -> Result<()> {
    if input.rating < MIN_RATING || input.rating > MAX_RATING {
        return Err(AppError::Validation {
            message: format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, input.rating
            ),
            field: Some("rating".to_string()),
        });
    }

    if input.comment.trim().is_empty() {
        return Err(AppError::MissingField {
            field: "comment".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i32) -> NewReview {
        NewReview {
            book_id: Uuid::new_v4(),
            rating,
            comment: "solid read".to_string(),
        }
    }

    #[test]
    fn test_mean_of_reviews() {
        assert_eq!(mean_rating(&[4, 5, 3]), 4.0);
        assert_eq!(mean_rating(&[4, 5]), 4.5);
        assert_eq!(mean_rating(&[5]), 5.0);
    }

    #[test]
    fn test_mean_of_empty_set_is_zero() {
        let rating = mean_rating(&[]);
        assert_eq!(rating, 0.0);
        assert!(!rating.is_nan());
    }

    #[test]
    fn test_delete_scenario() {
        // [4,5,3] -> 4.0; drop the 3 -> 4.5; drop the rest -> 0
        assert_eq!(mean_rating(&[4, 5, 3]), 4.0);
        assert_eq!(mean_rating(&[4, 5]), 4.5);
        assert_eq!(mean_rating(&[]), 0.0);
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_review(&review(0)).is_err());
        assert!(validate_review(&review(6)).is_err());
        assert!(validate_review(&review(1)).is_ok());
        assert!(validate_review(&review(5)).is_ok());
    }

    #[test]
    fn test_blank_comment_rejected() {
        let mut input = review(4);
        input.comment = "  ".to_string();
        assert!(matches!(
            validate_review(&input),
            Err(AppError::MissingField { .. })
        ));
    }
}
