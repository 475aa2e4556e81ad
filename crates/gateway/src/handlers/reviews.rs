//! Review handlers
//!
//! Review creation and deletion route through the rating aggregator so the
//! book's derived rating is recomputed in the same transaction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use shelfwise_common::{
    auth::AuthContext,
    catalog::{NewReview, RatingAggregator},
    db::{models::Review, Repository, ReviewWithAuthor},
    errors::{AppError, Result},
};

/// Request to create a review
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub book_id: Uuid,

    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[validate(length(min = 1, max = 10000))]
    pub comment: String,
}

/// Response for a single review
#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            id: review.id,
            book_id: review.book_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.to_rfc3339(),
        }
    }
}

/// Response after deleting a review
#[derive(Serialize)]
pub struct DeleteReviewResponse {
    pub new_rating: f64,
}

/// Create a review for a book; recomputes the book's rating
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let aggregator = RatingAggregator::new(state.db.clone());
    let review = aggregator
        .review_created(
            auth.user_id,
            NewReview {
                book_id: request.book_id,
                rating: request.rating,
                comment: request.comment,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(review.into())))
}

/// List reviews for a book with each author's username joined
pub async fn list_reviews_for_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewWithAuthor>>> {
    let repo = Repository::new(state.db.clone());
    let reviews = repo.list_reviews_with_authors(book_id).await?;

    Ok(Json(reviews))
}

/// Delete a review (author or admin); recomputes the book's rating and
/// returns the new value
pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(review_id): Path<Uuid>,
) -> Result<Json<DeleteReviewResponse>> {
    let repo = Repository::new(state.db.clone());

    let review = repo
        .find_review_by_id(review_id)
        .await?
        .ok_or_else(|| AppError::ReviewNotFound {
            id: review_id.to_string(),
        })?;

    if review.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Forbidden {
            message: "Only the review's author or an admin may delete it".to_string(),
        });
    }

    let aggregator = RatingAggregator::new(state.db.clone());
    let new_rating = aggregator.review_deleted(review_id).await?;

    Ok(Json(DeleteReviewResponse { new_rating }))
}
