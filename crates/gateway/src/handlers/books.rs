//! Book management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use shelfwise_common::{
    auth::AuthContext,
    catalog::StatsReporter,
    db::{models::Book, BookRatingStat, NewBook, Repository},
    errors::{AppError, Result},
    metrics,
};

/// Request to create a book (also the element type for bulk insert)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[validate(length(min = 1, max = 500))]
    pub author: String,

    #[validate(length(min = 1))]
    pub genres: Vec<String>,

    pub published_year: i32,

    pub cover_image: Option<String>,
}

impl From<CreateBookRequest> for NewBook {
    fn from(request: CreateBookRequest) -> Self {
        NewBook {
            title: request.title,
            author: request.author,
            genres: request.genres,
            published_year: request.published_year,
            cover_image: request.cover_image,
        }
    }
}

/// Request for bulk insertion
#[derive(Debug, Deserialize)]
pub struct BulkInsertRequest {
    pub books: Vec<CreateBookRequest>,
}

#[derive(Serialize)]
pub struct BulkInsertResponse {
    pub inserted_count: u64,
}

/// Request to rename a genre across the catalog
#[derive(Debug, Deserialize, Validate)]
pub struct BulkUpdateGenreRequest {
    #[validate(length(min = 1))]
    pub old_genre: String,

    #[validate(length(min = 1))]
    pub new_genre: String,
}

#[derive(Serialize)]
pub struct BulkUpdateGenreResponse {
    pub modified_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// Response for a single book
#[derive(Serialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genres: Vec<String>,
    pub published_year: i32,
    pub rating: f64,
    pub review_count: usize,
    pub cover_image: Option<String>,
    pub created_at: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        BookResponse {
            id: book.id,
            title: book.title,
            author: book.author,
            genres: book.genres,
            published_year: book.published_year,
            rating: book.rating,
            review_count: book.review_refs.len(),
            cover_image: book.cover_image,
            created_at: book.created_at.to_rfc3339(),
        }
    }
}

/// Create a new book (admin only)
pub async fn create_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>)> {
    auth.require_admin()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let book = repo.create_book(request.into()).await?;

    tracing::info!(
        book_id = %book.id,
        title = %book.title,
        "Book created"
    );

    Ok((StatusCode::CREATED, Json(book.into())))
}

/// List all books
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<BookResponse>>> {
    let repo = Repository::new(state.db.clone());
    let books = repo.list_books().await?;

    Ok(Json(books.into_iter().map(Into::into).collect()))
}

/// Keyword search over title, author, and genres
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BookResponse>>> {
    let repo = Repository::new(state.db.clone());
    let books = repo.search_books(&params.q).await?;

    metrics::record_book_search();

    Ok(Json(books.into_iter().map(Into::into).collect()))
}

/// Delete a book (admin only)
pub async fn delete_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_admin()?;

    let repo = Repository::new(state.db.clone());

    if !repo.delete_book(book_id).await? {
        return Err(AppError::BookNotFound {
            id: book_id.to_string(),
        });
    }

    tracing::info!(book_id = %book_id, "Book deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Insert a batch of books in one transaction (admin only).
/// All-or-nothing: any invalid or failing book aborts the whole batch.
pub async fn bulk_insert_books(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<BulkInsertRequest>,
) -> Result<(StatusCode, Json<BulkInsertResponse>)> {
    auth.require_admin()?;

    for book in &request.books {
        book.validate().map_err(|e| AppError::Validation {
            message: e.to_string(),
            field: None,
        })?;
    }

    let repo = Repository::new(state.db.clone());
    let inserted_count = repo
        .bulk_insert_books(request.books.into_iter().map(Into::into).collect())
        .await?;

    tracing::info!(inserted_count, "Books bulk inserted");

    Ok((
        StatusCode::CREATED,
        Json(BulkInsertResponse { inserted_count }),
    ))
}

/// Rename a genre across every book containing it (admin only)
pub async fn bulk_update_genre(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<BulkUpdateGenreRequest>,
) -> Result<Json<BulkUpdateGenreResponse>> {
    auth.require_admin()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let modified_count = repo
        .bulk_update_genre(&request.old_genre, &request.new_genre)
        .await?;

    tracing::info!(
        old_genre = %request.old_genre,
        new_genre = %request.new_genre,
        modified_count,
        "Genre renamed"
    );

    Ok(Json(BulkUpdateGenreResponse { modified_count }))
}

/// Per-book average rating and review count, sorted descending by average
pub async fn rating_stats(State(state): State<AppState>) -> Result<Json<Vec<BookRatingStat>>> {
    let reporter = StatsReporter::new(Repository::new(state.db.clone()));
    let stats = reporter.rating_stats().await?;

    Ok(Json(stats))
}
