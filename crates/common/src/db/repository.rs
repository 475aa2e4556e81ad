//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::errors::{AppError, Result};
use crate::db::DbPool;
use crate::db::models::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input for creating a book (single or bulk)
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genres: Vec<String>,
    pub published_year: i32,
    pub cover_image: Option<String>,
}

/// One row of the rating-stats view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRatingStat {
    pub book_id: Uuid,
    pub avg_rating: f64,
    pub review_count: i64,
}

/// A review joined with its author's public identity
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub book_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: String,
    pub author_id: Uuid,
    /// None when the authoring user has since been deleted
    pub author_username: Option<String>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Book Operations
    // ========================================================================

    /// Create a new book
    pub async fn create_book(&self, input: NewBook) -> Result<Book> {
        validate_new_book(&input)?;

        let now = chrono::Utc::now();

        let book = BookActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            author: Set(input.author),
            genres: Set(input.genres),
            published_year: Set(input.published_year),
            rating: Set(0.0),
            review_refs: Set(Vec::new()),
            cover_image: Set(input.cover_image),
            created_at: Set(now.into()),
        };

        book.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find book by ID
    pub async fn find_book_by_id(&self, id: Uuid) -> Result<Option<Book>> {
        BookEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List all books, newest first
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        BookEntity::find()
            .order_by_desc(BookColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete book by ID. Reviews of the book are intentionally left in
    /// place (no cascade); the rating aggregator and favorites resolution
    /// tolerate the resulting orphans.
    pub async fn delete_book(&self, id: Uuid) -> Result<bool> {
        let result = BookEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Keyword search over title, author, and genres under Postgres
    /// full-text ranking. Returns an empty vec when nothing matches.
    pub async fn search_books(&self, keyword: &str) -> Result<Vec<Book>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT id, title, author, genres, published_year, rating,
                   review_refs, cover_image, created_at
            FROM books
            WHERE to_tsvector('english',
                    title || ' ' || author || ' ' || array_to_string(genres, ' '))
                  @@ plainto_tsquery('english', $1)
            ORDER BY ts_rank_cd(
                    to_tsvector('english',
                        title || ' ' || author || ' ' || array_to_string(genres, ' ')),
                    plainto_tsquery('english', $1)) DESC
            "#,
            vec![keyword.into()],
        );

        BookEntity::find()
            .from_raw_sql(stmt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a batch of books in a single transaction: either every book
    /// is inserted or none are. Returns the inserted count.
    pub async fn bulk_insert_books(&self, inputs: Vec<NewBook>) -> Result<u64> {
        for input in &inputs {
            validate_new_book(input)?;
        }

        if inputs.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now();
        let count = inputs.len() as u64;

        let models: Vec<BookActiveModel> = inputs
            .into_iter()
            .map(|input| BookActiveModel {
                id: Set(Uuid::new_v4()),
                title: Set(input.title),
                author: Set(input.author),
                genres: Set(input.genres),
                published_year: Set(input.published_year),
                rating: Set(0.0),
                review_refs: Set(Vec::new()),
                cover_image: Set(input.cover_image),
                created_at: Set(now.into()),
            })
            .collect();

        let txn = self.write_conn().begin().await?;
        BookEntity::insert_many(models).exec(&txn).await?;
        txn.commit().await?;

        Ok(count)
    }

    /// Replace every occurrence of `old_genre` with `new_genre` across all
    /// books whose genre set contains it. Returns the modified row count.
    pub async fn bulk_update_genre(&self, old_genre: &str, new_genre: &str) -> Result<u64> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            UPDATE books
            SET genres = array_replace(genres, $1, $2)
            WHERE $1 = ANY(genres)
            "#,
            vec![old_genre.into(), new_genre.into()],
        );

        use sea_orm::ConnectionTrait;
        let result = self.write_conn().execute(stmt).await?;

        Ok(result.rows_affected())
    }

    // ========================================================================
    // Review Operations
    // ========================================================================

    /// Find review by ID
    pub async fn find_review_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        ReviewEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List reviews for a book, oldest first
    pub async fn list_reviews_for_book(&self, book_id: Uuid) -> Result<Vec<Review>> {
        ReviewEntity::find()
            .filter(ReviewColumn::BookId.eq(book_id))
            .order_by_asc(ReviewColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List reviews for a book with each author's username joined.
    /// Only the author's public identity is exposed; password hash and
    /// email never leave the database layer.
    pub async fn list_reviews_with_authors(&self, book_id: Uuid) -> Result<Vec<ReviewWithAuthor>> {
        let rows = ReviewEntity::find()
            .filter(ReviewColumn::BookId.eq(book_id))
            .order_by_asc(ReviewColumn::CreatedAt)
            .find_also_related(UserEntity)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(review, author)| ReviewWithAuthor {
                id: review.id,
                book_id: review.book_id,
                rating: review.rating,
                comment: review.comment,
                created_at: review.created_at.to_rfc3339(),
                author_id: review.user_id,
                author_username: author.map(|u| u.username),
            })
            .collect())
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user. Fails with DuplicateEmail when the email is taken.
    pub async fn create_user(
        &self,
        username: String,
        email: String,
        password_hash: String,
        role: String,
    ) -> Result<User> {
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail { email });
        }

        let now = chrono::Utc::now();

        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(role),
            favorite_book_ids: Set(Vec::new()),
            created_at: Set(now.into()),
        };

        user.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>> {
        UserEntity::find()
            .order_by_desc(UserColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete user by ID
    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = UserEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Aggregate Queries
    // ========================================================================

    /// Per-book (average rating, review count) over all books with at
    /// least one review, sorted descending by average. Computed on demand
    /// from the review rows, never cached.
    pub async fn rating_stats(&self) -> Result<Vec<BookRatingStat>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT book_id,
                   AVG(rating)::float8 AS avg_rating,
                   COUNT(*)::int8 AS review_count
            FROM reviews
            GROUP BY book_id
            ORDER BY avg_rating DESC
            "#,
            vec![],
        );

        use sea_orm::ConnectionTrait;
        let results = self
            .read_conn()
            .query_all(stmt)
            .await?
            .into_iter()
            .filter_map(|row| {
                Some(BookRatingStat {
                    book_id: row.try_get_by_index::<Uuid>(0).ok()?,
                    avg_rating: row.try_get_by_index::<f64>(1).ok()?,
                    review_count: row.try_get_by_index::<i64>(2).ok()?,
                })
            })
            .collect();

        Ok(results)
    }

    /// Review count per authoring user. Users with zero reviews do not
    /// appear in the result.
    pub async fn review_counts_by_user(&self) -> Result<Vec<(Uuid, i64)>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT user_id, COUNT(*)::int8 AS review_count
            FROM reviews
            GROUP BY user_id
            ORDER BY review_count DESC
            "#,
            vec![],
        );

        use sea_orm::ConnectionTrait;
        let results = self
            .read_conn()
            .query_all(stmt)
            .await?
            .into_iter()
            .filter_map(|row| {
                Some((
                    row.try_get_by_index::<Uuid>(0).ok()?,
                    row.try_get_by_index::<i64>(1).ok()?,
                ))
            })
            .collect();

        Ok(results)
    }
}

/// Validate a book input before insertion
pub fn validate_new_book(input: &NewBook) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(AppError::MissingField {
            field: "title".to_string(),
        });
    }

    if input.author.trim().is_empty() {
        return Err(AppError::MissingField {
            field: "author".to_string(),
        });
    }

    if input.genres.is_empty() || input.genres.iter().any(|g| g.trim().is_empty()) {
        return Err(AppError::Validation {
            message: "at least one non-empty genre is required".to_string(),
            field: Some("genres".to_string()),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> NewBook {
        NewBook {
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            genres: vec!["Science Fiction".to_string()],
            published_year: 1969,
            cover_image: None,
        }
    }

    #[test]
    fn test_valid_book_passes() {
        assert!(validate_new_book(&sample_book()).is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut book = sample_book();
        book.title = "   ".to_string();
        assert!(matches!(
            validate_new_book(&book),
            Err(AppError::MissingField { .. })
        ));
    }

    #[test]
    fn test_missing_author_rejected() {
        let mut book = sample_book();
        book.author = String::new();
        assert!(validate_new_book(&book).is_err());
    }

    #[test]
    fn test_empty_genres_rejected() {
        let mut book = sample_book();
        book.genres.clear();
        assert!(matches!(
            validate_new_book(&book),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_blank_genre_label_rejected() {
        let mut book = sample_book();
        book.genres.push("".to_string());
        assert!(validate_new_book(&book).is_err());
    }
}
