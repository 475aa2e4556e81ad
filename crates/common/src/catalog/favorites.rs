//! Favorites with soft book references
//!
//! Favorite entries are raw book ids resolved lazily at read time. A book
//! does not need to exist when favorited, and may be deleted afterwards;
//! ids that no longer resolve are dropped from reads, never an error.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter, Statement};
use std::collections::HashMap;
use uuid::Uuid;

/// Maintains per-user favorite book references
#[derive(Clone)]
pub struct FavoritesManager {
    pool: DbPool,
}

impl FavoritesManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append a book id to the user's favorites. The book is not checked
    /// for existence, and repeated adds accumulate duplicates.
    pub async fn add_favorite(&self, user_id: Uuid, book_id: Uuid) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            UPDATE users
            SET favorite_book_ids = array_append(favorite_book_ids, $2)
            WHERE id = $1
            "#,
            vec![user_id.into(), book_id.into()],
        );

        self.pool.write().execute(stmt).await?;

        tracing::debug!(user_id = %user_id, book_id = %book_id, "Favorite added");

        Ok(())
    }

    /// Remove every occurrence of a book id from the user's favorites.
    /// Succeeds even when the id was never present.
    pub async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            UPDATE users
            SET favorite_book_ids = array_remove(favorite_book_ids, $2)
            WHERE id = $1
            "#,
            vec![user_id.into(), book_id.into()],
        );

        self.pool.write().execute(stmt).await?;

        tracing::debug!(user_id = %user_id, book_id = %book_id, "Favorite removed");

        Ok(())
    }

    /// Resolve the user's favorites to book entities, in stored order.
    /// Ids of since-deleted books are silently dropped.
    pub async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Book>> {
        let user = UserEntity::find_by_id(user_id)
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: user_id.to_string(),
            })?;

        let ids = user.favorite_book_ids;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let books = BookEntity::find()
            .filter(BookColumn::Id.is_in(ids.clone()))
            .all(self.pool.read())
            .await?;

        let by_id: HashMap<Uuid, Book> = books.into_iter().map(|b| (b.id, b)).collect();

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }
}
