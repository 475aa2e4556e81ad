//! User handlers: registration, login, account management, favorites,
//! and the review-count bucket report

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
    auth::{self, AuthContext, Role},
    catalog::{FavoritesManager, ReviewCountBucket, StatsReporter},
    db::{models::User, Repository},
    errors::{AppError, Result},
};

use super::books::BookResponse;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 200))]
    pub password: String,

    /// Only the literal "admin" is honored; anything else becomes "user"
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Public view of a user; the password hash never leaves the server
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let role = match request.role.as_deref() {
        Some("admin") => Role::Admin,
        _ => Role::User,
    };

    let password_hash = auth::hash_password(&request.password)?;

    let repo = Repository::new(state.db.clone());
    let user = repo
        .create_user(request.username, request.email, password_hash, role.into())
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            role,
        }),
    ))
}

/// Log in with email and password, returning a JWT
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_email(&request.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth::verify_password(&request.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.jwt.generate_token(user.id, Role::parse(&user.role))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse { token }))
}

/// List all users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<UserResponse>>> {
    auth.require_admin()?;

    let repo = Repository::new(state.db.clone());
    let users = repo.list_users().await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// The caller's own record
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> Result<Json<UserResponse>> {
    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound {
            id: auth.user_id.to_string(),
        })?;

    Ok(Json(user.into()))
}

/// Delete a user (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_admin()?;

    let repo = Repository::new(state.db.clone());

    if !repo.delete_user(user_id).await? {
        return Err(AppError::UserNotFound {
            id: user_id.to_string(),
        });
    }

    tracing::info!(user_id = %user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// The caller's favorites, resolved to books; dangling references are
/// dropped from the result
pub async fn list_favorites(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<BookResponse>>> {
    let favorites = FavoritesManager::new(state.db.clone());
    let books = favorites.list_favorites(auth.user_id).await?;

    Ok(Json(books.into_iter().map(Into::into).collect()))
}

/// Add a book to the caller's favorites. The book does not have to exist.
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode> {
    let favorites = FavoritesManager::new(state.db.clone());
    favorites.add_favorite(auth.user_id, book_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove a book from the caller's favorites; succeeds even when it was
/// never present
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode> {
    let favorites = FavoritesManager::new(state.db.clone());
    favorites.remove_favorite(auth.user_id, book_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Users partitioned by how many reviews they have authored
pub async fn review_count_buckets(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewCountBucket>>> {
    let reporter = StatsReporter::new(Repository::new(state.db.clone()));
    let buckets = reporter.review_count_buckets().await?;

    Ok(Json(buckets))
}
