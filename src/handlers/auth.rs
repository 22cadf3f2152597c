use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    db::entities::user,
    error::{AppError, Result},
    session::{OptionalSessionUser, SessionUser, SESSION_USER_ID_KEY},
    state::AppState,
};

const MIN_PASSWORD_LENGTH: usize = 6;

/// User record as exposed over the API; the password hash never leaves
/// the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub spotify_id: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
            spotify_id: model.spotify_id,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Accepts either the username or the email address.
    pub username: String,
    pub password: String,
}

pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Look up a user by username or email, for login.
async fn find_by_identifier(
    db: &sea_orm::DatabaseConnection,
    identifier: &str,
) -> Result<Option<user::Model>> {
    let user = user::Entity::find()
        .filter(
            user::Column::Username
                .eq(identifier)
                .or(user::Column::Email.eq(identifier.to_lowercase())),
        )
        .one(db)
        .await?;
    Ok(user)
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    OptionalSessionUser(current): OptionalSessionUser,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if current.is_some() {
        return Err(AppError::Forbidden("Already logged in".to_string()));
    }

    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let existing = user::Entity::find()
        .filter(
            user::Column::Username
                .eq(username.clone())
                .or(user::Column::Email.eq(email.clone())),
        )
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Username or email is already taken".to_string(),
        ));
    }

    let display_name = payload
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| username.clone());

    let now = Utc::now().into();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        display_name: Set(display_name),
        avatar_url: Set(None),
        spotify_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = new_user.insert(&state.db).await?;

    session.insert(SESSION_USER_ID_KEY, created.id).await?;

    tracing::info!("Registered user {}", created.username);

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    OptionalSessionUser(current): OptionalSessionUser,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    if current.is_some() {
        return Err(AppError::Forbidden("Already logged in".to_string()));
    }

    let identifier = payload.username.trim();

    // Unknown user and wrong password are deliberately indistinguishable
    let user = find_by_identifier(&state.db, identifier)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    session.insert(SESSION_USER_ID_KEY, user.id).await?;

    Ok(Json(user.into()))
}

pub async fn logout(SessionUser(_user_id): SessionUser, session: Session) -> Result<Json<serde_json::Value>> {
    session.flush().await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

pub async fn me(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<UserResponse>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
