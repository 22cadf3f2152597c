use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::entities::{user, user_favorite},
    error::{AppError, Result},
    handlers::auth::UserResponse,
    session::SessionUser,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub id: Uuid,
    pub spotify_track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_art_url: Option<String>,
    pub added_at: String,
}

impl From<user_favorite::Model> for FavoriteResponse {
    fn from(model: user_favorite::Model) -> Self {
        Self {
            id: model.id,
            spotify_track_id: model.spotify_track_id,
            track_name: model.track_name,
            artist_name: model.artist_name,
            album_art_url: model.album_art_url,
            added_at: model.added_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub spotify_track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_art_url: Option<String>,
}

pub async fn get_profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<UserResponse>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.into();
    if let Some(display_name) = payload.display_name {
        let display_name = display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AppError::Validation(
                "Display name cannot be empty".to_string(),
            ));
        }
        active.display_name = Set(display_name);
    }
    if let Some(avatar_url) = payload.avatar_url {
        active.avatar_url = Set(Some(avatar_url));
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<Vec<FavoriteResponse>>> {
    let favorites = user_favorite::Entity::find()
        .filter(user_favorite::Column::UserId.eq(user_id))
        .order_by_desc(user_favorite::Column::AddedAt)
        .all(&state.db)
        .await?;

    Ok(Json(favorites.into_iter().map(Into::into).collect()))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(payload): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteResponse>)> {
    if payload.spotify_track_id.trim().is_empty()
        || payload.track_name.trim().is_empty()
        || payload.artist_name.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Track id, name, and artist are required".to_string(),
        ));
    }

    let existing = user_favorite::Entity::find()
        .filter(user_favorite::Column::UserId.eq(user_id))
        .filter(user_favorite::Column::SpotifyTrackId.eq(payload.spotify_track_id.clone()))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Track is already in favorites".to_string(),
        ));
    }

    let favorite = user_favorite::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        spotify_track_id: Set(payload.spotify_track_id),
        track_name: Set(payload.track_name),
        artist_name: Set(payload.artist_name),
        album_art_url: Set(payload.album_art_url),
        added_at: Set(Utc::now().into()),
    };
    let created = favorite.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(track_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let favorite = user_favorite::Entity::find()
        .filter(user_favorite::Column::UserId.eq(user_id))
        .filter(user_favorite::Column::SpotifyTrackId.eq(track_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Favorite not found".to_string()))?;

    favorite.delete(&state.db).await?;

    Ok(Json(json!({ "message": "Favorite removed" })))
}
