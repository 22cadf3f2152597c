use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::entities::{playlist, playlist_track},
    error::{AppError, Result},
    session::SessionUser,
    state::AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub spotify_playlist_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<playlist::Model> for PlaylistResponse {
    fn from(model: playlist::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            is_public: model.is_public,
            spotify_playlist_id: model.spotify_playlist_id,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrackResponse {
    pub id: Uuid,
    pub spotify_track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub duration_ms: Option<i32>,
    pub preview_url: Option<String>,
    pub album_art_url: Option<String>,
    pub position: i32,
    pub added_at: String,
}

impl From<playlist_track::Model> for PlaylistTrackResponse {
    fn from(model: playlist_track::Model) -> Self {
        Self {
            id: model.id,
            spotify_track_id: model.spotify_track_id,
            track_name: model.track_name,
            artist_name: model.artist_name,
            album_name: model.album_name,
            duration_ms: model.duration_ms,
            preview_url: model.preview_url,
            album_art_url: model.album_art_url,
            position: model.position,
            added_at: model.added_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetailResponse {
    #[serde(flatten)]
    pub playlist: PlaylistResponse,
    pub tracks: Vec<PlaylistTrackResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackRequest {
    pub spotify_track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub duration_ms: Option<i32>,
    pub preview_url: Option<String>,
    pub album_art_url: Option<String>,
    pub position: Option<i32>,
}

/// Capability check for every playlist operation: fetch the playlist, then
/// verify the caller owns it. An absent playlist and someone else's playlist
/// are indistinguishable to the caller (both 404).
pub async fn find_owned_playlist(
    db: &DatabaseConnection,
    user_id: Uuid,
    playlist_id: Uuid,
) -> Result<playlist::Model> {
    let playlist = playlist::Entity::find_by_id(playlist_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

    if playlist.user_id != user_id {
        return Err(AppError::NotFound("Playlist not found".to_string()));
    }

    Ok(playlist)
}

pub async fn list_playlists(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<Vec<PlaylistResponse>>> {
    let playlists = playlist::Entity::find()
        .filter(playlist::Column::UserId.eq(user_id))
        .order_by_desc(playlist::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(playlists.into_iter().map(Into::into).collect()))
}

pub async fn create_playlist(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(payload): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<PlaylistResponse>)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Playlist name is required".to_string()));
    }

    let now = Utc::now().into();
    let new_playlist = playlist::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name),
        description: Set(payload.description),
        is_public: Set(payload.is_public.unwrap_or(false)),
        spotify_playlist_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = new_playlist.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaylistDetailResponse>> {
    let playlist = find_owned_playlist(&state.db, user_id, id).await?;

    let tracks = playlist_track::Entity::find()
        .filter(playlist_track::Column::PlaylistId.eq(playlist.id))
        .order_by_asc(playlist_track::Column::Position)
        .order_by_asc(playlist_track::Column::AddedAt)
        .all(&state.db)
        .await?;

    Ok(Json(PlaylistDetailResponse {
        playlist: playlist.into(),
        tracks: tracks.into_iter().map(Into::into).collect(),
    }))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlaylistRequest>,
) -> Result<Json<PlaylistResponse>> {
    let playlist = find_owned_playlist(&state.db, user_id, id).await?;

    let mut active: playlist::ActiveModel = playlist.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Playlist name is required".to_string()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_public) = payload.is_public {
        active.is_public = Set(is_public);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

/// Deletes a playlist and all of its tracks. The bulk delete runs first so
/// the cascade holds even on backends where the FK is not enforced.
pub async fn delete_playlist(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let playlist = find_owned_playlist(&state.db, user_id, id).await?;

    playlist_track::Entity::delete_many()
        .filter(playlist_track::Column::PlaylistId.eq(playlist.id))
        .exec(&state.db)
        .await?;

    playlist::Entity::delete_by_id(playlist.id)
        .exec(&state.db)
        .await?;

    Ok(Json(json!({ "message": "Playlist deleted" })))
}

pub async fn add_track(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddTrackRequest>,
) -> Result<(StatusCode, Json<PlaylistTrackResponse>)> {
    if payload.spotify_track_id.trim().is_empty()
        || payload.track_name.trim().is_empty()
        || payload.artist_name.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Track id, name, and artist are required".to_string(),
        ));
    }

    let playlist = find_owned_playlist(&state.db, user_id, id).await?;

    // New tracks land at the end unless a position is given
    let position = match payload.position {
        Some(position) => position,
        None => {
            playlist_track::Entity::find()
                .filter(playlist_track::Column::PlaylistId.eq(playlist.id))
                .count(&state.db)
                .await? as i32
        }
    };

    let track = playlist_track::ActiveModel {
        id: Set(Uuid::new_v4()),
        playlist_id: Set(playlist.id),
        spotify_track_id: Set(payload.spotify_track_id),
        track_name: Set(payload.track_name),
        artist_name: Set(payload.artist_name),
        album_name: Set(payload.album_name),
        duration_ms: Set(payload.duration_ms),
        preview_url: Set(payload.preview_url),
        album_art_url: Set(payload.album_art_url),
        position: Set(position),
        added_at: Set(Utc::now().into()),
    };
    let created = track.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn remove_track(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path((id, track_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>> {
    let playlist = find_owned_playlist(&state.db, user_id, id).await?;

    let deleted = playlist_track::Entity::delete_many()
        .filter(playlist_track::Column::Id.eq(track_id))
        .filter(playlist_track::Column::PlaylistId.eq(playlist.id))
        .exec(&state.db)
        .await?;

    if deleted.rows_affected == 0 {
        return Err(AppError::NotFound("Track not found in playlist".to_string()));
    }

    Ok(Json(json!({ "message": "Track removed" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_playlist, create_test_user, setup_test_db};

    #[tokio::test]
    async fn owner_can_access_their_playlist() {
        let db = setup_test_db().await;
        let owner = create_test_user(&db, "alice", "alice@example.com", "secret1").await;
        let playlist = create_test_playlist(&db, owner.id, "Road Trip").await;

        let found = find_owned_playlist(&db, owner.id, playlist.id)
            .await
            .unwrap();
        assert_eq!(found.id, playlist.id);
    }

    #[tokio::test]
    async fn other_users_playlist_reads_as_not_found() {
        let db = setup_test_db().await;
        let owner = create_test_user(&db, "alice", "alice@example.com", "secret1").await;
        let intruder = create_test_user(&db, "bob", "bob@example.com", "secret1").await;
        let playlist = create_test_playlist(&db, owner.id, "Road Trip").await;

        let result = find_owned_playlist(&db, intruder.id, playlist.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_playlist_reads_as_not_found() {
        let db = setup_test_db().await;
        let owner = create_test_user(&db, "alice", "alice@example.com", "secret1").await;

        let result = find_owned_playlist(&db, owner.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
