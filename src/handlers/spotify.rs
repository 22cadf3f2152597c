use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    db::entities::search_history,
    error::{AppError, Result},
    session::OptionalSessionUser,
    state::AppState,
};

const DEFAULT_SEARCH_LIMIT: u32 = 20;
const DEFAULT_BROWSE_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 50;
const DEFAULT_TOP_TRACKS_MARKET: &str = "US";

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<u32>,
    pub market: Option<String>,
}

#[derive(Deserialize)]
pub struct TopTracksQuery {
    pub market: Option<String>,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

/// Append one search-history row for an authenticated search.
/// Fire-and-forget: runs on a spawned task and a failure is only logged.
fn record_search(state: &AppState, user_id: Uuid, query: String, search_type: Option<String>) {
    let db = state.db.clone();
    tokio::spawn(async move {
        let entry = search_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            query: Set(query),
            search_type: Set(search_type),
            searched_at: Set(Utc::now().into()),
        };
        if let Err(e) = entry.insert(&db).await {
            tracing::warn!("Failed to record search history: {}", e);
        }
    });
}

pub async fn search(
    State(state): State<AppState>,
    OptionalSessionUser(user_id): OptionalSessionUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query is required".to_string()))?
        .to_string();

    let kind = params.kind.unwrap_or_else(|| "track".to_string());
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_LIMIT);

    let body = state
        .spotify
        .search(&query, &kind, limit, params.market.as_deref())
        .await?;

    if let Some(user_id) = user_id {
        record_search(&state, user_id, query, Some(kind));
    }

    Ok(Json(body))
}

pub async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    Ok(Json(state.spotify.get_track(&id).await?))
}

pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    Ok(Json(state.spotify.get_artist(&id).await?))
}

pub async fn artist_top_tracks(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TopTracksQuery>,
) -> Result<Json<Value>> {
    let market = params
        .market
        .unwrap_or_else(|| DEFAULT_TOP_TRACKS_MARKET.to_string());
    Ok(Json(state.spotify.get_artist_top_tracks(&id, &market).await?))
}

// The three endpoints below are parameterized searches, not upstream browse
// calls; the client only needs "something to show" on the landing page.

pub async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_LIMIT);
    let body = state.spotify.search("year:2024", "track", limit, None).await?;

    Ok(Json(json!({ "tracks": body["tracks"]["items"] })))
}

pub async fn featured_playlists(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_BROWSE_LIMIT).min(MAX_LIMIT);
    let body = state.spotify.search("hits", "playlist", limit, None).await?;

    Ok(Json(json!({ "playlists": body["playlists"] })))
}

pub async fn new_releases(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_LIMIT);
    let body = state.spotify.search("tag:new", "album", limit, None).await?;

    Ok(Json(json!({ "albums": body["albums"] })))
}
