//! Test utilities for MusicFinder
//!
//! Provides helpers for creating isolated test environments with:
//! - In-memory SQLite databases (one per test)
//! - AppState factories, with the catalog proxy pointed at mock endpoints
//! - A router factory that applies the real session middleware
//! - Test data generators

use axum::{response::Response, Router};
use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::{
    config::Config,
    db::entities::{playlist, playlist_track, user, user_favorite},
    handlers::{self, auth::hash_password},
    services::SpotifyService,
    session::session_layer,
    state::AppState,
};

/// Setup an in-memory SQLite database with all migrations applied
///
/// Each call creates a fresh, isolated database perfect for parallel testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    // Run all migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create a test configuration with sensible defaults
pub fn test_config() -> Config {
    Config {
        app_url: "http://localhost:3000".to_string(),
        database_url: "sqlite::memory:".to_string(),
        session_secret: "test-session-secret".to_string(),
        spotify_client_id: "test_client_id".to_string(),
        spotify_client_secret: "test_client_secret".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        environment: "development".to_string(),
    }
}

/// Create a complete test AppState with an isolated database.
/// The catalog proxy points at the real upstream; tests that exercise it
/// should use [`setup_test_app_state_with_spotify`] instead.
pub async fn setup_test_app_state() -> AppState {
    let db = setup_test_db().await;
    let config = test_config();
    let spotify = SpotifyService::new(
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
    );

    AppState::new(db, config, spotify)
}

/// Test AppState whose catalog proxy talks to the given (mock) endpoints
pub async fn setup_test_app_state_with_spotify(token_url: String, api_base: String) -> AppState {
    let db = setup_test_db().await;
    let config = test_config();
    let spotify = SpotifyService::with_endpoints(
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
        token_url,
        api_base,
    );

    AppState::new(db, config, spotify)
}

/// Build a router with the API routes and real session middleware.
/// Clone it per request; the clones share one in-memory session store.
pub fn test_router(state: &AppState) -> Router {
    let sessions = session_layer(&state.config);

    Router::new()
        .nest("/api", handlers::api_routes())
        .layer(sessions)
        .with_state(state.clone())
}

/// Extract the session cookie pair from a response, for replay on
/// subsequent requests
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get("set-cookie")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|pair| pair.to_string())
}

// ============================================================================
// Test Data Factories
// ============================================================================

/// Create a test user in the database with a real argon2 hash
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> user::Model {
    let now = Utc::now().into();
    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password).expect("Failed to hash test password")),
        display_name: Set(username.to_string()),
        avatar_url: Set(None),
        spotify_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    user.insert(db).await.expect("Failed to insert test user")
}

/// Create a test playlist owned by the given user
pub async fn create_test_playlist(
    db: &DatabaseConnection,
    user_id: Uuid,
    name: &str,
) -> playlist::Model {
    let now = Utc::now().into();
    let playlist = playlist::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_string()),
        description: Set(None),
        is_public: Set(false),
        spotify_playlist_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    playlist
        .insert(db)
        .await
        .expect("Failed to insert test playlist")
}

/// Create a test track inside the given playlist
pub async fn create_test_playlist_track(
    db: &DatabaseConnection,
    playlist_id: Uuid,
    spotify_track_id: &str,
    track_name: &str,
    position: i32,
) -> playlist_track::Model {
    let track = playlist_track::ActiveModel {
        id: Set(Uuid::new_v4()),
        playlist_id: Set(playlist_id),
        spotify_track_id: Set(spotify_track_id.to_string()),
        track_name: Set(track_name.to_string()),
        artist_name: Set("Test Artist".to_string()),
        album_name: Set(None),
        duration_ms: Set(Some(180_000)),
        preview_url: Set(None),
        album_art_url: Set(None),
        position: Set(position),
        added_at: Set(Utc::now().into()),
    };

    track
        .insert(db)
        .await
        .expect("Failed to insert test playlist track")
}

/// Create a test favorite for the given user
pub async fn create_test_favorite(
    db: &DatabaseConnection,
    user_id: Uuid,
    spotify_track_id: &str,
    track_name: &str,
) -> user_favorite::Model {
    let favorite = user_favorite::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        spotify_track_id: Set(spotify_track_id.to_string()),
        track_name: Set(track_name.to_string()),
        artist_name: Set("Test Artist".to_string()),
        album_art_url: Set(None),
        added_at: Set(Utc::now().into()),
    };

    favorite
        .insert(db)
        .await
        .expect("Failed to insert test favorite")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::EntityTrait;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        let users = user::Entity::find().all(&db).await.unwrap();
        assert_eq!(users.len(), 0);
    }

    #[tokio::test]
    async fn test_create_test_user() {
        let db = setup_test_db().await;
        let user = create_test_user(&db, "alice", "alice@example.com", "secret1").await;

        assert_eq!(user.username, "alice");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_parallel_databases() {
        // Run two database setups in parallel - they should not interfere
        let (db1, db2) = tokio::join!(setup_test_db(), setup_test_db());

        create_test_user(&db1, "alice", "alice@example.com", "secret1").await;
        create_test_user(&db2, "bob", "bob@example.com", "secret1").await;

        let db1_users = user::Entity::find().all(&db1).await.unwrap();
        let db2_users = user::Entity::find().all(&db2).await.unwrap();

        assert_eq!(db1_users.len(), 1);
        assert_eq!(db2_users.len(), 1);
        assert_eq!(db1_users[0].username, "alice");
        assert_eq!(db2_users[0].username, "bob");
    }
}
