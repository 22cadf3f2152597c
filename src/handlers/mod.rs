pub mod health;
pub mod auth;
pub mod users;
pub mod playlists;
pub mod spotify;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth endpoints
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))

        // User profile and favorites
        .route("/users/profile", get(users::get_profile))
        .route("/users/profile", put(users::update_profile))
        .route("/users/favorites", get(users::list_favorites))
        .route("/users/favorites", post(users::add_favorite))
        .route("/users/favorites/:track_id", delete(users::remove_favorite))

        // Playlist endpoints
        .route("/playlists", get(playlists::list_playlists))
        .route("/playlists", post(playlists::create_playlist))
        .route("/playlists/:id", get(playlists::get_playlist))
        .route("/playlists/:id", put(playlists::update_playlist))
        .route("/playlists/:id", delete(playlists::delete_playlist))
        .route("/playlists/:id/tracks", post(playlists::add_track))
        .route("/playlists/:id/tracks/:track_id", delete(playlists::remove_track))

        // Catalog proxy endpoints
        .route("/spotify/search", get(spotify::search))
        .route("/spotify/tracks/:id", get(spotify::get_track))
        .route("/spotify/artists/:id", get(spotify::get_artist))
        .route("/spotify/artists/:id/top-tracks", get(spotify::artist_top_tracks))
        .route("/spotify/recommendations", get(spotify::recommendations))
        .route("/spotify/featured-playlists", get(spotify::featured_playlists))
        .route("/spotify/new-releases", get(spotify::new_releases))
}
