//! Integration tests for playlist routes
//!
//! Tests owner-scoped CRUD, the nested track endpoints, and the cascade
//! delete invariant, plus the register → playlist → track → delete
//! end-to-end scenario.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use musicfinder::db::entities::{playlist, playlist_track};
use musicfinder::state::AppState;
use musicfinder::test_utils::*;

async fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: axum::response::Response,
) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("cookie", cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

/// Register a user through the API and return their session cookie
async fn login_session(app: &axum::Router, username: &str, email: &str) -> String {
    let body = json!({ "username": username, "email": email, "password": "secret1" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    session_cookie(&response).unwrap()
}

async fn setup() -> (AppState, axum::Router, String) {
    let state = setup_test_app_state().await;
    let app = test_router(&state);
    let cookie = login_session(&app, "alice", "alice@example.com").await;
    (state, app, cookie)
}

async fn create_playlist(app: &axum::Router, cookie: &str, name: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/playlists",
            cookie,
            json!({ "name": name }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_json_response(response).await
}

#[tokio::test]
async fn test_create_and_list_playlists() {
    let (_state, app, cookie) = setup().await;

    let created = create_playlist(&app, &cookie, "Road Trip").await;
    assert_eq!(created["name"], "Road Trip");
    assert_eq!(created["isPublic"], false);

    let response = app
        .oneshot(get("/api/playlists", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let list: Vec<Value> = parse_json_response(response).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], created["id"]);
}

#[tokio::test]
async fn test_create_playlist_requires_name() {
    let (_state, app, cookie) = setup().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/playlists",
            &cookie,
            json!({ "name": "  " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_playlists_require_session() {
    let state = setup_test_app_state().await;
    let app = test_router(&state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/playlists")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_playlist_with_tracks_in_order() {
    let (state, app, cookie) = setup().await;
    let created = create_playlist(&app, &cookie, "Road Trip").await;
    let playlist_id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();

    create_test_playlist_track(&state.db, playlist_id, "t2", "Second", 1).await;
    create_test_playlist_track(&state.db, playlist_id, "t1", "First", 0).await;

    let response = app
        .oneshot(get(&format!("/api/playlists/{}", playlist_id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = parse_json_response(response).await;
    assert_eq!(body["name"], "Road Trip");
    let tracks = body["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["trackName"], "First");
    assert_eq!(tracks[1]["trackName"], "Second");
}

#[tokio::test]
async fn test_update_playlist_partial() {
    let (_state, app, cookie) = setup().await;
    let created = create_playlist(&app, &cookie, "Road Trip").await;
    let uri = format!("/api/playlists/{}", created["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            &cookie,
            json!({ "description": "Songs for the drive", "isPublic": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = parse_json_response(response).await;
    assert_eq!(body["name"], "Road Trip");
    assert_eq!(body["description"], "Songs for the drive");
    assert_eq!(body["isPublic"], true);
}

#[tokio::test]
async fn test_other_users_playlist_is_not_found() {
    let (state, app, _alice) = setup().await;
    let bob = login_session(&app, "bob", "bob@example.com").await;

    use sea_orm::{ColumnTrait, QueryFilter};
    let alice = musicfinder::db::entities::user::Entity::find()
        .filter(musicfinder::db::entities::user::Column::Username.eq("alice"))
        .one(&state.db)
        .await
        .unwrap()
        .unwrap();
    let playlist = create_test_playlist(&state.db, alice.id, "Private").await;

    let uri = format!("/api/playlists/{}", playlist.id);

    let read = app.clone().oneshot(get(&uri, &bob)).await.unwrap();
    assert_eq!(read.status(), StatusCode::NOT_FOUND);

    let update = app
        .clone()
        .oneshot(json_request("PUT", &uri, &bob, json!({ "name": "Stolen" })))
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let remove = app.oneshot(delete(&uri, &bob)).await.unwrap();
    assert_eq!(remove.status(), StatusCode::NOT_FOUND);

    // Nothing was touched
    let count = playlist::Entity::find().count(&state.db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_delete_playlist_cascades_to_tracks() {
    let (state, app, cookie) = setup().await;
    let created = create_playlist(&app, &cookie, "Road Trip").await;
    let playlist_id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();

    create_test_playlist_track(&state.db, playlist_id, "t1", "First", 0).await;
    create_test_playlist_track(&state.db, playlist_id, "t2", "Second", 1).await;

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/playlists/{}", playlist_id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let remaining = playlist_track::Entity::find()
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let read = app
        .oneshot(get(&format!("/api/playlists/{}", playlist_id), &cookie))
        .await
        .unwrap();
    assert_eq!(read.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_track_defaults_position_to_end() {
    let (_state, app, cookie) = setup().await;
    let created = create_playlist(&app, &cookie, "Road Trip").await;
    let uri = format!("/api/playlists/{}/tracks", created["id"].as_str().unwrap());

    let first = app
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            &cookie,
            json!({ "spotifyTrackId": "t1", "trackName": "First", "artistName": "Band" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first: Value = parse_json_response(first).await;
    assert_eq!(first["position"], 0);

    let second = app
        .oneshot(json_request(
            "POST",
            &uri,
            &cookie,
            json!({ "spotifyTrackId": "t2", "trackName": "Second", "artistName": "Band" }),
        ))
        .await
        .unwrap();
    let second: Value = parse_json_response(second).await;
    assert_eq!(second["position"], 1);
}

#[tokio::test]
async fn test_remove_track() {
    let (state, app, cookie) = setup().await;
    let created = create_playlist(&app, &cookie, "Road Trip").await;
    let playlist_id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();
    let track = create_test_playlist_track(&state.db, playlist_id, "t1", "First", 0).await;

    let response = app
        .clone()
        .oneshot(delete(
            &format!("/api/playlists/{}/tracks/{}", playlist_id, track.id),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let remaining = playlist_track::Entity::find()
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_remove_track_from_wrong_playlist_not_found() {
    let (state, app, cookie) = setup().await;
    let first = create_playlist(&app, &cookie, "First").await;
    let second = create_playlist(&app, &cookie, "Second").await;

    let first_id: uuid::Uuid = first["id"].as_str().unwrap().parse().unwrap();
    let track = create_test_playlist_track(&state.db, first_id, "t1", "Song", 0).await;

    // Track id exists, but under a different playlist
    let response = app
        .oneshot(delete(
            &format!(
                "/api/playlists/{}/tracks/{}",
                second["id"].as_str().unwrap(),
                track.id
            ),
            &cookie,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let remaining = playlist_track::Entity::find()
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 1);
}

#[tokio::test]
async fn test_register_playlist_track_delete_end_to_end() {
    let state = setup_test_app_state().await;
    let app = test_router(&state);

    // Register alice
    let register = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "username": "alice",
                        "email": "alice@example.com",
                        "password": "secret1"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(register.status(), StatusCode::CREATED);
    let cookie = session_cookie(&register).unwrap();

    // Create "Road Trip"
    let created = create_playlist(&app, &cookie, "Road Trip").await;
    let playlist_id = created["id"].as_str().unwrap().to_string();

    // Add a track
    let add = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/playlists/{}/tracks", playlist_id),
            &cookie,
            json!({ "spotifyTrackId": "t1", "trackName": "Song", "artistName": "Band" }),
        ))
        .await
        .unwrap();
    assert_eq!(add.status(), StatusCode::CREATED);

    // Delete the playlist; its tracks must no longer be retrievable
    let remove = app
        .clone()
        .oneshot(delete(&format!("/api/playlists/{}", playlist_id), &cookie))
        .await
        .unwrap();
    assert_eq!(remove.status(), StatusCode::OK);

    let read = app
        .oneshot(get(&format!("/api/playlists/{}", playlist_id), &cookie))
        .await
        .unwrap();
    assert_eq!(read.status(), StatusCode::NOT_FOUND);

    let remaining = playlist_track::Entity::find()
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
