//! Session guard
//!
//! Authenticated routes extract [`SessionUser`]; routes that merely want to
//! know whether a session exists (catalog search, the guest gate on
//! register/login) extract [`OptionalSessionUser`]. Session state lives
//! server-side in `tower-sessions`; the cookie carries only a signed opaque
//! identifier.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use sha2::{Digest, Sha512};
use time::Duration;
use tower_sessions::{
    cookie::Key, service::SignedCookie, Expiry, MemoryStore, Session, SessionManagerLayer,
};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Key under which the authenticated user's id is stored in the session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Hours of inactivity before a session expires (sliding).
const SESSION_TTL_HOURS: i64 = 24;

/// Extractor for routes that require an authenticated session.
pub struct SessionUser(pub Uuid);

/// Extractor for routes that work with or without a session.
pub struct OptionalSessionUser(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let OptionalSessionUser(user_id) =
            OptionalSessionUser::from_request_parts(parts, state).await?;

        user_id
            .map(SessionUser)
            .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalSessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Session(msg.to_string()))?;

        let user_id: Option<Uuid> = session.get(SESSION_USER_ID_KEY).await?;
        Ok(OptionalSessionUser(user_id))
    }
}

/// Build the session middleware from configuration.
///
/// The signing key is derived from SESSION_SECRET with SHA-512 so operators
/// can supply a secret of any length (`Key::from` requires 64 bytes). The
/// cookie is http-only by default and secure-flagged in production.
pub fn session_layer(config: &Config) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    let digest = Sha512::digest(config.session_secret.as_bytes());
    let key = Key::from(digest.as_slice());

    SessionManagerLayer::new(MemoryStore::default())
        .with_signed(key)
        .with_secure(config.is_production())
        .with_expiry(Expiry::OnInactivity(Duration::hours(SESSION_TTL_HOURS)))
}
