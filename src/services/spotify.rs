//! Catalog proxy
//!
//! Talks to the upstream music catalog on behalf of the application. Holds
//! the single process-wide client-credentials token in a [`TokenCache`] and
//! forwards search/lookup requests with the cached bearer token attached.
//!
//! Failure policy is zero-retry: a failed token exchange or catalog call is
//! surfaced to the caller immediately and the next request starts from
//! scratch. Two requests racing past an expired token may both refresh it;
//! both exchanges yield valid tokens and the last write wins, so the cache
//! deliberately carries no refresh lock.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

const API_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// A token is usable only strictly before its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Size-one TTL cache for the client-credentials token. Overwritten whole
/// on refresh; never merged.
#[derive(Clone, Default)]
pub struct TokenCache {
    inner: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenCache {
    pub async fn get_valid(&self) -> Option<String> {
        let guard = self.inner.read().await;
        guard
            .as_ref()
            .filter(|token| token.is_valid_at(Utc::now()))
            .map(|token| token.access_token.clone())
    }

    pub async fn replace(&self, token: CachedToken) {
        *self.inner.write().await = Some(token);
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
    expires_in: i64,
}

#[derive(Clone)]
pub struct SpotifyService {
    client: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
    token_cache: TokenCache,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl SpotifyService {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            SPOTIFY_TOKEN_URL.to_string(),
            SPOTIFY_API_BASE.to_string(),
        )
    }

    /// Construct against explicit endpoints; tests point this at a mock
    /// server for both the identity and catalog APIs.
    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        token_url: String,
        api_base: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        // Rate limiter: 2 requests per second to stay under Spotify's ~3 req/sec limit
        let quota = Quota::per_second(nonzero!(2u32));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            client,
            client_id,
            client_secret,
            token_url,
            api_base,
            token_cache: TokenCache::default(),
            rate_limiter,
        }
    }

    /// Return the cached bearer token, exchanging client credentials for a
    /// fresh one when the cache is empty or past expiry.
    async fn bearer_token(&self) -> Result<String> {
        if let Some(token) = self.token_cache.get_valid().await {
            return Ok(token);
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        self.token_cache
            .replace(CachedToken {
                access_token: token.access_token,
                expires_at: Utc::now() + Duration::seconds(token.expires_in),
            })
            .await;

        Ok(access_token)
    }

    /// Client-credentials exchange with the identity endpoint. Caches
    /// nothing on failure.
    async fn request_token(&self) -> Result<TokenResponse> {
        self.rate_limiter.until_ready().await;

        let credentials = general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", credentials))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamAuth(format!(
                "Token exchange failed ({}): {}",
                status, error_text
            )));
        }

        Ok(response.json().await?)
    }

    /// GET a catalog path with the bearer token attached, returning the
    /// upstream JSON body unmodified.
    async fn get_json(&self, path_and_query: &str) -> Result<Value> {
        let token = self.bearer_token().await?;

        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.api_base, path_and_query);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream { status, message });
        }

        Ok(response.json().await?)
    }

    /// Free-text catalog search, forwarded verbatim.
    pub async fn search(
        &self,
        query: &str,
        kind: &str,
        limit: u32,
        market: Option<&str>,
    ) -> Result<Value> {
        let mut path = format!(
            "/search?q={}&type={}&limit={}",
            urlencoding::encode(query),
            urlencoding::encode(kind),
            limit
        );
        if let Some(market) = market {
            path.push_str(&format!("&market={}", urlencoding::encode(market)));
        }

        self.get_json(&path).await
    }

    pub async fn get_track(&self, track_id: &str) -> Result<Value> {
        self.get_json(&format!("/tracks/{}", urlencoding::encode(track_id)))
            .await
    }

    pub async fn get_artist(&self, artist_id: &str) -> Result<Value> {
        self.get_json(&format!("/artists/{}", urlencoding::encode(artist_id)))
            .await
    }

    pub async fn get_artist_top_tracks(&self, artist_id: &str, market: &str) -> Result<Value> {
        self.get_json(&format!(
            "/artists/{}/top-tracks?market={}",
            urlencoding::encode(artist_id),
            urlencoding::encode(market)
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_valid_strictly_before_expiry() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "tok".to_string(),
            expires_at: now + Duration::seconds(3600),
        };

        assert!(token.is_valid_at(now));
        assert!(token.is_valid_at(now + Duration::seconds(3599)));
        assert!(!token.is_valid_at(now + Duration::seconds(3600)));
        assert!(!token.is_valid_at(now + Duration::seconds(3601)));
    }

    #[test]
    fn zero_lifetime_token_is_immediately_stale() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "tok".to_string(),
            expires_at: now,
        };

        assert!(!token.is_valid_at(now));
    }

    #[tokio::test]
    async fn cache_starts_empty_and_replaces_whole() {
        let cache = TokenCache::default();
        assert!(cache.get_valid().await.is_none());

        cache
            .replace(CachedToken {
                access_token: "first".to_string(),
                expires_at: Utc::now() + Duration::seconds(60),
            })
            .await;
        assert_eq!(cache.get_valid().await.as_deref(), Some("first"));

        cache
            .replace(CachedToken {
                access_token: "second".to_string(),
                expires_at: Utc::now() + Duration::seconds(60),
            })
            .await;
        assert_eq!(cache.get_valid().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn expired_token_is_not_served() {
        let cache = TokenCache::default();
        cache
            .replace(CachedToken {
                access_token: "stale".to_string(),
                expires_at: Utc::now() - Duration::seconds(1),
            })
            .await;

        assert!(cache.get_valid().await.is_none());
    }
}
