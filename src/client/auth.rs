//! Credentials and access-token caching for the console client
//!
//! Static tokens are used as-is. Client credentials are exchanged for an
//! access token that is cached until shortly before it expires.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::time::Instant;
use tracing::debug;

/// Tokens this close to expiry are treated as expired
pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// How the client authenticates against the console
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-issued bearer token
    Token(String),
    /// Service account exchanged for tokens through the client credentials grant
    ClientCredentials { client_id: String, client_secret: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"***")
                .finish(),
        }
    }
}

/// Response of the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Process-wide cache for the client credentials access token.
///
/// One instance is shared (behind an `Arc`) by every client built for the
/// same credentials.
#[derive(Debug, Default)]
pub struct TokenCache {
    inner: RwLock<Option<CachedToken>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token, unless missing or within [`REFRESH_MARGIN`] of expiry
    pub async fn get(&self) -> Option<String> {
        let cache = self.inner.read().await;
        match cache.as_ref() {
            Some(entry) if Instant::now() + REFRESH_MARGIN < entry.expires_at => {
                debug!("Access token cache hit");
                Some(entry.access_token.clone())
            }
            Some(_) => {
                debug!("Cached access token is about to expire");
                None
            }
            None => None,
        }
    }

    /// Serialize token refreshes; holders re-check [`TokenCache::get`] before fetching
    pub async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }

    /// Store a freshly issued token
    pub async fn store(&self, token: &TokenResponse) {
        let mut cache = self.inner.write().await;
        debug!(expires_in = token.expires_in, "Caching access token");
        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
    }

    /// Drop the cached token so the next request fetches a new one
    pub async fn invalidate(&self) {
        let mut cache = self.inner.write().await;
        debug!("Invalidating cached access token");
        *cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(value: &str, expires_in: u64) -> TokenResponse {
        TokenResponse { access_token: value.to_string(), expires_in, token_type: None }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_returns_fresh_token() {
        let cache = TokenCache::new();
        assert!(cache.get().await.is_none());

        cache.store(&token("abc", 3600)).await;
        assert_eq!(cache.get().await.as_deref(), Some("abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_before_deadline() {
        let cache = TokenCache::new();
        cache.store(&token("abc", 60)).await;

        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(cache.get().await.is_some());

        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_clears_token() {
        let cache = TokenCache::new();
        cache.store(&token("abc", 3600)).await;
        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::ClientCredentials {
            client_id: "svc".to_string(),
            client_secret: "hunter2".to_string(),
        };
        let rendered = format!("{:?} {:?}", creds, Credentials::Token("tok".to_string()));
        assert!(rendered.contains("svc"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("tok\""));
    }
}
