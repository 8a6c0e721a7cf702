//! Bearer token cache for deep-health backends.
//!
//! # Responsibilities
//! - Authenticate against a backend on first use
//! - Cache at most one token per backend URL
//! - Drop a token when the backend rejects it
//!
//! # Design Decisions
//! - Owned by the checker and passed in explicitly (no process-wide cache)
//! - Authentication failures are logged and reported as `None`, never raised
//! - Retry discipline lives with the caller (see `records.rs`)

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Source of bearer tokens keyed by backend base URL.
pub trait TokenSource: Send + Sync {
    /// Return a cached token or authenticate for a new one.
    fn get_token(&self, backend_url: &str) -> impl Future<Output = Option<String>> + Send;

    /// Forget the cached token for `backend_url`.
    fn invalidate(&self, backend_url: &str);
}

#[derive(Serialize)]
struct PasswordLogin<'a> {
    identity: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: Option<String>,
}

/// Password-authenticated token cache.
#[derive(Clone)]
pub struct TokenCache {
    client: Client,
    credentials: AuthConfig,
    tokens: Arc<DashMap<String, String>>,
}

impl TokenCache {
    pub fn new(client: Client, credentials: AuthConfig) -> Self {
        Self {
            client,
            credentials,
            tokens: Arc::new(DashMap::new()),
        }
    }

    /// Whether a token is currently cached for `backend_url`.
    pub fn contains(&self, backend_url: &str) -> bool {
        self.tokens.contains_key(backend_url)
    }

    async fn authenticate(&self, backend_url: &str) -> Result<Option<String>, reqwest::Error> {
        let url = format!(
            "{}/api/collections/{}/auth-with-password",
            backend_url.trim_end_matches('/'),
            self.credentials.collection
        );
        let body = PasswordLogin {
            identity: &self.credentials.identity,
            password: &self.credentials.secret,
        };

        let response = self.client.post(url).json(&body).send().await?.error_for_status()?;
        let auth: AuthResponse = response.json().await?;
        Ok(auth.token.filter(|t| !t.is_empty()))
    }
}

impl TokenSource for TokenCache {
    async fn get_token(&self, backend_url: &str) -> Option<String> {
        if let Some(token) = self.tokens.get(backend_url) {
            return Some(token.value().clone());
        }

        match self.authenticate(backend_url).await {
            Ok(Some(token)) => {
                tracing::debug!(backend = %backend_url, "Authenticated with backend");
                self.tokens.insert(backend_url.to_string(), token.clone());
                Some(token)
            }
            Ok(None) => {
                tracing::error!(backend = %backend_url, "Authentication response carried no token");
                None
            }
            Err(e) => {
                tracing::error!(backend = %backend_url, error = %e, "Authentication failed");
                None
            }
        }
    }

    fn invalidate(&self, backend_url: &str) {
        if self.tokens.remove(backend_url).is_some() {
            tracing::debug!(backend = %backend_url, "Cached token invalidated");
        }
    }
}
