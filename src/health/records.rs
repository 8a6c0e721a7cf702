//! Authenticated record listing against a deep-health backend.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::health::auth::TokenSource;
use crate::health::types::{ProbeError, ProbeOutcome};

/// Query for one collection's record listing.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery<'a> {
    pub collection: &'a str,
    /// Sort expression, `-field` for descending.
    pub sort: &'a str,
    pub per_page: u32,
    pub filter: Option<String>,
}

#[derive(Deserialize)]
struct RecordPage {
    #[serde(default)]
    items: Vec<Value>,
}

/// List records from `backend_url`, authenticating with `tokens`.
///
/// A 401 invalidates the cached token and the whole request is retried once
/// with a fresh token. A second 401 is final and leaves the cache empty.
pub async fn list_records<T: TokenSource>(
    client: &Client,
    tokens: &T,
    backend_url: &str,
    query: &RecordQuery<'_>,
) -> ProbeOutcome<Vec<Value>> {
    let url = format!(
        "{}/api/collections/{}/records",
        backend_url.trim_end_matches('/'),
        query.collection
    );
    let mut params = vec![
        ("sort", query.sort.to_string()),
        ("perPage", query.per_page.to_string()),
    ];
    if let Some(filter) = &query.filter {
        params.push(("filter", filter.clone()));
    }

    for attempt in 0..2 {
        let token = tokens
            .get_token(backend_url)
            .await
            .ok_or_else(|| ProbeError::Auth(backend_url.to_string()))?;

        let response = client
            .get(&url)
            .query(&params)
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tokens.invalidate(backend_url);
            tracing::warn!(
                backend = %backend_url,
                collection = %query.collection,
                attempt,
                "Token rejected"
            );
            continue;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let page: RecordPage = response
            .json()
            .await
            .map_err(|e| ProbeError::Decode(e.to_string()))?;
        return Ok(page.items);
    }

    Err(ProbeError::Auth(backend_url.to_string()))
}
