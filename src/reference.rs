//! Background reference lookup for hover enrichment.
//!
//! Noun hovers are enriched with a Wikipedia summary. On a cache miss the
//! lookup is handed to a detached background task while the current hover
//! returns immediately; the result lands in a shared cache for a future
//! hover to read. Lookups carry a connect timeout and a total timeout and
//! are never retried or cancelled once issued. Near-simultaneous misses for
//! one query are not deduplicated; duplicate lookups only overwrite the
//! cache entry with the same data.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(5);

const API_ENDPOINT: &str = "https://ja.wikipedia.org/w/api.php";

/// Synthetic status for lookups that never produced an HTTP response.
pub const CONNECTION_ERROR: i64 = -1;

/// One completed lookup, keyed by query string.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub status: i64,
    pub content: String,
    pub is_error: bool,
}

/// Shared lookup cache. The only cross-task shared resource in the server.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    entries: DashMap<String, CacheEntry>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, query: &str) -> Option<CacheEntry> {
        self.entries.get(query).map(|e| e.value().clone())
    }

    pub fn insert(&self, query: String, status: i64, content: String) {
        let is_error = status != 200;
        self.entries.insert(
            query,
            CacheEntry {
                status,
                content,
                is_error,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected response shape")]
    MalformedResponse,
}

/// Japanese user-facing message for a failed or empty lookup.
pub fn error_message(status: i64) -> &'static str {
    match status {
        CONNECTION_ERROR | 403 => "Wikipediaからのサマリ取得に失敗しました",
        404 => "該当するサマリは存在しません",
        s if s >= 500 => "Wikipediaからのサマリ取得に失敗しました",
        _ => "該当するサマリは存在しません",
    }
}

/// Owned, injectable lookup service. Constructed once and handed to the
/// session; tests supply their own instance with a pre-seeded cache.
#[derive(Debug, Clone)]
pub struct ReferenceService {
    cache: Arc<ReferenceCache>,
    client: reqwest::Client,
}

impl ReferenceService {
    pub fn new(cache: Arc<ReferenceCache>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .user_agent(concat!("kousei/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { cache, client }
    }

    /// Read a completed lookup from the cache.
    pub fn cached(&self, query: &str) -> Option<CacheEntry> {
        self.cache.get(query)
    }

    /// Start a detached background lookup. The hover that triggered it does
    /// not wait; the result is cached for a future request.
    pub fn spawn_fetch(&self, query: String) {
        let cache = Arc::clone(&self.cache);
        let client = self.client.clone();
        tokio::spawn(async move {
            let (status, content) = match fetch_summary(&client, &query).await {
                Ok((status, content)) => (status, content),
                Err(e) => {
                    tracing::debug!(query = %query, error = %e, "reference lookup failed");
                    (CONNECTION_ERROR, "Network connection error".to_string())
                }
            };
            tracing::debug!(query = %query, status, "reference lookup completed");
            cache.insert(query, status, content);
        });
    }
}

/// Fetch a summary extract for `query` from the Wikipedia API.
async fn fetch_summary(
    client: &reqwest::Client,
    query: &str,
) -> Result<(i64, String), FetchError> {
    let response = client
        .get(API_ENDPOINT)
        .query(&[
            ("format", "json"),
            ("action", "query"),
            ("prop", "extracts"),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", query),
        ])
        .send()
        .await?;

    let status = response.status().as_u16() as i64;
    // A zero status never comes out of a real response; treat it as a
    // synthetic connection error anyway.
    let status = if status == 0 { CONNECTION_ERROR } else { status };

    if status != 200 {
        return Ok((status, error_message(status).to_string()));
    }

    let body: serde_json::Value = response.json().await?;
    let summary = parse_summary(&body).ok_or(FetchError::MalformedResponse)?;
    Ok((status, summary))
}

/// Pull the first page extract out of an API response.
fn parse_summary(body: &serde_json::Value) -> Option<String> {
    let pages = body.get("query")?.get("pages")?.as_object()?;
    for page in pages.values() {
        if let Some(extract) = page.get("extract").and_then(|e| e.as_str()) {
            return Some(extract.to_string());
        }
    }
    Some("No summary available.".to_string())
}
