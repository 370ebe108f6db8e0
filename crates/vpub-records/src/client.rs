//! Firestore REST API client.
//!
//! Token caching with a refresh margin, HTTP client tuning and HTTP-status
//! error mapping. The base URL is overridable so tests can point the client
//! at a local fake.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcp_auth::TokenProvider;
use reqwest::{Client, StatusCode};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{RecordsError, RecordsResult};
use crate::types::{Document, Value};

/// OAuth scope for Firestore/Datastore access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Refresh margin: refresh the token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL; OAuth tokens are typically valid for 60 minutes.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// Source of bearer tokens for the REST API.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> RecordsResult<String>;
}

/// [`TokenSource`] backed by gcp_auth's application-default credentials.
pub struct GcpTokenSource {
    provider: Arc<dyn TokenProvider>,
}

#[async_trait]
impl TokenSource for GcpTokenSource {
    async fn fetch_token(&self) -> RecordsResult<String> {
        let token = self
            .provider
            .token(&[FIRESTORE_SCOPE])
            .await
            .map_err(|e| RecordsError::auth_error(e.to_string()))?;
        Ok(token.as_str().to_string())
    }
}

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Thread-safe token cache with double-checked refresh.
struct TokenCache {
    source: Arc<dyn TokenSource>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    async fn get_token(&self) -> RecordsResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        debug!("Refreshing record store access token");
        let access_token = self.source.fetch_token().await?;
        *cache = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + TOKEN_DEFAULT_TTL,
        });

        Ok(access_token)
    }
}

/// Record store client configuration.
#[derive(Debug, Clone)]
pub struct RecordsConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
}

impl RecordsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> RecordsResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                RecordsError::auth_error("GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set")
            })?;

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(30),
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }
}

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    base_url: String,
    token_cache: Arc<TokenCache>,
}

impl FirestoreClient {
    /// Create a new client.
    pub fn new(config: RecordsConfig, token_source: Arc<dyn TokenSource>) -> RecordsResult<Self> {
        let base_url = config.documents_url();
        Self::with_base_url(config, token_source, base_url)
    }

    /// Create a client against an explicit documents base URL (tests).
    pub fn with_base_url(
        config: RecordsConfig,
        token_source: Arc<dyn TokenSource>,
        base_url: String,
    ) -> RecordsResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token_cache: Arc::new(TokenCache::new(token_source)),
        })
    }

    /// Create from environment with application-default GCP credentials.
    pub async fn from_env() -> RecordsResult<Self> {
        let config = RecordsConfig::from_env()?;
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| RecordsError::auth_error(e.to_string()))?;
        Self::new(config, Arc::new(GcpTokenSource { provider }))
    }

    /// Fetch a document by collection and ID. Absent documents are `None`.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> RecordsResult<Option<Document>> {
        let token = self.token_cache.get_token().await?;
        let url = format!("{}/{}/{}", self.base_url, collection, doc_id);

        let response = self.http.get(&url).bearer_auth(&token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(RecordsError::from_http_status(status.as_u16(), body))
            }
        }
    }

    /// Patch a document's fields, restricted to the given field mask.
    pub async fn patch_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        mask: &[String],
    ) -> RecordsResult<Document> {
        let token = self.token_cache.get_token().await?;
        let url = format!("{}/{}/{}", self.base_url, collection, doc_id);

        let query: Vec<(&str, &str)> = mask
            .iter()
            .map(|f| ("updateMask.fieldPaths", f.as_str()))
            .collect();

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&token)
            .query(&query)
            .json(&Document::new(fields))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RecordsError::from_http_status(status.as_u16(), body))
        }
    }
}
