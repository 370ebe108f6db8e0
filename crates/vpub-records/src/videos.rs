//! Typed video record store.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use vpub_models::{VideoId, VideoRecord};

use crate::client::FirestoreClient;
use crate::error::{RecordsError, RecordsResult};
use crate::types::{Document, Value};

/// Collection holding video records, keyed by video ID with the owner as a
/// document field. A foreign-owned record is therefore observable as
/// "exists but not yours", which the authorization check depends on.
pub const VIDEOS_COLLECTION: &str = "videos";

/// Metadata record store collaborator: fetch-by-id and update-by-value.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn fetch(&self, id: &VideoId) -> RecordsResult<Option<VideoRecord>>;
    async fn update(&self, record: &VideoRecord) -> RecordsResult<()>;
}

/// [`VideoStore`] backed by the Firestore REST client.
pub struct FirestoreVideoStore {
    client: FirestoreClient,
}

impl FirestoreVideoStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VideoStore for FirestoreVideoStore {
    async fn fetch(&self, id: &VideoId) -> RecordsResult<Option<VideoRecord>> {
        let doc = self
            .client
            .get_document(VIDEOS_COLLECTION, id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_record(&d, id)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, record: &VideoRecord) -> RecordsResult<()> {
        let (fields, mask) = mutable_fields(record);

        self.client
            .patch_document(VIDEOS_COLLECTION, record.video_id.as_str(), fields, &mask)
            .await?;

        info!(video_id = %record.video_id, "Updated video record");
        Ok(())
    }
}

/// Map a Firestore document onto a [`VideoRecord`].
fn document_to_record(doc: &Document, id: &VideoId) -> RecordsResult<VideoRecord> {
    let owner_id = doc
        .str_field("owner_id")
        .ok_or_else(|| RecordsError::invalid_response("video record missing owner_id"))?
        .to_string();

    let created_at = doc
        .timestamp_field("created_at")
        .ok_or_else(|| RecordsError::invalid_response("video record missing created_at"))?;

    let updated_at = doc.timestamp_field("updated_at").unwrap_or(created_at);

    Ok(VideoRecord {
        video_id: id.clone(),
        owner_id,
        title: doc.str_field("title").unwrap_or_default().to_string(),
        playback_url: doc.str_field("playback_url").map(String::from),
        thumbnail_url: doc.str_field("thumbnail_url").map(String::from),
        created_at,
        updated_at,
    })
}

/// Fields the pipeline is allowed to mutate, with their update mask.
fn mutable_fields(record: &VideoRecord) -> (HashMap<String, Value>, Vec<String>) {
    let mut fields = HashMap::new();
    let mut mask = Vec::new();

    if let Some(url) = &record.playback_url {
        fields.insert("playback_url".to_string(), Value::string(url));
        mask.push("playback_url".to_string());
    }
    if let Some(url) = &record.thumbnail_url {
        fields.insert("thumbnail_url".to_string(), Value::string(url));
        mask.push("thumbnail_url".to_string());
    }
    fields.insert("updated_at".to_string(), Value::timestamp(record.updated_at));
    mask.push("updated_at".to_string());

    (fields, mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{RecordsConfig, TokenSource};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticTokenSource;

    #[async_trait]
    impl TokenSource for StaticTokenSource {
        async fn fetch_token(&self) -> RecordsResult<String> {
            Ok("test-token".to_string())
        }
    }

    fn test_client(base_url: String) -> FirestoreClient {
        let config = RecordsConfig {
            project_id: "test-project".to_string(),
            database_id: "(default)".to_string(),
            timeout: Duration::from_secs(5),
        };
        FirestoreClient::with_base_url(config, Arc::new(StaticTokenSource), base_url).unwrap()
    }

    fn video_document() -> serde_json::Value {
        serde_json::json!({
            "name": "projects/test-project/databases/(default)/documents/videos/vid-1",
            "fields": {
                "owner_id": { "stringValue": "user123" },
                "title": { "stringValue": "My Video" },
                "created_at": { "timestampValue": "2026-01-01T00:00:00Z" },
                "updated_at": { "timestampValue": "2026-01-02T00:00:00Z" }
            },
            "createTime": "2026-01-01T00:00:00Z",
            "updateTime": "2026-01-02T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_fetch_returns_record() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/videos/vid-1"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(video_document()))
            .mount(&server)
            .await;

        let store = FirestoreVideoStore::new(test_client(server.uri()));
        let record = store.fetch(&VideoId::from("vid-1")).await.unwrap().unwrap();

        assert_eq!(record.owner_id, "user123");
        assert_eq!(record.title, "My Video");
        assert!(record.playback_url.is_none());
    }

    #[tokio::test]
    async fn test_fetch_absent_record_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/videos/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = FirestoreVideoStore::new(test_client(server.uri()));
        assert!(store.fetch(&VideoId::from("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_patches_masked_fields() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/videos/vid-1"))
            .and(query_param("updateMask.fieldPaths", "playback_url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(video_document()))
            .expect(1)
            .mount(&server)
            .await;

        let store = FirestoreVideoStore::new(test_client(server.uri()));
        let record = VideoRecord::new(VideoId::from("vid-1"), "user123", "My Video")
            .with_playback_url("https://cdn.vpub.io/portrait/tok.mp4");

        store.update(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/videos/vid-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = FirestoreVideoStore::new(test_client(server.uri()));
        let err = store.fetch(&VideoId::from("vid-1")).await.unwrap_err();
        assert!(matches!(err, RecordsError::ServerError(500, _)));
    }

    #[test]
    fn test_document_to_record_requires_owner() {
        let doc = Document::new(HashMap::new());
        let err = document_to_record(&doc, &VideoId::from("vid-1")).unwrap_err();
        assert!(matches!(err, RecordsError::InvalidResponse(_)));
    }
}
