//! Application state.

use std::sync::Arc;

use vpub_media::{StagingArea, SystemToolRunner, ToolRunner};
use vpub_records::{FirestoreClient, FirestoreVideoStore, VideoStore};
use vpub_storage::{DeliveryConfig, ObjectPublisher, StorageClient};

use crate::auth::JwksCache;
use crate::config::ApiConfig;
use crate::services::{UploadPolicy, UploadService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<StorageClient>,
    pub records: Arc<FirestoreClient>,
    pub jwks: Arc<JwksCache>,
    pub uploads: UploadService,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let storage = Arc::new(StorageClient::from_env()?);
        let records = Arc::new(FirestoreClient::from_env().await?);
        let delivery = DeliveryConfig::from_env()?;
        let jwks = Arc::new(JwksCache::new().await?);

        let staging = StagingArea::new(&config.staging_root);
        staging.ensure_root().await?;

        let runner = Arc::new(SystemToolRunner::new(config.tool_timeout));
        let videos = Arc::new(FirestoreVideoStore::new((*records).clone()));

        let uploads = UploadService::new(
            videos as Arc<dyn VideoStore>,
            Arc::clone(&storage) as Arc<dyn ObjectPublisher>,
            runner as Arc<dyn ToolRunner>,
            staging,
            delivery,
            UploadPolicy {
                max_bytes: config.max_upload_bytes,
                accepted_types: config.accepted_video_types.clone(),
            },
            UploadPolicy {
                max_bytes: config.max_thumbnail_bytes,
                accepted_types: config.accepted_image_types.clone(),
            },
        );

        Ok(Self {
            config,
            storage,
            records,
            jwks,
            uploads,
        })
    }
}
