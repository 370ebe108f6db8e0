//! Upload-to-publish pipeline orchestration.
//!
//! The [`UploadService`] sequences the pipeline: authorize, validate, stage,
//! faststart remux, aspect probe, key derivation, object-store publish,
//! record commit. Collaborators are injected as trait objects so the whole
//! pipeline runs against fakes in tests.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use tracing::{info, warn};

use vpub_media::{classify_aspect, normalize_faststart, StagedFile, StagingArea, ToolRunner};
use vpub_models::{VideoId, VideoRecord};
use vpub_records::VideoStore;
use vpub_storage::{extension_for, random_token, DeliveryConfig, ObjectPublisher, StorageKey};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Size and media-type policy for one upload surface.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Ceiling on the payload size in bytes
    pub max_bytes: u64,
    /// Accepted declared media types
    pub accepted_types: Vec<String>,
}

impl UploadPolicy {
    pub fn accepts(&self, content_type: &str) -> bool {
        self.accepted_types.iter().any(|t| t == content_type)
    }
}

/// What the client declared about a payload, known before any byte is read.
#[derive(Debug, Clone)]
pub struct DeclaredPayload {
    /// Declared media type of the payload
    pub content_type: String,
    /// Declared size in bytes
    pub declared_len: u64,
}

/// Orchestrates the upload-to-publish pipeline.
#[derive(Clone)]
pub struct UploadService {
    videos: Arc<dyn VideoStore>,
    publisher: Arc<dyn ObjectPublisher>,
    runner: Arc<dyn ToolRunner>,
    staging: StagingArea,
    delivery: DeliveryConfig,
    video_policy: UploadPolicy,
    thumbnail_policy: UploadPolicy,
}

impl UploadService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        videos: Arc<dyn VideoStore>,
        publisher: Arc<dyn ObjectPublisher>,
        runner: Arc<dyn ToolRunner>,
        staging: StagingArea,
        delivery: DeliveryConfig,
        video_policy: UploadPolicy,
        thumbnail_policy: UploadPolicy,
    ) -> Self {
        Self {
            videos,
            publisher,
            runner,
            staging,
            delivery,
            video_policy,
            thumbnail_policy,
        }
    }

    /// Run the full video pipeline and return the updated record.
    ///
    /// Every exit path leaves zero staged files for this request: the two
    /// [`StagedFile`] guards are removed explicitly on the main paths and by
    /// `Drop` on every early return.
    pub async fn upload_video<S, E>(
        &self,
        video_id: &VideoId,
        uploader: &AuthUser,
        payload: DeclaredPayload,
        body: S,
    ) -> ApiResult<VideoRecord>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: fmt::Display,
    {
        let record = self.authorize(video_id, &uploader.uid).await?;
        let ext = validate_declared(&self.video_policy, &payload)?;

        // One token per attempt. It names both staged files and the storage
        // key, so concurrent requests never collide on a path and a retried
        // upload never reuses a key.
        let token = random_token();

        let raw = self
            .stage_body(&format!("raw-{}.{}", token, ext), body)
            .await
            .map_err(|e| {
                metrics::record_upload_failure("stage");
                e
            })?;

        let mut fast = self.staging.claim(&format!("fast-{}.{}", token, ext));

        let remux_started = Instant::now();
        if let Err(e) = normalize_faststart(self.runner.as_ref(), raw.path(), fast.path()).await {
            metrics::record_upload_failure("normalize");
            return Err(e.into());
        }
        metrics::record_ffmpeg_duration(remux_started.elapsed().as_secs_f64());

        // The raw file's job is done; only the normalized file remains.
        raw.remove().await?;
        fast.sync_len().await?;

        let class = match classify_aspect(self.runner.as_ref(), fast.path()).await {
            Ok(class) => class,
            Err(e) => {
                metrics::record_upload_failure("probe");
                return Err(e.into());
            }
        };

        let key = StorageKey::new(class, &token, &ext);

        let publish_started = Instant::now();
        if let Err(e) = self
            .publisher
            .put_file(fast.path(), key.as_str(), &payload.content_type)
            .await
        {
            metrics::record_upload_failure("publish");
            return Err(e.into());
        }
        metrics::record_publish_duration(publish_started.elapsed().as_secs_f64());

        let updated = record.with_playback_url(self.delivery.public_url(key.as_str()));
        if let Err(e) = self.videos.update(&updated).await {
            metrics::record_upload_failure("commit");
            return Err(e.into());
        }

        fast.remove().await?;
        metrics::record_upload();

        info!(
            video_id = %updated.video_id,
            class = %class,
            key = %key,
            "Published video upload"
        );

        Ok(updated)
    }

    /// The simple variant: no staging, no external process. Bytes go straight
    /// to the object store and `thumbnail_url` is committed to the record.
    pub async fn upload_thumbnail(
        &self,
        video_id: &VideoId,
        uploader: &AuthUser,
        payload: DeclaredPayload,
        data: Bytes,
    ) -> ApiResult<VideoRecord> {
        let record = self.authorize(video_id, &uploader.uid).await?;
        let ext = validate_declared(&self.thumbnail_policy, &payload)?;

        if data.len() as u64 > self.thumbnail_policy.max_bytes {
            return Err(ApiError::payload_too_large(format!(
                "Thumbnail exceeds the {} byte limit",
                self.thumbnail_policy.max_bytes
            )));
        }

        let token = random_token();
        let key = format!("thumbnails/{}.{}", token, ext);

        self.publisher
            .put_bytes(data.to_vec(), &key, &payload.content_type)
            .await?;

        let updated = record.with_thumbnail_url(self.delivery.public_url(&key));
        self.videos.update(&updated).await?;

        info!(video_id = %updated.video_id, key, "Published thumbnail");

        Ok(updated)
    }

    /// Ownership-checked record fetch for the read surface.
    pub async fn fetch_owned(
        &self,
        video_id: &VideoId,
        requester: &AuthUser,
    ) -> ApiResult<VideoRecord> {
        self.authorize(video_id, &requester.uid).await
    }

    /// The authorization boundary: the record must exist and be owned by the
    /// caller. Runs before any byte is persisted anywhere.
    async fn authorize(&self, video_id: &VideoId, uid: &str) -> ApiResult<VideoRecord> {
        let record = self
            .videos
            .fetch(video_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Video {} not found", video_id)))?;

        if !record.is_owned_by(uid) {
            warn!(video_id = %video_id, uid, "Rejected request for foreign-owned video");
            return Err(ApiError::forbidden("Video belongs to another user"));
        }

        Ok(record)
    }

    /// Stage the inbound stream, enforcing the byte ceiling while writing.
    async fn stage_body<S, E>(&self, file_name: &str, body: S) -> ApiResult<StagedFile>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: fmt::Display,
    {
        let mut writer = self
            .staging
            .create(file_name, self.video_policy.max_bytes)
            .await?;

        pin_mut!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload body: {}", e)))?;
            writer.write_chunk(&chunk).await?;
        }

        Ok(writer.finish().await?)
    }
}

/// Check the declared properties against a policy and derive the extension.
fn validate_declared(policy: &UploadPolicy, payload: &DeclaredPayload) -> ApiResult<String> {
    if payload.content_type.is_empty() {
        return Err(ApiError::bad_request("Missing content type"));
    }

    if !policy.accepts(&payload.content_type) {
        return Err(ApiError::bad_request(format!(
            "Unsupported media type '{}'; accepted: {}",
            payload.content_type,
            policy.accepted_types.join(", ")
        )));
    }

    if payload.declared_len > policy.max_bytes {
        return Err(ApiError::payload_too_large(format!(
            "Declared size {} exceeds the {} byte limit",
            payload.declared_len, policy.max_bytes
        )));
    }

    let ext = extension_for(&payload.content_type)
        .ok_or_else(|| ApiError::bad_request("Malformed content type"))?;

    Ok(ext.to_string())
}
