//! Video upload and read handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;

use vpub_models::{VideoId, VideoRecord};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::DeclaredPayload;
use crate::state::AppState;

/// The multipart field carrying the payload.
const FILE_FIELD: &str = "file";

/// Video record response.
#[derive(Serialize)]
pub struct VideoResponse {
    pub video_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<VideoRecord> for VideoResponse {
    fn from(record: VideoRecord) -> Self {
        Self {
            video_id: record.video_id.to_string(),
            title: record.title,
            playback_url: record.playback_url,
            thumbnail_url: record.thumbnail_url,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// Declared request size. The multipart framing makes this a slight
/// overcount of the payload itself, which is fine for a ceiling check;
/// the staging writer re-enforces the exact limit while writing.
fn declared_len(headers: &HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Upload a video payload and publish it through the pipeline.
pub async fn upload_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    user: AuthUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<VideoResponse>> {
    let video_id = VideoId::from(video_id.as_str());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let payload = DeclaredPayload {
            content_type: field.content_type().unwrap_or_default().to_string(),
            declared_len: declared_len(&headers),
        };

        // The field streams chunk-by-chunk into the staging area; the whole
        // payload is never buffered in memory.
        let record = state
            .uploads
            .upload_video(&video_id, &user, payload, field)
            .await?;

        return Ok(Json(record.into()));
    }

    Err(ApiError::bad_request(format!(
        "Missing '{}' form field",
        FILE_FIELD
    )))
}

/// Upload a thumbnail image for a video.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<VideoResponse>> {
    let video_id = VideoId::from(video_id.as_str());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read thumbnail data: {}", e)))?;

        let payload = DeclaredPayload {
            content_type,
            declared_len: data.len() as u64,
        };

        let record = state
            .uploads
            .upload_thumbnail(&video_id, &user, payload, data)
            .await?;

        return Ok(Json(record.into()));
    }

    Err(ApiError::bad_request(format!(
        "Missing '{}' form field",
        FILE_FIELD
    )))
}

/// Fetch a video record owned by the caller.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<VideoResponse>> {
    let record = state
        .uploads
        .fetch_owned(&VideoId::from(video_id.as_str()), &user)
        .await?;

    Ok(Json(record.into()))
}
