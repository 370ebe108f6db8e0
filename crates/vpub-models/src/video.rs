//! Video metadata models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a video record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Video metadata record owned by the external record store.
///
/// The upload pipeline reads a record, mutates its published-artifact URL
/// (and the thumbnail path mutates `thumbnail_url`), and hands it back to
/// the store for persistence. The pipeline never creates or deletes records.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    /// Unique video ID
    pub video_id: VideoId,

    /// User ID of the owner
    pub owner_id: String,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Distribution URL of the published video artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_url: Option<String>,

    /// Distribution URL of the thumbnail image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a new record (used by the record store and by tests; the
    /// upload pipeline itself never creates records).
    pub fn new(video_id: VideoId, owner_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            video_id,
            owner_id: owner_id.into(),
            title: title.into(),
            playback_url: None,
            thumbnail_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the given user owns this record.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Set the published artifact URL.
    pub fn with_playback_url(mut self, url: impl Into<String>) -> Self {
        self.playback_url = Some(url.into());
        self.updated_at = Utc::now();
        self
    }

    /// Set the thumbnail URL.
    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_generation() {
        let id1 = VideoId::new();
        let id2 = VideoId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_record_creation() {
        let id = VideoId::new();
        let record = VideoRecord::new(id.clone(), "user123", "My Video");

        assert_eq!(record.video_id, id);
        assert!(record.is_owned_by("user123"));
        assert!(!record.is_owned_by("user456"));
        assert!(record.playback_url.is_none());
    }

    #[test]
    fn test_with_playback_url() {
        let record = VideoRecord::new(VideoId::new(), "user123", "My Video")
            .with_playback_url("https://cdn.example.com/portrait/abc.mp4");

        assert_eq!(
            record.playback_url.as_deref(),
            Some("https://cdn.example.com/portrait/abc.mp4")
        );
        assert!(record.updated_at >= record.created_at);
    }

    #[test]
    fn test_record_serialization() {
        let record = VideoRecord::new(VideoId::from("vid-1"), "user123", "My Video");
        let json = serde_json::to_string(&record).unwrap();
        let back: VideoRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.video_id, record.video_id);
        assert_eq!(back.owner_id, record.owner_id);
        // None fields are skipped on the wire
        assert!(!json.contains("playback_url"));
    }
}
