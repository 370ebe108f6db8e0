//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default upload ceiling: 1 GiB.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;

/// Default thumbnail ceiling: 10 MiB.
const DEFAULT_MAX_THUMBNAIL_BYTES: u64 = 10 * 1024 * 1024;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Environment (development/production)
    pub environment: String,
    /// Maximum accepted video payload size in bytes
    pub max_upload_bytes: u64,
    /// Maximum accepted thumbnail payload size in bytes
    pub max_thumbnail_bytes: u64,
    /// Accepted video media types (exactly one in the current policy)
    pub accepted_video_types: Vec<String>,
    /// Accepted thumbnail media types
    pub accepted_image_types: Vec<String>,
    /// Local root for staged files
    pub staging_root: PathBuf,
    /// Hard timeout for external tool invocations
    pub tool_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_thumbnail_bytes: DEFAULT_MAX_THUMBNAIL_BYTES,
            accepted_video_types: vec!["video/mp4".to_string()],
            accepted_image_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
            staging_root: std::env::temp_dir().join("vpub-staging"),
            tool_timeout: Duration::from_secs(300),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            max_thumbnail_bytes: std::env::var("MAX_THUMBNAIL_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_thumbnail_bytes),
            accepted_video_types: std::env::var("ACCEPTED_VIDEO_TYPES")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.accepted_video_types),
            accepted_image_types: defaults.accepted_image_types,
            staging_root: std::env::var("STAGING_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_root),
            tool_timeout: Duration::from_secs(
                std::env::var("TOOL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.tool_timeout.as_secs()),
            ),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
