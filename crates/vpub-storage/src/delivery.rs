//! Public distribution URLs for published artifacts.

use url::Url;

use crate::error::{StorageError, StorageResult};

/// Distribution endpoint configuration.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Public base URL through which published artifacts are served
    /// (a CDN or public bucket domain).
    public_base_url: String,
}

impl DeliveryConfig {
    /// Create a config, validating the base URL.
    pub fn new(public_base_url: impl Into<String>) -> StorageResult<Self> {
        let base = public_base_url.into();
        Url::parse(&base).map_err(|e| {
            StorageError::config_error(format!("Invalid distribution base URL '{}': {}", base, e))
        })?;
        Ok(Self {
            public_base_url: base.trim_end_matches('/').to_string(),
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let base = std::env::var("PUBLIC_CDN_URL")
            .map_err(|_| StorageError::config_error("PUBLIC_CDN_URL not set"))?;
        Self::new(base)
    }

    /// Distribution URL for a published object.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::StorageKey;
    use vpub_models::AspectClass;

    #[test]
    fn test_public_url_assembly() {
        let config = DeliveryConfig::new("https://cdn.vpub.io").unwrap();
        let key = StorageKey::new(AspectClass::Portrait, "tok123", "mp4");

        assert_eq!(
            config.public_url(key.as_str()),
            "https://cdn.vpub.io/portrait/tok123.mp4"
        );
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let config = DeliveryConfig::new("https://cdn.vpub.io/").unwrap();
        let key = StorageKey::new(AspectClass::Other, "tok", "mp4");

        assert_eq!(config.public_url(key.as_str()), "https://cdn.vpub.io/other/tok.mp4");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            DeliveryConfig::new("not a url"),
            Err(StorageError::ConfigError(_))
        ));
    }
}
