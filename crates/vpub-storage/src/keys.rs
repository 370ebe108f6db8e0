//! Storage-key derivation.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

use vpub_models::AspectClass;

/// Bytes of entropy per storage-key token.
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh URL-safe storage-key token.
///
/// 256 bits from a cryptographically secure source. The token is not a
/// secret; the generator strength is what keeps concurrent uploads from
/// ever colliding on a key.
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derive the file extension from a declared media type.
///
/// Takes the subtype segment verbatim (`video/mp4` → `mp4`). Callers must
/// constrain the declared type to the accepted set before this runs.
pub fn extension_for(content_type: &str) -> Option<&str> {
    content_type
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .filter(|s| !s.is_empty())
}

/// Object-store key of a published artifact: `{class}/{token}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(class: AspectClass, token: &str, ext: &str) -> Self {
        Self(format!("{}/{}.{}", class.as_str(), token, ext))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
