//! S3-compatible object store client.
//!
//! This crate provides:
//! - File/byte upload under derived storage keys
//! - Storage-key derivation (aspect-class prefix + crypto-random token)
//! - Public distribution URL assembly
//! - Connectivity checks for readiness probes

pub mod client;
pub mod delivery;
pub mod error;
pub mod keys;

pub use client::{ObjectPublisher, StorageClient, StorageConfig};
pub use delivery::DeliveryConfig;
pub use error::{StorageError, StorageResult};
pub use keys::{extension_for, random_token, StorageKey};
