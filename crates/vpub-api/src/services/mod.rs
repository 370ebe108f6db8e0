//! Business logic services.

pub mod upload;

pub use upload::{DeclaredPayload, UploadPolicy, UploadService};
