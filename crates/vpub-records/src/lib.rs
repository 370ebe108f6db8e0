//! Firestore-backed metadata record store.
//!
//! This crate provides:
//! - A Firestore REST client with cached bearer tokens
//! - The [`VideoStore`] collaborator interface (fetch-by-id, update-by-value)
//! - Document/record field mapping

pub mod client;
pub mod error;
pub mod types;
pub mod videos;

pub use client::{FirestoreClient, RecordsConfig, TokenSource};
pub use error::{RecordsError, RecordsResult};
pub use types::{Document, Value};
pub use videos::{FirestoreVideoStore, VideoStore};
