#![deny(unreachable_patterns)]
//! FFmpeg/FFprobe CLI wrapper for upload processing.
//!
//! This crate provides:
//! - An injectable [`ToolRunner`] abstraction over external-process spawning
//! - Type-safe FFmpeg command building
//! - Faststart container normalization (stream-copy remux)
//! - Aspect-ratio probing via FFprobe's JSON output
//! - A staging area with guaranteed temp-file cleanup

pub mod command;
pub mod error;
pub mod normalize;
pub mod probe;
pub mod staging;
pub mod tool;

pub use command::FfmpegCommand;
pub use error::{MediaError, MediaResult};
pub use normalize::normalize_faststart;
pub use probe::{classify_aspect, probe_dimensions};
pub use staging::{StagedFile, StagedFileWriter, StagingArea};
pub use tool::{SystemToolRunner, ToolOutput, ToolRunner};
