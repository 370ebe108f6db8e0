//! FFprobe aspect-ratio probing.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use vpub_models::AspectClass;

use crate::error::{MediaError, MediaResult};
use crate::tool::ToolRunner;

/// FFprobe JSON output, restricted to the entries we request.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe the first video stream's pixel dimensions.
///
/// A non-zero FFprobe exit surfaces as [`MediaError::ToolFailed`]; output
/// that is not a well-formed object carrying numeric width and height for
/// the stream surfaces as [`MediaError::MalformedOutput`], a defect in the
/// analysis step rather than in the input.
pub async fn probe_dimensions(runner: &dyn ToolRunner, path: &Path) -> MediaResult<(u32, u32)> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let args: Vec<String> = [
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=width,height",
        "-of",
        "json",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(path.to_string_lossy().to_string()))
    .collect();

    let out = runner.run("ffprobe", &args).await?;

    if !out.success() {
        return Err(MediaError::tool_failed("ffprobe", out.stderr, out.exit_code));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&out.stdout)
        .map_err(|e| MediaError::malformed("ffprobe", e.to_string()))?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| MediaError::malformed("ffprobe", "no video stream in probe output"))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(MediaError::malformed(
            "ffprobe",
            "video stream missing width/height",
        )),
    }
}

/// Probe a staged media file and derive its aspect class.
pub async fn classify_aspect(runner: &dyn ToolRunner, path: &Path) -> MediaResult<AspectClass> {
    let (width, height) = probe_dimensions(runner, path).await?;
    let class = AspectClass::from_dimensions(width, height);

    debug!(width, height, class = %class, "Classified video geometry");

    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::testing::CannedRunner;
    use tempfile::TempDir;

    async fn staged_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("fast.mp4");
        tokio::fs::write(&path, b"video").await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_portrait_classification() {
        let dir = TempDir::new().unwrap();
        let path = staged_file(&dir).await;

        let runner = CannedRunner::new(vec![CannedRunner::ok(
            r#"{"programs": [], "streams": [{"width": 1080, "height": 1920}]}"#,
        )]);

        let class = classify_aspect(&runner, &path).await.unwrap();
        assert_eq!(class, AspectClass::Portrait);

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].0, "ffprobe");
        assert!(calls[0].1.contains(&"v:0".to_string()));
        assert!(calls[0].1.contains(&"json".to_string()));
    }

    #[tokio::test]
    async fn test_landscape_classification() {
        let dir = TempDir::new().unwrap();
        let path = staged_file(&dir).await;

        let runner = CannedRunner::new(vec![CannedRunner::ok(
            r#"{"streams": [{"width": 1920, "height": 1080}]}"#,
        )]);

        assert_eq!(
            classify_aspect(&runner, &path).await.unwrap(),
            AspectClass::Landscape
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_processing_failure() {
        let dir = TempDir::new().unwrap();
        let path = staged_file(&dir).await;

        let runner = CannedRunner::new(vec![CannedRunner::failed("Invalid data found", 1)]);
        let err = probe_dimensions(&runner, &path).await.unwrap_err();

        assert!(matches!(err, MediaError::ToolFailed { .. }));
    }

    #[tokio::test]
    async fn test_unparsable_output_is_format_failure() {
        let dir = TempDir::new().unwrap();
        let path = staged_file(&dir).await;

        let runner = CannedRunner::new(vec![CannedRunner::ok("not json at all")]);
        let err = probe_dimensions(&runner, &path).await.unwrap_err();

        assert!(matches!(err, MediaError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn test_missing_dimensions_is_format_failure() {
        let dir = TempDir::new().unwrap();
        let path = staged_file(&dir).await;

        let runner = CannedRunner::new(vec![CannedRunner::ok(
            r#"{"streams": [{"width": 1080}]}"#,
        )]);
        let err = probe_dimensions(&runner, &path).await.unwrap_err();

        assert!(matches!(err, MediaError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn test_empty_streams_is_format_failure() {
        let dir = TempDir::new().unwrap();
        let path = staged_file(&dir).await;

        let runner = CannedRunner::new(vec![CannedRunner::ok(r#"{"streams": []}"#)]);
        let err = probe_dimensions(&runner, &path).await.unwrap_err();

        assert!(matches!(err, MediaError::MalformedOutput { .. }));
    }
}
