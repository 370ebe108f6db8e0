//! Faststart container normalization.

use std::path::Path;

use tracing::debug;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::tool::ToolRunner;

/// Rewrite a media file's container layout for progressive-start playback.
///
/// The audio/video payload is stream-copied bit-for-bit; only the container
/// index moves. The input is never modified: output must be a distinct path
/// and the result is always written there.
pub async fn normalize_faststart(
    runner: &dyn ToolRunner,
    input: &Path,
    output: &Path,
) -> MediaResult<()> {
    if input == output {
        return Err(MediaError::internal(
            "faststart normalization requires a distinct output path",
        ));
    }

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(input, output).copy_codecs().faststart();
    let out = runner.run("ffmpeg", &cmd.build_args()).await?;

    if !out.success() {
        return Err(MediaError::tool_failed("ffmpeg", out.stderr, out.exit_code));
    }

    debug!(
        input = %input.display(),
        output = %output.display(),
        "Faststart remux complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::testing::CannedRunner;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remux_invokes_ffmpeg_with_copy_and_faststart() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.mp4");
        tokio::fs::write(&input, b"video").await.unwrap();

        let runner = CannedRunner::new(vec![CannedRunner::ok("")]);
        normalize_faststart(&runner, &input, &dir.path().join("fast.mp4"))
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "ffmpeg");
        assert!(calls[0].1.contains(&"+faststart".to_string()));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_diagnostics() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.mp4");
        tokio::fs::write(&input, b"video").await.unwrap();

        let runner = CannedRunner::new(vec![CannedRunner::failed("moov atom not found", 1)]);
        let err = normalize_faststart(&runner, &input, &dir.path().join("fast.mp4"))
            .await
            .unwrap_err();

        match err {
            MediaError::ToolFailed { stderr, exit_code, .. } => {
                assert!(stderr.contains("moov atom"));
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_path_is_refused_without_spawning() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.mp4");
        tokio::fs::write(&input, b"video").await.unwrap();

        let runner = CannedRunner::new(vec![]);
        let err = normalize_faststart(&runner, &input, &input).await.unwrap_err();

        assert!(matches!(err, MediaError::Internal(_)));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_input_is_refused_without_spawning() {
        let dir = TempDir::new().unwrap();
        let runner = CannedRunner::new(vec![]);
        let err = normalize_faststart(
            &runner,
            &dir.path().join("absent.mp4"),
            &dir.path().join("fast.mp4"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MediaError::FileNotFound(_)));
        assert!(runner.calls.lock().unwrap().is_empty());
    }
}
