//! Predictions file writer
//!
//! The finalized outcomes are written as one pretty-printed JSON array. The
//! bytes go to a sibling temporary file first and are renamed over the target,
//! so a failed write never leaves a truncated predictions file behind.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::{BatchError, Result};
use crate::store::Outcome;

/// Serialize `outcomes` to `path` as a JSON array
#[instrument(skip(outcomes), fields(path = %path.display(), entries = outcomes.len()))]
pub async fn write_predictions(path: &Path, outcomes: &[Outcome]) -> Result<()> {
    let bytes = render_predictions(outcomes)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_error(path, e))?;
    }

    let tmp = temp_path(path);
    if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_error(path, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_error(path, e));
    }

    debug!(bytes = bytes.len(), "Predictions written");
    Ok(())
}

/// The predictions document, 2-space indented, with a trailing newline
pub fn render_predictions(outcomes: &[Outcome]) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(outcomes)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "predictions.json".into());
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn write_error(path: &Path, e: std::io::Error) -> BatchError {
    BatchError::OutputWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Fields;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn outcomes() -> Vec<Outcome> {
        let fields: Fields = json!({"question": "1+1"}).as_object().cloned().unwrap();
        vec![
            Outcome::success(0, "Solve: 1+1", "2", fields),
            Outcome::failure(1, "[BATCH-031] Request timed out after 120s"),
        ]
    }

    #[test]
    fn test_render_is_two_space_indented() {
        let text = String::from_utf8(render_predictions(&outcomes()).unwrap()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"idx\": 0,\n    \"prompt\""));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_predictions(&[]).unwrap(), b"[]\n".to_vec());
    }

    #[tokio::test]
    async fn test_write_predictions_roundtrip_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("predictions.json");

        write_predictions(&path, &outcomes()).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            json!([
                {"idx": 0, "prompt": "Solve: 1+1", "response": "2", "question": "1+1"},
                {"idx": 1, "error": "[BATCH-031] Request timed out after 120s"}
            ])
        );

        // no temp file left behind
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_write_into_missing_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        // parent is a regular file, so the directory cannot be created
        let err = write_predictions(&blocker.join("predictions.json"), &outcomes())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BATCH-061");
        assert!(err.is_fatal());
    }
}
