//! Local file loader (`.json`, `.jsonl`, `.ndjson`)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{BatchError, Result};

use super::json_type;

/// Extensions tried, in order, when the dataset is a directory
const DIR_EXTENSIONS: [&str; 2] = ["jsonl", "json"];

/// Load raw record values from a file, or from `<subset>/<split>` inside a directory
pub async fn load_path(path: &Path, subset: &str, split: &str) -> Result<Vec<Value>> {
    let file = if path.is_dir() {
        resolve_split_file(path, subset, split).ok_or_else(|| BatchError::DatasetNotFound {
            dataset: format!(
                "{} (no {subset}/{split}.jsonl or {split}.jsonl found)",
                path.display()
            ),
        })?
    } else {
        path.to_path_buf()
    };

    debug!(file = %file.display(), "Reading dataset file");
    let name = file.display().to_string();
    let text = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| BatchError::DatasetLoad {
            dataset: name.clone(),
            reason: e.to_string(),
        })?;

    if is_line_delimited(&file) {
        parse_jsonl(&text, &name)
    } else {
        parse_json(&text, &name)
    }
}

/// Find `<dir>/<subset>/<split>.<ext>` then `<dir>/<split>.<ext>`
fn resolve_split_file(dir: &Path, subset: &str, split: &str) -> Option<PathBuf> {
    let nested = dir.join(subset);
    let found = [nested.as_path(), dir]
        .into_iter()
        .flat_map(|base| {
            DIR_EXTENSIONS
                .iter()
                .map(move |ext| base.join(format!("{split}.{ext}")))
        })
        .find(|candidate| candidate.is_file());
    found
}

fn is_line_delimited(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson"))
}

/// One JSON value per non-blank line
pub fn parse_jsonl(text: &str, name: &str) -> Result<Vec<Value>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            serde_json::from_str(line).map_err(|e| BatchError::DatasetLoad {
                dataset: name.to_string(),
                reason: format!("line {}: {}", line_no + 1, e),
            })
        })
        .collect()
}

/// A top-level array, an object wrapping one under `rows` or `data`, or
/// JSON Lines saved with a `.json` extension
pub fn parse_json(text: &str, name: &str) -> Result<Vec<Value>> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            // `datasets` writes JSON Lines to `.json` files by default
            if let Ok(values) = parse_jsonl(text, name) {
                debug!(dataset = name, "Parsed .json file as JSON Lines");
                return Ok(values);
            }
            return Err(BatchError::DatasetLoad {
                dataset: name.to_string(),
                reason: e.to_string(),
            });
        }
    };

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            let wrapped = ["rows", "data"]
                .iter()
                .find_map(|key| match map.get(*key) {
                    Some(Value::Array(_)) => map.remove(*key),
                    _ => None,
                });
            match wrapped {
                Some(Value::Array(items)) => Ok(items),
                // a single JSON Lines record
                _ => Ok(vec![Value::Object(map)]),
            }
        }
        other => Err(BatchError::DatasetLoad {
            dataset: name.to_string(),
            reason: format!("expected a top-level array, got {}", json_type(&other)),
        }),
    }
}
