//! Task Source - ordered input records
//!
//! A [`Dataset`] is an ordered list of [`Record`]s, each a JSON object with a
//! dense index assigned at load time. Records never change after loading.
//!
//! ## Sources
//!
//! | `--dataset` value | Loader |
//! |-------------------|--------|
//! | existing `.json` / `.jsonl` file | [`local`] |
//! | existing directory | [`local`] (`<dir>/<subset>/<split>.jsonl` ...) |
//! | anything else | [`hub`] (dataset-server `/rows` pagination) |

pub mod hub;
pub mod local;

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::error::{BatchError, Result};

pub use hub::HubClient;

/// Field name → value mapping of one record
pub type Fields = Map<String, Value>;

/// One input unit with its stable ordinal index
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    index: usize,
    fields: Fields,
}

impl Record {
    pub fn new(index: usize, fields: Fields) -> Self {
        Self { index, fields }
    }

    /// Position of this record in the input, in `[0, n)`
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Look up a single field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

/// Where to load records from
#[derive(Debug, Clone)]
pub struct DatasetSource {
    /// Local path or hub dataset name
    pub dataset: String,
    /// Hub config name (ignored for single files)
    pub subset: String,
    pub split: String,
    /// Dataset-server base URL
    pub hub_url: String,
    /// Optional bearer token for gated hub datasets
    pub hub_token: Option<String>,
}

/// Ordered, immutable record collection
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    name: String,
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from raw JSON values, assigning indices in order.
    ///
    /// Every value must be a JSON object.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(fields) => Ok(Record::new(index, fields)),
                other => Err(BatchError::InvalidRecord {
                    index,
                    reason: format!("expected a JSON object, got {}", json_type(&other)),
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.into(),
            records,
        })
    }

    /// Build a dataset from already-split field maps
    pub fn from_fields(name: impl Into<String>, rows: Vec<Fields>) -> Self {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, fields)| Record::new(index, fields))
            .collect();
        Self {
            name: name.into(),
            records,
        }
    }

    /// Load records from a local path or the hub, depending on `source.dataset`
    #[instrument(skip(source), fields(dataset = %source.dataset, subset = %source.subset, split = %source.split))]
    pub async fn load(source: &DatasetSource) -> Result<Self> {
        let path = Path::new(&source.dataset);

        let values = if tokio::fs::metadata(path).await.is_ok() {
            debug!("Loading dataset from local path");
            local::load_path(path, &source.subset, &source.split).await?
        } else if looks_like_path(&source.dataset) {
            return Err(BatchError::DatasetNotFound {
                dataset: source.dataset.clone(),
            });
        } else {
            debug!(hub_url = %source.hub_url, "Loading dataset from hub");
            let client = HubClient::new(&source.hub_url, source.hub_token.clone())?;
            client
                .fetch_rows(&source.dataset, &source.subset, &source.split)
                .await?
        };

        let dataset = Self::from_values(source.dataset.clone(), values)?;
        info!(records = dataset.len(), "Dataset loaded");
        Ok(dataset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Names that can only mean a file on disk (never a hub dataset id)
fn looks_like_path(dataset: &str) -> bool {
    let lower = dataset.to_ascii_lowercase();
    dataset.starts_with('/')
        || dataset.starts_with("./")
        || dataset.starts_with("../")
        || dataset.starts_with('~')
        || lower.ends_with(".json")
        || lower.ends_with(".jsonl")
        || lower.ends_with(".ndjson")
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
