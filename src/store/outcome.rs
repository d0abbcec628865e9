//! Outcome - terminal result of one task
//!
//! Serialized shape (one entry of the predictions array):
//!
//! ```text
//! success: {"idx": 0, "prompt": "...", "response": "...", <record fields...>}
//! failure: {"idx": 0, "error": "..."}
//! ```
//!
//! `response` is `null` when the server replied without message content.
//! Record fields follow the generated keys; a record field named `idx`,
//! `prompt` or `response` overwrites the generated value in place.

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::dataset::Fields;

/// Successful inference for one record
#[derive(Debug, Clone, PartialEq)]
pub struct Success {
    index: usize,
    prompt: String,
    /// `None` when the server replied without message content
    response: Option<String>,
    fields: Fields,
}

/// Failed task for one record
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    index: usize,
    error: String,
}

/// Terminal state of a task; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded(Success),
    Failed(Failure),
}

impl Outcome {
    pub fn success(
        index: usize,
        prompt: impl Into<String>,
        response: impl Into<String>,
        fields: Fields,
    ) -> Self {
        Self::Succeeded(Success {
            index,
            prompt: prompt.into(),
            response: Some(response.into()),
            fields,
        })
    }

    /// Success whose reply carried no message content; serialized as `"response": null`
    pub fn success_without_content(index: usize, prompt: impl Into<String>, fields: Fields) -> Self {
        Self::Succeeded(Success {
            index,
            prompt: prompt.into(),
            response: None,
            fields,
        })
    }

    pub fn failure(index: usize, error: impl ToString) -> Self {
        Self::Failed(Failure {
            index,
            error: error.to_string(),
        })
    }

    /// Index of the record this outcome belongs to
    pub fn index(&self) -> usize {
        match self {
            Self::Succeeded(s) => s.index,
            Self::Failed(f) => f.index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn prompt(&self) -> Option<&str> {
        match self {
            Self::Succeeded(s) => Some(&s.prompt),
            Self::Failed(_) => None,
        }
    }

    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Succeeded(s) => s.response.as_deref(),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(f) => Some(&f.error),
            Self::Succeeded(_) => None,
        }
    }

    /// Original record fields (successes only)
    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Self::Succeeded(s) => Some(&s.fields),
            Self::Failed(_) => None,
        }
    }

    /// The JSON object written to the predictions file
    pub fn to_json(&self) -> Value {
        let mut entry = Map::new();
        match self {
            Self::Succeeded(s) => {
                entry.insert("idx".into(), Value::from(s.index));
                entry.insert("prompt".into(), Value::String(s.prompt.clone()));
                entry.insert(
                    "response".into(),
                    s.response.clone().map_or(Value::Null, Value::String),
                );
                for (key, value) in &s.fields {
                    entry.insert(key.clone(), value.clone());
                }
            }
            Self::Failed(f) => {
                entry.insert("idx".into(), Value::from(f.index));
                entry.insert("error".into(), Value::String(f.error.clone()));
            }
        }
        Value::Object(entry)
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
