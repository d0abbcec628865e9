//! Prompt Formatter - `{field}` substitution
//!
//! Templates are parsed once into segments and rendered against each record.
//!
//! Syntax:
//! - `{field}` → value of `field` in the record
//! - `{{` / `}}` → literal `{` / `}`
//!
//! String values are inserted verbatim; any other JSON value is inserted as its
//! compact JSON text (`42`, `true`, `["a","b"]`).

pub mod presets;

use serde_json::Value;

use crate::dataset::Fields;
use crate::error::{BatchError, Result};

pub use presets::{detect_preset, resolve_template, ResolvedTemplate, TemplatePreset, TemplateSource, PRESETS};

/// Parsed template fragment
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed, reusable prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template string.
    ///
    /// Fails on `{}` and on unbalanced braces.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' if chars.peek().map(|(_, c)| *c) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(BatchError::TemplateParse {
                                    position: inner_pos,
                                    details: "unexpected '{' inside placeholder".to_string(),
                                })
                            }
                            c => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(BatchError::TemplateParse {
                            position: pos,
                            details: "unclosed placeholder".to_string(),
                        });
                    }
                    if name.is_empty() {
                        return Err(BatchError::TemplateParse {
                            position: pos,
                            details: "empty placeholder '{}' (name the field)".to_string(),
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name));
                }
                '}' if chars.peek().map(|(_, c)| *c) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(BatchError::TemplateParse {
                        position: pos,
                        details: "single '}' (write '}}' for a literal brace)".to_string(),
                    });
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Field names referenced by the template, in order of appearance
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render against one record's fields
    pub fn render(&self, fields: &Fields) -> Result<String> {
        let mut out = String::with_capacity(self.source.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => match fields.get(name) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&other.to_string()),
                    None => {
                        return Err(BatchError::TemplateFieldMissing {
                            field: name.clone(),
                        })
                    }
                },
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
