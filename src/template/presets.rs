//! Preset templates and template resolution
//!
//! Resolution order:
//! 1. explicit `--instruction_template`
//! 2. `--template_preset`
//! 3. first preset whose key is a substring of the lowercased dataset name,
//!    scanning [`PRESETS`] in order
//! 4. the `default` preset

use clap::ValueEnum;

use crate::error::Result;

use super::PromptTemplate;

/// Named preset templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum TemplatePreset {
    #[value(name = "gsm8k")]
    Gsm8k,
    #[value(name = "alpaca")]
    Alpaca,
    #[value(name = "squad")]
    Squad,
    #[value(name = "mmlu")]
    Mmlu,
    #[value(name = "tower")]
    Tower,
    #[value(name = "default")]
    Default,
}

/// Preset table in auto-detection priority order (first match wins)
pub const PRESETS: [(TemplatePreset, &str); 6] = [
    (
        TemplatePreset::Gsm8k,
        "Solve this math problem step by step:\n\n{question}",
    ),
    (TemplatePreset::Alpaca, "{instruction}"),
    (
        TemplatePreset::Squad,
        "Answer the following question based on the context.\n\nContext: {context}\n\nQuestion: {question}",
    ),
    (
        TemplatePreset::Mmlu,
        "Answer the following multiple choice question:\n\n{question}",
    ),
    (
        TemplatePreset::Tower,
        "Translate the following {source_lang} source text to {target_lang}:\n{source_lang}: {text}\n{target_lang}: ",
    ),
    (TemplatePreset::Default, "{text}"),
];

impl TemplatePreset {
    /// Lookup key (also the CLI value)
    pub fn key(self) -> &'static str {
        match self {
            Self::Gsm8k => "gsm8k",
            Self::Alpaca => "alpaca",
            Self::Squad => "squad",
            Self::Mmlu => "mmlu",
            Self::Tower => "tower",
            Self::Default => "default",
        }
    }

    /// Template text for this preset
    pub fn template(self) -> &'static str {
        PRESETS
            .iter()
            .find(|(preset, _)| *preset == self)
            .map(|(_, template)| *template)
            .unwrap_or("{text}")
    }
}

impl std::fmt::Display for TemplatePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// How the template was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    Explicit,
    Preset(TemplatePreset),
    AutoDetected(TemplatePreset),
    /// Nothing matched; `default` was used
    Fallback,
}

/// A parsed template and where it came from
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub template: PromptTemplate,
    pub source: TemplateSource,
}

/// First preset whose key occurs in the lowercased dataset name
pub fn detect_preset(dataset: &str) -> Option<TemplatePreset> {
    let name = dataset.to_lowercase();
    PRESETS
        .iter()
        .map(|(preset, _)| *preset)
        .find(|preset| name.contains(preset.key()))
}

/// Choose and parse the prompt template for a run
pub fn resolve_template(
    explicit: Option<&str>,
    preset: Option<TemplatePreset>,
    dataset: &str,
) -> Result<ResolvedTemplate> {
    let (text, source) = match (explicit.filter(|t| !t.is_empty()), preset) {
        (Some(text), _) => (text, TemplateSource::Explicit),
        (None, Some(preset)) => (preset.template(), TemplateSource::Preset(preset)),
        (None, None) => match detect_preset(dataset) {
            Some(preset) => (preset.template(), TemplateSource::AutoDetected(preset)),
            None => (TemplatePreset::Default.template(), TemplateSource::Fallback),
        },
    };

    Ok(ResolvedTemplate {
        template: PromptTemplate::parse(text)?,
        source,
    })
}
