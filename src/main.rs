//! batch-infer CLI - batch inference against an OpenAI-compatible server

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use batch_infer::config::mask_api_key;
use batch_infer::error::{FixSuggestion, Result};
use batch_infer::runtime::{ConcurrencyLimiter, Dispatcher, RequestExecutor, RunStats};
use batch_infer::template::{resolve_template, TemplatePreset, TemplateSource};
use batch_infer::util::{DEFAULT_BASE_URL, DEFAULT_HUB_URL};
use batch_infer::{write_predictions, Dataset, OpenAIProvider, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "batch-infer")]
#[command(about = "Run a dataset through an OpenAI-compatible inference server")]
#[command(version)]
struct Cli {
    /// Model name sent with every request
    #[arg(long)]
    model: String,

    /// Local JSON/JSONL file or directory, or a hub dataset name
    #[arg(long)]
    dataset: String,

    /// Dataset split
    #[arg(long, default_value = "test")]
    split: String,

    /// Dataset subset (hub config name)
    #[arg(long, default_value = "main")]
    subset: String,

    /// OpenAI-compatible API root
    #[arg(long = "base_url", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Maximum tokens to generate per record
    #[arg(long = "max_tokens", default_value_t = 512)]
    max_tokens: u32,

    /// Maximum number of requests in flight at once
    #[arg(long = "max_concurrent", default_value_t = 100)]
    max_concurrent: usize,

    /// Prompt template with {field} placeholders
    #[arg(long = "instruction_template")]
    instruction_template: Option<String>,

    /// Named preset template
    #[arg(long = "template_preset", value_enum)]
    template_preset: Option<TemplatePreset>,

    /// Predictions file
    #[arg(long, default_value = "predictions.json")]
    output: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long = "request_timeout", default_value_t = 120)]
    request_timeout: u64,

    /// Dataset-server used for hub datasets
    #[arg(long = "hub_url", default_value = DEFAULT_HUB_URL)]
    hub_url: String,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            split: self.split,
            subset: self.subset,
            base_url: self.base_url,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_concurrent: self.max_concurrent,
            instruction_template: self.instruction_template,
            template_preset: self.template_preset,
            output: self.output,
            request_timeout: Duration::from_secs(self.request_timeout),
            hub_url: self.hub_url,
            ..RunConfig::new(self.model, self.dataset)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the run notices
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config().with_env();

    match run(&config).await {
        Ok(stats) => {
            println!(
                "{} Generated {} predictions, saved to {}",
                "✓".green(),
                stats.total,
                config.output.display()
            );
            println!(
                "  {} succeeded, {} failed in {:.1}s",
                stats.succeeded.to_string().green(),
                if stats.failed > 0 {
                    stats.failed.to_string().red()
                } else {
                    stats.failed.to_string().normal()
                },
                stats.elapsed.as_secs_f64()
            );
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

async fn run(config: &RunConfig) -> Result<RunStats> {
    config.validate()?;

    let resolved = resolve_template(
        config.instruction_template.as_deref(),
        config.template_preset,
        &config.dataset,
    )?;
    match resolved.source {
        TemplateSource::AutoDetected(preset) => {
            println!("{} Auto-detected template: {}", "→".cyan(), preset.key().cyan().bold());
        }
        TemplateSource::Fallback => {
            println!(
                "{} Using default template. Consider using --instruction_template or --template_preset",
                "!".yellow()
            );
        }
        TemplateSource::Explicit | TemplateSource::Preset(_) => {}
    }
    println!("{} Template: {}", "→".cyan(), resolved.template);

    let dataset = Dataset::load(&config.dataset_source()).await?;

    if let Some(key) = &config.api_key {
        debug!(api_key = %mask_api_key(key, 7), "Using API key from environment");
    }
    let provider = OpenAIProvider::new(
        &config.base_url,
        config.api_key.clone(),
        config.request_timeout,
    )?;
    println!(
        "{} Model: {} | endpoint: {} | max_concurrent: {}",
        "→".cyan(),
        config.model.cyan().bold(),
        provider.endpoint(),
        config.max_concurrent
    );

    let dispatcher = Dispatcher::new(
        RequestExecutor::new(Arc::new(provider), config.infer_settings()),
        ConcurrencyLimiter::new(config.max_concurrent)?,
        resolved.template,
    );
    let report = dispatcher.run(dataset.into_records()).await?;

    write_predictions(&config.output, &report.outcomes).await?;
    Ok(report.stats)
}
