//! Command-line interface for chronotag.
//!
//! Provides commands for running the annotation pipeline, aligning a single
//! article/response pair, converting JSONL output, and label statistics.

use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::align::align_article;
use crate::config;
use crate::corpus;
use crate::driver::{BatchRunner, Document, GeminiClient, RateLimiter};
use crate::output::convert_jsonl_to_json;
use crate::prompt::PromptBuilder;
use crate::stats::{analyze_corpus, LabelNormalizer};

/// chronotag - LLM-assisted span annotation of historical newspaper corpora
#[derive(Parser, Debug)]
#[command(name = "chronotag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Annotate a configured language corpus end to end
    Annotate {
        /// Language profile name from the config file
        language: String,

        /// Annotate only the first N articles
        #[arg(short, long)]
        limit: Option<usize>,

        /// Override the profile's output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Align one raw model response against one article
    Align {
        /// File with the full article text
        #[arg(short, long)]
        article: PathBuf,

        /// File with the raw response (reads from stdin if not provided)
        #[arg(short, long)]
        response: Option<PathBuf>,
    },

    /// Convert a JSONL corpus to one formatted JSON array
    Convert {
        /// Input JSONL file
        input: PathBuf,

        /// Output JSON file
        output: PathBuf,
    },

    /// Count labels per year and per source
    Stats {
        /// Annotated JSONL corpus
        input: PathBuf,

        /// Bucket years into decades
        #[arg(long)]
        decade: bool,

        /// Skip the label-spelling normalization table
        #[arg(long)]
        raw_labels: bool,

        /// Emit JSON instead of a text table
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Annotate {
                language,
                limit,
                output,
            } => annotate_language(&language, limit, output).await,
            Commands::Align { article, response } => align_one(&article, response.as_deref()),
            Commands::Convert { input, output } => {
                let count = convert_jsonl_to_json(&input, &output)?;
                eprintln!("Converted {} records to {}", count, output.display());
                Ok(())
            }
            Commands::Stats {
                input,
                decade,
                raw_labels,
                json,
            } => show_stats(&input, decade, raw_labels, json),
            Commands::Config => show_config(),
        }
    }
}

/// Run the full pipeline for one configured language.
async fn annotate_language(
    language: &str,
    limit: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let cfg = config::config()?;
    let profile = cfg.language(language)?;

    let api_key = cfg
        .api_key
        .clone()
        .context("No API key configured. Set CHRONOTAG_API_KEY or api.key in the config file")?;

    let mut articles =
        corpus::load_articles(&profile.corpus_csv, profile.delimiter, &profile.columns)?;
    if let Some(limit) = limit {
        articles.truncate(limit);
    }
    if articles.is_empty() {
        anyhow::bail!("Corpus {} contains no articles", profile.corpus_csv.display());
    }

    let builder = PromptBuilder::from_exports(
        &profile.tagset_json,
        &profile.examples_dir,
        profile.example_count,
    )?;

    let documents: Vec<Document> = articles
        .into_iter()
        .map(|article| Document {
            prompt: builder.build_for(&article.text),
            id: article.id,
            article: article.text,
        })
        .collect();

    let client = GeminiClient::new(api_key).with_model(cfg.model.clone());
    let limiter = RateLimiter::new(cfg.max_requests, Duration::from_secs(cfg.period_seconds));
    let runner = BatchRunner::new(client, limiter, cfg.retry.clone());

    let output_path = output.unwrap_or_else(|| profile.output_jsonl.clone());
    let summary = runner.annotate_batch(documents, &output_path).await?;

    eprintln!(
        "\n[{}: {} documents, {} annotations, {} generation failures, {} warnings -> {}]",
        language,
        summary.documents,
        summary.annotations,
        summary.generation_failures,
        summary.warnings,
        output_path.display()
    );
    Ok(())
}

/// Align a single article/response pair and print the result as JSON.
fn align_one(article_path: &std::path::Path, response_path: Option<&std::path::Path>) -> Result<()> {
    let article = std::fs::read_to_string(article_path)
        .with_context(|| format!("Failed to read article {}", article_path.display()))?;

    let response = match response_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read response {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read response from stdin")?;
            buffer
        }
    };

    let alignment = align_article(&article, &response);
    let report = serde_json::json!({
        "annotations": alignment.annotations,
        "warnings": alignment.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn show_stats(
    input: &std::path::Path,
    decade: bool,
    raw_labels: bool,
    json: bool,
) -> Result<()> {
    let normalizer = if raw_labels {
        LabelNormalizer::identity()
    } else {
        LabelNormalizer::default()
    };

    let counts = analyze_corpus(input, &normalizer, decade)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        print!("{}", counts.render());
        println!("Total: {} labels", counts.total());
    }
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!(
        "API key: {}",
        if cfg.api_key.is_some() { "set" } else { "(not set)" }
    );
    println!("Model: {}", cfg.model);
    println!(
        "Rate limit: {} requests / {}s",
        cfg.max_requests, cfg.period_seconds
    );
    println!("Retries: {} attempts", cfg.retry.max_attempts);
    println!();

    if cfg.languages.is_empty() {
        println!("No languages configured");
    } else {
        println!("Languages:");
        for (name, profile) in &cfg.languages {
            println!("  {}:", name);
            println!("    corpus:   {}", profile.corpus_csv.display());
            println!("    tag set:  {}", profile.tagset_json.display());
            println!("    examples: {}", profile.examples_dir.display());
            println!("    output:   {}", profile.output_jsonl.display());
        }
    }

    Ok(())
}
