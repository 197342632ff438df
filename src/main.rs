//! docsearch CLI
//!
//! Commands:
//!   extract   - Print the index keywords for one document
//!   batch     - Process every file under a directory (JSON lines)
//!   languages - List languages with bundled stop words
//!   config    - Show or initialise the configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use docsearch::rake::SUPPORTED_LANGUAGES;
use docsearch::{Config, Document, KeywordPipeline, Outcome, ProgressTracker, VolumeId};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Turn documents into search-index keywords")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.docsearch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the index keywords for one document
    Extract {
        /// Document to process
        path: PathBuf,

        /// Volume the document belongs to (default: first allowed volume)
        #[arg(long)]
        volume: Option<VolumeId>,

        /// Site locale, e.g. en-US
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Process every file under a directory
    Batch {
        /// Directory to walk
        dir: PathBuf,

        /// Volume the documents belong to (default: first allowed volume)
        #[arg(long)]
        volume: Option<VolumeId>,

        /// Site locale, e.g. en-US
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// List languages with bundled stop words
    Languages,

    /// Show or initialise the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file if none exists
    Init,
    /// Print the config file location
    Path,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Ok(Config::load()?.unwrap_or_default()),
    }
}

fn resolve_volume(config: &Config, volume: Option<VolumeId>) -> VolumeId {
    volume
        .or_else(|| config.policy.index_volumes.first().copied())
        .unwrap_or_default()
}

fn build_document(path: &Path, volume: VolumeId, locale: Option<&str>) -> Result<Document> {
    let id = path.display().to_string();
    let doc = Document::from_path(id, volume, path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    Ok(match locale {
        Some(locale) => doc.with_locale(locale),
        None => doc,
    })
}

/// Documents for every readable file under `dir`; walk and read errors are
/// logged and skipped.
fn collect_documents(dir: &Path, volume: VolumeId, locale: Option<&str>) -> Vec<Document> {
    let mut docs = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match build_document(entry.path(), volume, locale) {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!(error = %e, "Skipping unreadable file"),
        }
    }
    docs
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract { path, volume, locale } => {
            let config = load_config(cli.config.as_deref())?;
            let pipeline = KeywordPipeline::from_config(&config)?;
            let volume = resolve_volume(&config, volume);
            let doc = build_document(&path, volume, locale.as_deref())?;

            match pipeline.process(&doc).await? {
                Outcome::Skipped(reason) => {
                    tracing::debug!(?reason, "Document skipped");
                }
                outcome => {
                    if let Some(text) = outcome.keywords() {
                        println!("{}", text);
                    }
                }
            }
        }

        Commands::Batch { dir, volume, locale } => {
            let config = load_config(cli.config.as_deref())?;
            let pipeline = KeywordPipeline::from_config(&config)?;
            let volume = resolve_volume(&config, volume);

            let docs = collect_documents(&dir, volume, locale.as_deref());
            let mut progress = ProgressTracker::new(docs.len());
            let report = pipeline.run_batch(&docs, &mut progress).await?;
            for entry in &report.entries {
                println!("{}", serde_json::to_string(entry)?);
            }
        }

        Commands::Languages => {
            for code in SUPPORTED_LANGUAGES {
                println!("{}", code);
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(cli.config.as_deref())?;
                let policy = &config.policy;
                println!("{}", "Policy".green().bold());
                println!("  Volumes:      {:?}", policy.index_volumes);
                println!("  Max size:     {} KB", policy.maximum_document_size);
                println!("  pdftotext:    {}", policy.pdftotext_executable);
                match policy.executable_path() {
                    Ok(resolved) => {
                        println!("                {}", resolved.display().to_string().dimmed())
                    }
                    Err(e) => println!("                {}", e.to_string().red()),
                }
                println!("  Timeout:      {}s", policy.extraction_timeout_secs);
                println!("{}", "Storage".green().bold());
                println!("  Engine:       {}", config.storage.engine.name());
                println!(
                    "  Capacity:     {}",
                    docsearch::CapacityPolicy::from_config(&config.storage).capacity()
                );
                println!("{}", "Keywords".green().bold());
                println!("  Merge:        {}", config.keywords.merge_strategy.name());
                println!("  Fallback:     {}", config.keywords.fallback_language);
            }
            ConfigAction::Init => {
                let path = match &cli.config {
                    Some(path) => path.clone(),
                    None => Config::path()?,
                };
                if path.exists() {
                    println!("Config already exists at {}", path.display());
                } else {
                    Config::default().save_to(&path)?;
                    println!("Wrote default config to {}", path.display());
                }
            }
            ConfigAction::Path => {
                println!("{}", Config::path()?.display());
            }
        },
    }

    Ok(())
}
