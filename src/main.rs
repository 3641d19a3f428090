//! CLI entry point for dfid-transition.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dfid_transition::assets::DirectoryAssetStore;
use dfid_transition::config::{MigrationConfig, load_config};
use dfid_transition::fetch::{AttachmentFetcher, HttpFetcher};
use dfid_transition::patch::{SchemaPatch, load_register};
use dfid_transition::transform::{Document, SparqlResults};
use serde_json::Value;
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command, PatchCountriesArgs, TransformArgs};

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Partial,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

/// Maps transformed/failed record counts to the process exit outcome.
fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if completed > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = load_config(args.config.as_deref())?;
    config.validate()?;

    let exit = match &args.command {
        Command::Transform(transform_args) => run_transform(transform_args, &config).await?,
        Command::PatchCountries(patch_args) => run_patch_countries(patch_args)?,
    };

    Ok(exit.into())
}

async fn run_transform(args: &TransformArgs, config: &MigrationConfig) -> Result<ProcessExit> {
    let raw = tokio::fs::read_to_string(&args.results)
        .await
        .with_context(|| format!("Failed to read results file: {}", args.results.display()))?;
    let results: SparqlResults = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid SPARQL JSON results in {}", args.results.display()))?;

    let store = match (&args.assets_dir, &args.asset_base_url) {
        (Some(dir), Some(base_url)) => Some(DirectoryAssetStore::new(dir, base_url.as_str())),
        _ => None,
    };
    let fetcher: Option<Arc<dyn AttachmentFetcher>> = if store.is_some() {
        Some(Arc::new(HttpFetcher::with_connect_timeout(
            config.connect_timeout_secs,
        )?))
    } else {
        None
    };

    let total = results.results.bindings.len();
    info!(records = total, "Transforming research outputs");

    let mut outputs: Vec<Value> = Vec::with_capacity(total);
    let mut failed = 0usize;

    for (index, binding) in results.results.bindings.iter().enumerate() {
        let mut document = match Document::from_source(binding, config) {
            Ok(document) => document,
            Err(error) => {
                warn!(index, %error, "Skipping record that failed to assemble");
                failed += 1;
                continue;
            }
        };

        if args.disambiguate {
            document.disambiguate();
        }

        let output = match (&store, &fetcher) {
            (Some(store), Some(fetcher)) => {
                match document.save_attachments(Arc::clone(fetcher), store).await {
                    Ok(_) => document.presented_details(),
                    Err(error) => Err(error),
                }
            }
            _ => serde_json::to_value(document.preview()).map_err(Into::into),
        };

        match output {
            Ok(value) => outputs.push(value),
            Err(error) => {
                warn!(index, slug = %document.slug(), %error, "Skipping record");
                failed += 1;
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&outputs)?);

    info!(
        transformed = outputs.len(),
        failed,
        total,
        "Transformation complete"
    );

    Ok(determine_exit_outcome(outputs.len(), failed))
}

fn run_patch_countries(args: &PatchCountriesArgs) -> Result<ProcessExit> {
    let register = load_register(&args.register).with_context(|| {
        format!(
            "Failed to load country register: {}",
            args.register.display()
        )
    })?;
    let patch = SchemaPatch::new(args.schema.clone())?;
    let count = patch
        .run(&register)
        .with_context(|| format!("Failed to patch {}", patch.location().display()))?;

    info!(countries = count, schema = %patch.location().display(), "Country facet patched");
    Ok(ProcessExit::Success)
}
