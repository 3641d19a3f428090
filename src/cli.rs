//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Migrate DFID research outputs into publishing documents.
///
/// Transforms SPARQL results describing R4D research outputs into documents
/// for the specialist publisher, and patches its schema facets.
#[derive(Parser, Debug)]
#[command(name = "dfid-transition")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a config file (defaults to $XDG_CONFIG_HOME/dfid-transition/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transform SPARQL JSON results into documents, printed as a JSON array
    Transform(TransformArgs),

    /// Replace the country facet's allowed values from a country register export
    PatchCountries(PatchCountriesArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TransformArgs {
    /// SPARQL 1.1 JSON results file
    pub results: PathBuf,

    /// Download hosted attachments into this directory and print full details
    #[arg(long, requires = "asset_base_url")]
    pub assets_dir: Option<PathBuf>,

    /// Base URL the assets directory is served from
    #[arg(long, requires = "assets_dir")]
    pub asset_base_url: Option<String>,

    /// Append each output's numeric id to its slug
    #[arg(long)]
    pub disambiguate: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PatchCountriesArgs {
    /// Country register export (`{code: {name, end-date?}}`)
    #[arg(long)]
    pub register: PathBuf,

    /// Schema file to patch (defaults to ../specialist-publisher-rebuild/...)
    #[arg(long)]
    pub schema: Option<PathBuf>,
}
