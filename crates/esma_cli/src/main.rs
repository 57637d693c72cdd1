//! esma: command-line access to ESMA and FCA register data.
//!
//! Provides `esma files` and `esma fca-files` for file listings, `esma latest`
//! for the most recent full transparency files, `esma download` for explicit
//! files and `esma ssr` for short-selling exempted shares.

#![warn(missing_docs)]

mod context;
mod download;
mod files;
mod latest;
mod output;
mod ssr;

use std::process;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use esma_loader::{Cfi, Dataset};

/// esma: ESMA register data loader.
#[derive(Parser, Debug)]
#[command(name = "esma", version, about = "ESMA register data loader")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `esma.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List MiFID register files.
    Files(FilesArgs),
    /// List FCA FIRDS full files.
    FcaFiles(FcaFilesArgs),
    /// Download the most recent transparency files.
    Latest(LatestArgs),
    /// Download and parse specific files.
    Download(DownloadArgs),
    /// List short-selling exempted shares.
    Ssr(SsrArgs),
}

/// Overrides for the `[query]` configuration section.
#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// First date of the query window (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last date of the query window (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Maximum number of listed files.
    #[arg(long)]
    pub limit: Option<u32>,
}

/// Caching controls, combined with the `[download]` configuration section.
#[derive(Args, Debug, Default)]
pub struct CacheArgs {
    /// Save parsed files in the cache.
    #[arg(long)]
    pub save: bool,

    /// Ignore cached files and download again.
    #[arg(long)]
    pub update: bool,
}

/// Arguments for the `esma files` subcommand.
#[derive(Parser, Debug)]
pub struct FilesArgs {
    /// Datasets to list (fitrs, firds, dvcap). Defaults to all three.
    #[arg(short, long = "dataset", value_name = "NAME")]
    pub datasets: Vec<Dataset>,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `esma fca-files` subcommand.
#[derive(Parser, Debug)]
pub struct FcaFilesArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `esma latest` subcommand.
#[derive(Parser, Debug)]
pub struct LatestArgs {
    /// Listing file type to select.
    #[arg(long, default_value = "Full")]
    pub file_type: String,

    /// Select double volume cap files instead of FITRS files.
    #[arg(long)]
    pub vcap: bool,

    /// Restrict to files listing these ISINs, when any match.
    #[arg(long, num_args = 1..)]
    pub isin: Vec<String>,

    /// CFI class of the instruments.
    #[arg(long, default_value = "E")]
    pub cfi: Cfi,

    /// Select non-equity instead of equity instrument files.
    #[arg(long)]
    pub non_equity: bool,

    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `esma download` subcommand.
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// File URLs.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Parse as reference-data files instead of transparency files.
    #[arg(long)]
    pub reference: bool,

    #[command(flatten)]
    pub cache: CacheArgs,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `esma ssr` subcommand.
#[derive(Parser, Debug)]
pub struct SsrArgs {
    /// Keep every exemption instead of those in force.
    #[arg(long, conflicts_with = "date")]
    pub all: bool,

    /// Date the exemptions must be in force on (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Table output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated values with a header row.
    Text,
    /// A JSON array with one object per row.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    context::init_logging(&global);

    let result = match cli.command {
        Command::Files(ref args) => files::run(args, &global),
        Command::FcaFiles(ref args) => files::run_fca(args, &global),
        Command::Latest(ref args) => latest::run(args, &global),
        Command::Download(ref args) => download::run(args, &global),
        Command::Ssr(ref args) => ssr::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
