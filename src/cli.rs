//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Upper bound for `--cache-ttl`: 100 years.
pub const MAX_CACHE_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Fetch Crossref metadata and open-access PDFs for a list of DOIs.
///
/// DOIs come from positional arguments, `--input` list files, or stdin when
/// piped. Every answer is cached so re-runs only hit the network for DOIs
/// that are new or still incomplete.
#[derive(Parser, Debug)]
#[command(name = "pdfharvest")]
#[command(author, version, about)]
pub struct Args {
    /// DOIs to harvest (bare, doi: prefixed, or https://doi.org/ URLs)
    #[arg(value_name = "DOI")]
    pub dois: Vec<String>,

    /// File with one DOI per line (`#` starts a comment); repeatable
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Directory for downloaded PDFs [default: output]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Cache file [default: <output-dir>/cache.json]
    #[arg(long, value_name = "PATH", conflicts_with = "no_cache")]
    pub cache: Option<PathBuf>,

    /// Keep the cache in memory only
    #[arg(long)]
    pub no_cache: bool,

    /// Ignore cache entries older than this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=MAX_CACHE_TTL_SECS))]
    pub cache_ttl: Option<u64>,

    /// Overwrite PDFs that already exist
    #[arg(short, long)]
    pub force: bool,

    /// Ignore cached answers (fresh answers are still cached)
    #[arg(long)]
    pub refresh: bool,

    /// Look everything up but do not download PDFs
    #[arg(long)]
    pub dry_run: bool,

    /// Contact email sent to Crossref and Unpaywall (required by Unpaywall)
    #[arg(short, long, value_name = "EMAIL")]
    pub email: Option<String>,

    /// Config file [default: $XDG_CONFIG_HOME/pdfharvest/config.toml]
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Retries after a transient failure, on top of the first attempt (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: Option<u32>,

    /// Per-request timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Report file [default: <output-dir>/report.json]
    #[arg(long, value_name = "PATH", conflicts_with = "no_report")]
    pub report: Option<PathBuf>,

    /// Do not write a report file
    #[arg(long)]
    pub no_report: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Default log level: `-q` → error, `-v` → debug, `-vv` → trace, else info.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
