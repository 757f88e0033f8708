//! CLI entry point for pdfharvest.

use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pdfharvest::http::RetryPolicy;
use pdfharvest::{
    Cache, CacheWarning, ClientOptions, CrossrefClient, HarvestOptions, Harvester, HttpClient,
    PdfDownloader, RunReport, UnpaywallClient, parse_doi_list, polite_user_agent,
};
use tracing::{debug, error, info, warn};

mod app_config;
mod cli;
mod logging;
mod output;

use app_config::{Settings, load_file_config};
use cli::Args;

/// Exit code for configuration-level failures.
const EXIT_CONFIG_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let file_config = load_file_config(args.config.as_deref())?;
    let settings = Settings::resolve(&args, file_config.as_ref())?;

    logging::init_tracing(args.default_log_level(), settings.log_file.as_deref())?;
    debug!(?args, "CLI arguments parsed");
    debug!(?settings, "settings resolved");

    if settings.output_dir.exists() && !settings.output_dir.is_dir() {
        bail!(
            "Output path '{}' exists and is not a directory",
            settings.output_dir.display()
        );
    }

    let dois = collect_dois(&args)?;
    if dois.is_empty() {
        println!("{}", output::NO_INPUT_GUIDANCE);
        println!("{}", output::INPUT_PIPE_EXAMPLE);
        return Ok(ExitCode::SUCCESS);
    }
    info!(dois = dois.len(), "pdfharvest starting");

    let retry_policy = RetryPolicy::new(
        settings.max_attempts,
        settings.base_delay,
        settings.max_delay,
        pdfharvest::http::DEFAULT_BACKOFF_MULTIPLIER,
    );
    let http = HttpClient::new(
        ClientOptions::new(polite_user_agent(&settings.email))
            .with_retry_policy(retry_policy)
            .with_timeouts(settings.connect_timeout, settings.request_timeout),
    )
    .context("Failed to build HTTP client")?;

    let cache = open_cache(&settings)?;
    let metadata = Arc::new(CrossrefClient::with_base_url(
        http.clone(),
        settings.email.clone(),
        settings.crossref_api.clone(),
    ));
    let open_access = Arc::new(UnpaywallClient::with_base_url(
        http.clone(),
        settings.email.clone(),
        settings.unpaywall_api.clone(),
    ));
    let fetcher = Arc::new(PdfDownloader::new(http));

    let options = HarvestOptions {
        output_dir: settings.output_dir.clone(),
        force: settings.force,
        refresh: settings.refresh,
        dry_run: settings.dry_run,
    };
    let mut harvester = Harvester::new(metadata, open_access, fetcher, cache, options);

    let progress = output::progress_bar(dois.len(), !args.quiet && io::stderr().is_terminal());
    let report = harvester
        .run_batch_with_progress(&dois, |_, outcome| {
            progress.suspend(|| println!("{}", output::format_outcome_line(outcome)));
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    let summary = report.summary();
    println!("{}", output::format_summary(&summary));

    if let Some(path) = &settings.report_path
        && let Err(e) = RunReport::new(&report, chrono::Utc::now()).write(path)
    {
        error!(error = %e, "failed to write report");
    }

    Ok(ExitCode::from(report.exit_code()))
}

/// Positional DOIs, then `--input` files in order; stdin only when neither
/// was given and stdin is piped.
fn collect_dois(args: &Args) -> Result<Vec<String>> {
    let mut dois: Vec<String> = args.dois.clone();

    for path in &args.inputs {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file '{}'", path.display()))?;
        dois.extend(parse_list(&raw, path));
    }

    if args.dois.is_empty() && args.inputs.is_empty() && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        dois.extend(parse_list(&buffer, Path::new("<stdin>")));
    }

    Ok(dois)
}

fn parse_list(raw: &str, source: &Path) -> Vec<String> {
    let parsed = parse_doi_list(raw);
    info!(
        source = %source.display(),
        dois = parsed.len(),
        skipped = parsed.skipped_count(),
        "Parsed DOI list"
    );
    for skipped in &parsed.skipped {
        warn!(skipped = %skipped, "Skipped line without a DOI");
    }
    parsed.items
}

fn open_cache(settings: &Settings) -> Result<Cache> {
    let ttl = settings
        .cache_ttl
        .map(chrono::Duration::from_std)
        .transpose()
        .context("Cache TTL is out of range")?;
    let cache = match &settings.cache_path {
        Some(path) => Cache::load(path),
        None => {
            debug!("cache disabled, using in-memory cache");
            Cache::in_memory()
        }
    };
    for warning in cache.warnings() {
        match warning {
            CacheWarning::Missing { .. } => debug!(%warning, "cache"),
            CacheWarning::Corrupted { .. } => warn!(%warning, "cache"),
        }
    }
    Ok(cache.with_ttl(ttl))
}
