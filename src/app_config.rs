//! Application configuration: TOML file defaults merged with CLI flags.
//!
//! Priority: CLI flag > config file > built-in default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use pdfharvest::http::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
    REQUEST_TIMEOUT_SECS,
};
use pdfharvest::sources::{DEFAULT_CROSSREF_API, DEFAULT_UNPAYWALL_API};
use serde::Deserialize;

use crate::cli::{Args, MAX_CACHE_TTL_SECS};

/// Output directory used when neither flag nor file sets one.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Cache file name inside the output directory.
pub const DEFAULT_CACHE_FILE: &str = "cache.json";

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Contact email for the polite pool.
    pub email: Option<String>,
    /// Directory for downloaded PDFs.
    pub output_dir: Option<PathBuf>,
    /// Cache file location.
    pub cache_path: Option<PathBuf>,
    /// `false` keeps the cache in memory.
    pub cache_enabled: Option<bool>,
    /// Cache entry lifetime in seconds.
    pub cache_ttl_secs: Option<u64>,
    /// Maximum attempts per request (1..=10).
    pub max_retries: Option<u32>,
    /// First backoff delay in milliseconds.
    pub base_delay_ms: Option<u64>,
    /// Backoff ceiling in milliseconds.
    pub max_delay_ms: Option<u64>,
    /// Connect timeout in seconds (1..=3600).
    pub connect_timeout_secs: Option<u64>,
    /// Per-request timeout in seconds (1..=3600).
    pub timeout_secs: Option<u64>,
    /// Additional log file.
    pub log_file: Option<PathBuf>,
    /// Crossref API base URL.
    pub crossref_api: Option<String>,
    /// Unpaywall API base URL.
    pub unpaywall_api: Option<String>,
    /// `false` disables the report file.
    pub report: Option<bool>,
}

impl FileConfig {
    /// Validates value ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_retries) = self.max_retries
            && !(1..=10).contains(&max_retries)
        {
            bail!("Invalid config value for `max_retries`: {max_retries}. Expected range: 1..=10");
        }
        if let Some(ttl) = self.cache_ttl_secs
            && !(1..=MAX_CACHE_TTL_SECS).contains(&ttl)
        {
            bail!(
                "Invalid config value for `cache_ttl_secs`: {ttl}. Expected range: 1..={MAX_CACHE_TTL_SECS}"
            );
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("timeout_secs", self.timeout_secs)?;
        if let (Some(base), Some(max)) = (self.base_delay_ms, self.max_delay_ms)
            && base > max
        {
            bail!(
                "Invalid config values: `base_delay_ms` ({base}) must not exceed `max_delay_ms` ({max})"
            );
        }
        if let Some(email) = &self.email {
            validate_email(email).context("Invalid config value for `email`")?;
        }
        for (field, value) in [
            ("crossref_api", &self.crossref_api),
            ("unpaywall_api", &self.unpaywall_api),
        ] {
            if let Some(value) = value
                && !(value.starts_with("http://") || value.starts_with("https://"))
            {
                bail!("Invalid config value for `{field}`: '{value}'. Expected an http(s) URL");
            }
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Rejects values that cannot be a mailbox (`local@domain`).
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => bail!(
            "'{email}' is not a valid email address\n  Suggestion: Unpaywall requires a real contact address, e.g. --email you@example.org"
        ),
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/pdfharvest/config.toml`
/// 2. `$HOME/.config/pdfharvest/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("pdfharvest")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("pdfharvest")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the file config.
///
/// An explicit path must exist; the default path is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return load_from(path).map(Some);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_from(&path).map(Some),
        _ => Ok(None),
    }
}

fn load_from(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub email: String,
    pub output_dir: PathBuf,
    /// `None` means in-memory cache.
    pub cache_path: Option<PathBuf>,
    pub cache_ttl: Option<Duration>,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub log_file: Option<PathBuf>,
    pub crossref_api: String,
    pub unpaywall_api: String,
    /// `None` means no report.
    pub report_path: Option<PathBuf>,
    pub force: bool,
    pub refresh: bool,
    pub dry_run: bool,
}

impl Settings {
    /// Merges CLI flags over file values over defaults.
    ///
    /// # Errors
    ///
    /// Fails when no valid contact email is configured.
    pub fn resolve(args: &Args, file: Option<&FileConfig>) -> Result<Self> {
        let default_file = FileConfig::default();
        let file = file.unwrap_or(&default_file);

        let Some(email) = args.email.clone().or_else(|| file.email.clone()) else {
            bail!(
                "No contact email configured\n  Suggestion: Pass --email you@example.org or set `email` in the config file"
            );
        };
        validate_email(&email)?;

        let output_dir = args
            .output_dir
            .clone()
            .or_else(|| file.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let cache_enabled = !args.no_cache && file.cache_enabled.unwrap_or(true);
        let cache_path = cache_enabled.then(|| {
            args.cache
                .clone()
                .or_else(|| file.cache_path.clone())
                .unwrap_or_else(|| output_dir.join(DEFAULT_CACHE_FILE))
        });

        let report_enabled = !args.no_report && file.report.unwrap_or(true);
        let report_path = report_enabled.then(|| {
            args.report
                .clone()
                .unwrap_or_else(|| output_dir.join(pdfharvest::harvest::DEFAULT_REPORT_FILE))
        });

        let base_delay = file
            .base_delay_ms
            .map_or(DEFAULT_BASE_DELAY, Duration::from_millis);
        let max_delay = file
            .max_delay_ms
            .map_or(DEFAULT_MAX_DELAY, Duration::from_millis)
            .max(base_delay);

        Ok(Self {
            email: email.trim().to_string(),
            output_dir,
            cache_path,
            cache_ttl: args
                .cache_ttl
                .or(file.cache_ttl_secs)
                .map(Duration::from_secs),
            // The first attempt is not a retry.
            max_attempts: args
                .max_retries
                .or(file.max_retries)
                .map_or(DEFAULT_MAX_ATTEMPTS, |retries| retries + 1),
            base_delay,
            max_delay,
            connect_timeout: Duration::from_secs(
                file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
            ),
            request_timeout: Duration::from_secs(
                args.timeout
                    .or(file.timeout_secs)
                    .unwrap_or(REQUEST_TIMEOUT_SECS),
            ),
            log_file: args.log_file.clone().or_else(|| file.log_file.clone()),
            crossref_api: file
                .crossref_api
                .clone()
                .unwrap_or_else(|| DEFAULT_CROSSREF_API.to_string()),
            unpaywall_api: file
                .unpaywall_api
                .clone()
                .unwrap_or_else(|| DEFAULT_UNPAYWALL_API.to_string()),
            report_path,
            force: args.force,
            refresh: args.refresh,
            dry_run: args.dry_run,
        })
    }
}
