//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.reposcope/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReposcopeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub countries: CountriesConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub per_page: Option<u32>,
    pub debounce_ms: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GithubConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CountriesConfig {
    pub base_url: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_PER_PAGE: u32 = 50;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_COUNTRIES_BASE_URL: &str = "https://restcountries.com/v2";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub per_page: u32,
    pub debounce: Duration,
    pub log_level: LevelFilter,
    pub github_base_url: String,
    pub github_token: Option<String>,
    pub countries_base_url: String,
}

/// Values from CLI flags; `None` means not specified.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub github_base_url: Option<String>,
    pub countries_base_url: Option<String>,
    pub per_page: Option<u32>,
    pub verbose: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.reposcope/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".reposcope").join("config.toml"))
}

/// Load config from `~/.reposcope/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ReposcopeConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ReposcopeConfig, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(ReposcopeConfig::default())
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<ReposcopeConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ReposcopeConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: ReposcopeConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# reposcope configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# per_page = 50                      # results per request
# debounce_ms = 300                  # pause before a typed search fires
# log_level = "info"                 # "error", "warn", "info", "debug", "trace"

# [github]
# base_url = "https://api.github.com"   # Or set GITHUB_API_URL
# token = "ghp_..."                     # Or set GITHUB_TOKEN

# [countries]
# base_url = "https://restcountries.com/v2"   # Or set COUNTRIES_API_URL
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ReposcopeConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &ReposcopeConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // GitHub base URL: CLI → env → config → default
    let github_base_url = cli
        .github_base_url
        .clone()
        .or_else(|| env("GITHUB_API_URL"))
        .or_else(|| config.github.base_url.clone())
        .unwrap_or_else(|| DEFAULT_GITHUB_BASE_URL.to_string());

    // GitHub token: env → config
    let github_token = env("GITHUB_TOKEN")
        .or_else(|| config.github.token.clone())
        .filter(|t| !t.is_empty());

    // Countries base URL: CLI → env → config → default
    let countries_base_url = cli
        .countries_base_url
        .clone()
        .or_else(|| env("COUNTRIES_API_URL"))
        .or_else(|| config.countries.base_url.clone())
        .unwrap_or_else(|| DEFAULT_COUNTRIES_BASE_URL.to_string());

    // Log level: --verbose → env → config → default
    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        env("REPOSCOPE_LOG_LEVEL")
            .or_else(|| config.general.log_level.clone())
            .and_then(|level| parse_level(&level))
            .unwrap_or(DEFAULT_LOG_LEVEL)
    };

    ResolvedConfig {
        per_page: cli
            .per_page
            .or(config.general.per_page)
            .unwrap_or(DEFAULT_PER_PAGE),
        debounce: Duration::from_millis(
            config.general.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
        ),
        log_level,
        github_base_url,
        github_token,
        countries_base_url,
    }
}

/// Log level usable before the config file has been read: --verbose → env → default.
pub fn startup_log_level(cli: &CliOverrides) -> LevelFilter {
    startup_log_level_with_env(cli, |key| std::env::var(key).ok())
}

fn startup_log_level_with_env(
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> LevelFilter {
    resolve_with_env(&ReposcopeConfig::default(), cli, env).log_level
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.parse() {
        Ok(filter) => Some(filter),
        Err(_) => {
            warn!("Unknown log level '{}', using default", level);
            None
        }
    }
}
