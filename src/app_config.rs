//! Configuration file loading and merging with CLI flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use guarded_fetch::DownloaderConfig;

use crate::cli::Args;

/// TOML-style file configuration for CLI defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Maximum gap between reads in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Default deadline for the whole fetch, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Directory for generated destinations.
    pub temp_dir: Option<PathBuf>,
    /// Minimum interval between progress updates.
    pub progress_interval_ms: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if self.timeout_ms == Some(0) {
            bail!("Invalid config value for `timeout_ms`: 0. Expected a positive value");
        }
        if let Some(interval) = self.progress_interval_ms
            && interval > 60_000
        {
            bail!(
                "Invalid config value for `progress_interval_ms`: {interval}. Expected range: 0..=60000"
            );
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

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Default `EnvFilter` directive for this setting.
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Everything `main` needs after merging file config and CLI flags.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub downloader: DownloaderConfig,
    pub timeout: Option<Duration>,
    pub log_directive: &'static str,
}

/// Merges CLI flags over file values over library defaults.
///
/// Priority for logging: `-q` > `-v` count > file `verbosity` > `info`.
/// `RUST_LOG`, when set, overrides all of these in `main`.
#[must_use]
pub fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> ResolvedSettings {
    let file = file.cloned().unwrap_or_default();
    let defaults = DownloaderConfig::default();

    let downloader = DownloaderConfig {
        connect_timeout_secs: args
            .connect_timeout_secs
            .or(file.connect_timeout_secs)
            .unwrap_or(defaults.connect_timeout_secs),
        read_timeout_secs: args
            .read_timeout_secs
            .or(file.read_timeout_secs)
            .unwrap_or(defaults.read_timeout_secs),
        temp_dir: args.temp_dir.clone().or(file.temp_dir),
        progress_interval_ms: file
            .progress_interval_ms
            .unwrap_or(defaults.progress_interval_ms),
    };

    let timeout = args
        .timeout_ms
        .or(file.timeout_ms)
        .map(Duration::from_millis);

    let log_directive = if args.quiet {
        VerbositySetting::Quiet.filter_directive()
    } else {
        match args.verbose {
            0 => file
                .verbosity
                .unwrap_or(VerbositySetting::Default)
                .filter_directive(),
            1 => VerbositySetting::Verbose.filter_directive(),
            _ => VerbositySetting::Debug.filter_directive(),
        }
    };

    ResolvedSettings {
        downloader,
        timeout,
        log_directive,
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/guarded-fetch/config.toml`
/// 2. `$HOME/.config/guarded-fetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("guarded-fetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("guarded-fetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?);
            }
            "timeout_ms" => {
                cfg.timeout_ms = Some(
                    parse_integer_u64(value)
                        .with_context(|| format!("Invalid `timeout_ms` value on line {line_no}"))?,
                );
            }
            "progress_interval_ms" => {
                cfg.progress_interval_ms = Some(parse_integer_u64(value).with_context(|| {
                    format!("Invalid `progress_interval_ms` value on line {line_no}")
                })?);
            }
            "temp_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `temp_dir` value on line {line_no}"))?;
                cfg.temp_dir = Some(PathBuf::from(parsed));
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
