//! Migration configuration: hosts, routes, and the owning organisation.
//!
//! Defaults describe the production R4D migration. A `key = value` file
//! (TOML subset: quoted strings, bare integers, string arrays, `#` comments)
//! can override any of them.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Host serving R4D output pages and hosted attachments.
pub const DEFAULT_AUTHORITATIVE_HOST: &str = "r4d.dfid.gov.uk";

/// Linked-development mirror of the R4D triple-store.
pub const DEFAULT_LEGACY_HOST: &str = "linked-development.org";

/// Base URL of the destination publishing platform.
pub const DEFAULT_DESTINATION_BASE_URL: &str = "https://gov.uk";

/// Route prefix under which migrated research outputs are published.
pub const DEFAULT_ROUTE_PREFIX: &str = "/dfid-research-outputs";

/// Content id of the Department for International Development organisation.
pub const DFID_ORGANISATION_CONTENT_ID: &str = "db994552-7644-404d-a770-a2fe659c661f";

/// Default HTTP connect timeout for attachment downloads.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration shared by every transformed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Host whose files are downloaded and re-hosted.
    pub authoritative_host: String,
    /// Host of the legacy linked-development endpoint.
    pub legacy_host: String,
    /// Scheme and host of the destination site, without trailing slash.
    pub destination_base_url: String,
    /// Path prefix for document base paths.
    pub route_prefix: String,
    /// Third-party hosts that mirror hosted files under the same filename.
    pub mirror_hosts: Vec<String>,
    /// DOI resolvers whose landing pages duplicate a hosted file.
    pub doi_hosts: Vec<String>,
    /// Organisation that owns every migrated document.
    pub organisation_content_id: String,
    /// Connect timeout for attachment downloads.
    pub connect_timeout_secs: u64,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            authoritative_host: DEFAULT_AUTHORITATIVE_HOST.to_string(),
            legacy_host: DEFAULT_LEGACY_HOST.to_string(),
            destination_base_url: DEFAULT_DESTINATION_BASE_URL.to_string(),
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            mirror_hosts: vec!["www.gsdrc.org".to_string()],
            doi_hosts: vec!["dx.doi.org".to_string()],
            organisation_content_id: DFID_ORGANISATION_CONTENT_ID.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl MigrationConfig {
    /// Base path for a slug, e.g. `/dfid-research-outputs/my-slug`.
    #[must_use]
    pub fn base_path(&self, slug: &str) -> String {
        format!("{}/{slug}", self.route_prefix.trim_end_matches('/'))
    }

    /// Absolute destination URL for a slug.
    #[must_use]
    pub fn destination_url(&self, slug: &str) -> String {
        format!(
            "{}{}",
            self.destination_base_url.trim_end_matches('/'),
            self.base_path(slug)
        )
    }

    /// Validates values that would otherwise produce broken URLs.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.authoritative_host.trim().is_empty() {
            bail!("Invalid config value for `authoritative_host`: must not be empty");
        }
        if !self.destination_base_url.starts_with("http://")
            && !self.destination_base_url.starts_with("https://")
        {
            bail!(
                "Invalid config value for `destination_base_url`: '{}'. Expected an http(s) URL",
                self.destination_base_url
            );
        }
        if !self.route_prefix.starts_with('/') {
            bail!(
                "Invalid config value for `route_prefix`: '{}'. Expected a leading '/'",
                self.route_prefix
            );
        }
        if !(1..=3600).contains(&self.connect_timeout_secs) {
            bail!(
                "Invalid config value for `connect_timeout_secs`: {}. Expected range: 1..=3600",
                self.connect_timeout_secs
            );
        }
        Ok(())
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/dfid-transition/config.toml`
/// 2. `$HOME/.config/dfid-transition/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("dfid-transition")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("dfid-transition")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads configuration from `path`, or from the default path when `None`.
///
/// A missing default file yields the built-in defaults; a missing explicit
/// file is an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains invalid values.
pub fn load_config(path: Option<&Path>) -> Result<MigrationConfig> {
    if let Some(path) = path {
        return load_file_config(path);
    }

    match resolve_default_config_path() {
        Some(default_path) if default_path.exists() => load_file_config(&default_path),
        _ => {
            debug!("no config file found; using defaults");
            Ok(MigrationConfig::default())
        }
    }
}

fn load_file_config(path: &Path) -> Result<MigrationConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config = parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

fn parse_config_str(raw: &str) -> Result<MigrationConfig> {
    let mut cfg = MigrationConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "authoritative_host" | "legacy_host" | "destination_base_url" | "route_prefix"
            | "organisation_content_id" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_no}"))?;
                let slot = match key {
                    "authoritative_host" => &mut cfg.authoritative_host,
                    "legacy_host" => &mut cfg.legacy_host,
                    "destination_base_url" => &mut cfg.destination_base_url,
                    "route_prefix" => &mut cfg.route_prefix,
                    _ => &mut cfg.organisation_content_id,
                };
                *slot = parsed;
            }
            "mirror_hosts" => {
                cfg.mirror_hosts = parse_string_list(value)
                    .with_context(|| format!("Invalid `mirror_hosts` value on line {line_no}"))?;
            }
            "doi_hosts" => {
                cfg.doi_hosts = parse_string_list(value)
                    .with_context(|| format!("Invalid `doi_hosts` value on line {line_no}"))?;
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
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

fn parse_string_list(raw_value: &str) -> Result<Vec<String>> {
    let inner = raw_value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(raw_value);

    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_string_literal)
        .collect()
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
