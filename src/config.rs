//! Rewrite configuration.
//!
//! Handles loading, validating and layering the settings that drive every
//! transform in the crate. Configuration is resolved once, then shared
//! read-only; re-initialisation produces a whole new [`RewriteConfig`].
//!
//! ## Layers
//!
//! Later layers override earlier ones, key by key:
//!
//! ```text
//! 1. stock defaults          (RewriteConfig::default)
//! 2. config file             (--config cdn-image.toml)
//! 3. explicit overrides      (CLI flags or host-supplied options)
//! 4. environment             (CDN_IMAGE_HOST, CDN_IMAGE_WEBP, ...)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! admin_context = false       # Apply transforms in admin renders too
//! # cdn_host = "img.example.com"
//! default_query = "auto=format"
//! next_gen_format = true      # Serve .webp when no CDN host is set
//! replace_extension = true    # photo.jpg -> photo.webp (false: photo.jpg.webp)
//!
//! [origin]
//! # content_url = "https://example.com/wp-content"
//! content_path = "/wp-content"
//! upload_folder = "uploads"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value {value:?} for environment variable {var}")]
    Env { var: &'static str, value: String },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Where a render is happening. Admin renders are left untouched unless
/// [`RewriteConfig::admin_context`] is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderContext {
    #[default]
    Public,
    Admin,
}

/// Resolved rewrite settings.
///
/// All fields have defaults. Config files only need the keys they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Apply transforms while rendering admin screens.
    pub admin_context: bool,
    /// Image CDN host name, e.g. `img.example.com`. Absent or blank disables
    /// the CDN rewrite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_host: Option<String>,
    /// Query string appended to every CDN URL.
    pub default_query: String,
    /// Rewrite URLs to `.webp` when no CDN host is configured.
    pub next_gen_format: bool,
    /// Replace the file extension with `.webp` instead of appending it.
    pub replace_extension: bool,
    /// Where original uploads live.
    pub origin: OriginConfig,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            admin_context: false,
            cdn_host: None,
            default_query: "auto=format".to_string(),
            next_gen_format: true,
            replace_extension: true,
            origin: OriginConfig::default(),
        }
    }
}

/// Location of the asset origin's upload directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OriginConfig {
    /// Absolute content URL, e.g. `https://example.com/wp-content`. When set,
    /// only URLs under `{content_url}/{folder}` are rewritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    /// Content path used to recognise uploads on any origin when
    /// `content_url` is not set.
    pub content_path: String,
    /// Upload folder below the content directory.
    pub upload_folder: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            content_url: None,
            content_path: "/wp-content".to_string(),
            upload_folder: "uploads".to_string(),
        }
    }
}

impl RewriteConfig {
    /// The CDN host, if one is configured and non-blank.
    pub fn cdn_host(&self) -> Option<&str> {
        self.cdn_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }

    /// The default CDN query with surrounding whitespace removed.
    pub fn default_query(&self) -> &str {
        self.default_query.trim()
    }

    /// Whether transforms apply in the given render context.
    pub fn is_active(&self, context: RenderContext) -> bool {
        match context {
            RenderContext::Public => true,
            RenderContext::Admin => self.admin_context,
        }
    }

    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = self.cdn_host() {
            if host.contains("://") || host.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "cdn_host must be a bare host name, got {host:?}"
                )));
            }
        }
        if self.origin.upload_folder.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "origin.upload_folder must not be empty".into(),
            ));
        }
        if !self.origin.content_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "origin.content_path must start with '/'".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Environment variables recognised by [`env_overrides`], with the config key
/// each one sets.
pub const ENV_VARS: [(&str, &str); 5] = [
    ("CDN_IMAGE_ADMIN", "admin_context"),
    ("CDN_IMAGE_HOST", "cdn_host"),
    ("CDN_IMAGE_QUERY", "default_query"),
    ("CDN_IMAGE_WEBP", "next_gen_format"),
    ("CDN_IMAGE_EXT_REPLACE", "replace_extension"),
];

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RewriteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file");
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build the environment layer from a variable lookup.
///
/// Returns `Ok(None)` when none of [`ENV_VARS`] is set. Blank values count
/// as unset. Boolean variables accept `1/0`, `true/false`, `yes/no` and
/// `on/off`.
pub fn env_overrides<F>(lookup: F) -> Result<Option<toml::Value>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut table = toml::value::Table::new();
    for (var, key) in ENV_VARS {
        let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let value = match key {
            "cdn_host" | "default_query" => toml::Value::String(raw),
            _ => toml::Value::Boolean(parse_flag(&raw).ok_or(ConfigError::Env {
                var,
                value: raw.clone(),
            })?),
        };
        debug!(var, key, "environment override");
        table.insert(key.to_string(), value);
    }
    Ok((!table.is_empty()).then_some(toml::Value::Table(table)))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Merge optional overlays onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<RewriteConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .flatten()
        .fold(base, merge_toml);
    let config: RewriteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the full configuration: defaults, optional file, explicit overrides,
/// then the process environment.
pub fn load_config(
    path: Option<&Path>,
    overrides: Option<toml::Value>,
) -> Result<RewriteConfig, ConfigError> {
    load_config_with_env(path, overrides, |var| std::env::var(var).ok())
}

/// [`load_config`] with an injectable environment lookup.
pub fn load_config_with_env<F>(
    path: Option<&Path>,
    overrides: Option<toml::Value>,
    lookup: F,
) -> Result<RewriteConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(p) => load_raw_config(p)?,
        None => None,
    };
    let env = env_overrides(lookup)?;
    let config = resolve_config(stock_defaults_value(), [file, overrides, env])?;
    info!(
        cdn_host = config.cdn_host().unwrap_or("-"),
        next_gen_format = config.next_gen_format,
        replace_extension = config.replace_extension,
        "configuration loaded"
    );
    Ok(config)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# CDN Image Rewrite Configuration
# ===============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables override this file:
#   CDN_IMAGE_ADMIN, CDN_IMAGE_HOST, CDN_IMAGE_QUERY,
#   CDN_IMAGE_WEBP, CDN_IMAGE_EXT_REPLACE
#
# Unknown keys will cause an error.

# Apply rewrites while rendering admin screens.
admin_context = false

# Image CDN host. When set, upload URLs are rewritten to https://<cdn_host>/...
# cdn_host = "img.example.com"

# Query string appended to every CDN URL. Empty disables it.
default_query = "auto=format"

# Without a CDN host, serve pre-converted .webp files instead of originals.
next_gen_format = true

# true:  photo.jpg -> photo.webp
# false: photo.jpg -> photo.jpg.webp
replace_extension = true

# ---------------------------------------------------------------------------
# Asset origin
# ---------------------------------------------------------------------------
[origin]
# Absolute content URL. When omitted, any host followed by
# <content_path>/<upload_folder> is treated as the origin.
# content_url = "https://example.com/wp-content"

content_path = "/wp-content"
upload_folder = "uploads"
"##
}
