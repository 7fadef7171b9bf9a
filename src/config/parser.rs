//! Generic configuration parsing utilities.
//!
//! Reads a TOML or JSON file into any `DeserializeOwned` type, choosing the
//! format from the file extension. Errors carry the file path as context.
//!
//! # Usage
//!
//! ```rust,no_run
//! use scaffold_resolver::config::{ResolverSettings, parse_config};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let settings: ResolverSettings = parse_config(Path::new("resolver.toml"))?;
//! println!("ports {}-{}", settings.port_range_low, settings.port_range_high);
//! # Ok(())
//! # }
//! ```
//!
//! Example error output:
//! ```text
//! Failed to parse config file: /path/to/resolver.toml
//! Caused by:
//!     invalid type: string "yes", expected a boolean
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format implied by the path's extension. Anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Parse configuration text in the given format.
pub fn parse_str<T>(content: &str, format: ConfigFormat) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let config = match format {
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
    };
    Ok(config)
}

/// Parse a configuration file into the specified type.
///
/// # Errors
///
/// Returns an error when the file cannot be read, or when its contents are
/// not valid for the format or do not match `T`. The error context names the
/// file and whether reading or parsing failed.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = parse_str(&content, ConfigFormat::from_path(path))
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
