//! Configuration file parser for ~/.config/minifeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Options that change how feeds are parsed.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserOptions {
    /// Whether a link that can be neither resolved nor repaired aborts the
    /// parse. When false the link is dropped and its item kept.
    pub strict_links: bool,

    /// SEC-003: Maximum element nesting depth.
    pub max_depth: usize,

    /// Encoding label used when neither the caller, a byte order mark, nor
    /// the XML declaration names one.
    pub default_encoding: Option<String>,
}

impl ParserOptions {
    /// Nesting depth allowed by default. Real feeds rarely exceed ten levels.
    pub const DEFAULT_MAX_DEPTH: usize = 64;
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strict_links: true,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            default_encoding: None,
        }
    }
}

/// Options for the command-line report.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayOptions {
    /// Terminal columns available to titles and summaries (0 = no limit).
    pub summary_width: usize,

    /// Whether the report lists every item or only the channel header.
    pub show_items: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            summary_width: 80,
            show_items: true,
        }
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub parser: ParserOptions,
    pub display: DisplayOptions,
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            strict_links = config.parser.strict_links,
            max_depth = config.parser.max_depth,
            "Loaded configuration"
        );
        Ok(config)
    }
}

/// Logs keys the config structs do not know about, including section keys.
fn warn_unknown_keys(raw: &toml::Table) {
    const SECTIONS: &[(&str, &[&str])] = &[
        ("parser", &["strict_links", "max_depth", "default_encoding"]),
        ("display", &["summary_width", "show_items"]),
    ];

    for (key, value) in raw {
        let Some((_, known)) = SECTIONS.iter().find(|(name, _)| *name == key.as_str()) else {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            continue;
        };
        if let Some(table) = value.as_table() {
            for sub_key in table.keys() {
                if !known.contains(&sub_key.as_str()) {
                    tracing::warn!(
                        key = %format!("{}.{}", key, sub_key),
                        "Unknown key in config file, ignoring"
                    );
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
