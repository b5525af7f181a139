//! Configuration management for the citation engine.
//!
//! Parses `cite.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ## Environment Variable Expansion
//!
//! `cache.dir` supports environment variable and home directory expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//! - `~/` - expands to the home directory
//!
//! ## Example
//!
//! ```
//! use cite_config::Config;
//!
//! let config = Config::from_toml_str(r#"
//! [cite]
//! groups_enabled = false
//!
//! [messages]
//! cite_references_link_many_format_backlink_labels = "a b c"
//! "#).unwrap();
//!
//! assert!(!config.cite.groups_enabled);
//! assert_eq!(config.messages.len(), 1);
//! ```

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "cite.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine behaviour.
    pub cite: CiteConfig,
    /// Reference list cache.
    cache: CacheConfigRaw,
    /// Message overrides keyed by message key.
    pub messages: BTreeMap<String, String>,

    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Engine behaviour configuration (`[cite]` section).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CiteConfig {
    /// Whether the `group` attribute is accepted on markers and regions.
    pub groups_enabled: bool,
    /// Wrap rendered lists in a responsive container by default.
    pub responsive: bool,
    /// Number of entries above which the responsive wrapper adds columns.
    pub responsive_columns: usize,
    /// Render the pending default group at end of document instead of reporting it.
    pub auto_references: bool,
    /// Directive name of citation markers.
    pub marker: String,
    /// Directive name of rendering regions.
    pub region: String,
}

impl Default for CiteConfig {
    fn default() -> Self {
        Self {
            groups_enabled: true,
            responsive: false,
            responsive_columns: 10,
            auto_references: false,
            marker: "ref".to_owned(),
            region: "references".to_owned(),
        }
    }
}

/// Raw cache configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: bool,
    dir: Option<String>,
    ttl_seconds: u64,
    version: String,
}

impl Default for CacheConfigRaw {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            version: DEFAULT_CACHE_VERSION.to_owned(),
        }
    }
}

/// Default lifetime of a cached reference list (one day).
const DEFAULT_TTL_SECONDS: u64 = 86_400;

/// Default cache format version.
const DEFAULT_CACHE_VERSION: &str = "1";

/// Resolved cache configuration with an absolute directory.
#[derive(Debug)]
pub struct CacheConfig {
    /// Whether reference lists are memoized.
    pub enabled: bool,
    /// Cache directory. `None` means an in-memory cache.
    pub dir: Option<PathBuf>,
    /// Lifetime of a cached fragment.
    pub ttl: Duration,
    /// Cache format version; a mismatch wipes the file cache.
    pub version: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            version: DEFAULT_CACHE_VERSION.to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`cache.dir`").
        field: String,
        /// Error message (e.g., "${`CITE_CACHE`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `cite.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        match Self::discover_config() {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// Relative cache directories resolve against the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let base = std::env::current_dir().unwrap_or_default();
        Self::parse(content, &base)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::parse(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(content: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve_cache(config_dir)?;
        config.validate()?;
        Ok(config)
    }

    /// Expand and resolve the raw `[cache]` section.
    fn resolve_cache(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let dir = match &self.cache.dir {
            Some(raw) => Some(config_dir.join(expand::expand_env(raw, "cache.dir")?)),
            None => None,
        };
        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled,
            dir,
            ttl: Duration::from_secs(self.cache.ttl_seconds),
            version: self.cache.version.clone(),
        };
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_cite()?;
        self.validate_cache()?;
        Ok(())
    }

    fn validate_cite(&self) -> Result<(), ConfigError> {
        require_directive_name(&self.cite.marker, "cite.marker")?;
        require_directive_name(&self.cite.region, "cite.region")?;
        if self.cite.marker == self.cite.region {
            return Err(ConfigError::Validation(
                "cite.marker and cite.region must differ".to_owned(),
            ));
        }
        if self.cite.responsive_columns == 0 {
            return Err(ConfigError::Validation(
                "cite.responsive_columns must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_cache(&self) -> Result<(), ConfigError> {
        if self.cache_resolved.ttl.is_zero() {
            return Err(ConfigError::Validation(
                "cache.ttl_seconds must be greater than 0".to_owned(),
            ));
        }
        if self.cache_resolved.version.is_empty() {
            return Err(ConfigError::Validation(
                "cache.version cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Require a directive name: non-empty, alphanumerics, `-` and `_` only.
fn require_directive_name(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "{field} may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}
