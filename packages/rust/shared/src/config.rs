//! Application configuration for docdex.
//!
//! User config lives at `~/.docdex/docdex.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DocdexError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docdex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docdex";

// ---------------------------------------------------------------------------
// Config structs (matching docdex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target documentation site.
    #[serde(default)]
    pub site: SiteConfig,

    /// Crawl cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Video library settings.
    #[serde(default)]
    pub videos: VideosConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name used in rendered responses (defaults to the URL host).
    #[serde(default)]
    pub name: String,

    /// Base URL of the documentation site to crawl.
    #[serde(default)]
    pub base_url: String,

    /// Maximum number of pages per crawl.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum link depth from the seed page.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_url: String::new(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_pages() -> usize {
    50
}
fn default_max_depth() -> u32 {
    3
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding per-site snapshot files.
    #[serde(default = "default_cache_dir")]
    pub dir: String,

    /// Snapshot time-to-live in hours.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

fn default_cache_dir() -> String {
    "~/.docdex/cache".into()
}
fn default_ttl_hours() -> u64 {
    24
}

/// `[videos]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideosConfig {
    /// Path to the curated video metadata file.
    #[serde(default = "default_videos_path")]
    pub path: String,
}

impl Default for VideosConfig {
    fn default() -> Self {
        Self {
            path: default_videos_path(),
        }
    }
}

fn default_videos_path() -> String {
    "~/.docdex/videos.json".into()
}

// ---------------------------------------------------------------------------
// Retrieval config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime retrieval configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Display name for rendered responses.
    pub name: String,
    /// Normalized base URL (always ends with `/`).
    pub base_url: Url,
    /// Maximum pages per crawl.
    pub max_pages: usize,
    /// Maximum link depth from the seed page.
    pub max_depth: u32,
    /// Directory holding per-site snapshot files.
    pub cache_dir: PathBuf,
    /// Snapshot time-to-live.
    pub cache_ttl: Duration,
    /// Path to the video metadata file.
    pub videos_path: PathBuf,
}

impl RetrievalConfig {
    /// Build a runtime config from the app config.
    ///
    /// Fails if the configured base URL is missing or unparsable.
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        Self::for_site_with(&config.site.base_url, config)
    }

    /// Build a runtime config for an explicit site URL, taking everything
    /// else from the app config.
    pub fn for_site_with(raw_url: &str, config: &AppConfig) -> Result<Self> {
        if raw_url.is_empty() {
            return Err(DocdexError::config(
                "no site base URL configured; set [site].base_url or pass --url",
            ));
        }

        let base_url = normalize_base_url(raw_url)?;
        let name = if config.site.name.is_empty() {
            base_url.host_str().unwrap_or("documentation").to_string()
        } else {
            config.site.name.clone()
        };

        Ok(Self {
            name,
            base_url,
            max_pages: config.site.max_pages,
            max_depth: config.site.max_depth,
            cache_dir: expand_home(&config.cache.dir),
            cache_ttl: Duration::from_secs(config.cache.ttl_hours * 60 * 60),
            videos_path: expand_home(&config.videos.path),
        })
    }
}

/// Parse a base URL and make sure its path ends with `/`, so that prefix
/// scoping treats the seed page itself as in scope.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| DocdexError::config(format!("invalid base URL {raw:?}: {e}")))?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Expand a leading `~/` against the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docdex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocdexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docdex/docdex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocdexError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocdexError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocdexError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocdexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocdexError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_pages"));
        assert!(toml_str.contains("ttl_hours"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.site.max_pages, 50);
        assert_eq!(parsed.site.max_depth, 3);
        assert_eq!(parsed.cache.ttl_hours, 24);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = normalize_base_url("https://docs.example.com/guide").expect("parse");
        assert_eq!(url.as_str(), "https://docs.example.com/guide/");

        let url = normalize_base_url("https://docs.example.com/").expect("parse");
        assert_eq!(url.as_str(), "https://docs.example.com/");
    }

    #[test]
    fn retrieval_config_requires_base_url() {
        let config = AppConfig::default();
        let result = RetrievalConfig::from_app(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("base URL"));
    }

    #[test]
    fn retrieval_config_derives_name_from_host() {
        let toml_str = r#"
[site]
base_url = "https://docs.example.com/guide"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let retrieval = RetrievalConfig::from_app(&config).expect("build");
        assert_eq!(retrieval.name, "docs.example.com");
        assert_eq!(retrieval.base_url.as_str(), "https://docs.example.com/guide/");
        assert_eq!(retrieval.cache_ttl, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn explicit_name_wins_over_host() {
        let toml_str = r#"
[site]
name = "Example Docs"
base_url = "https://docs.example.com"
max_pages = 10
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let retrieval = RetrievalConfig::from_app(&config).expect("build");
        assert_eq!(retrieval.name, "Example Docs");
        assert_eq!(retrieval.max_pages, 10);
    }
}
