//! Application configuration for arcdex.
//!
//! Config is resolved from an explicit `--config` path, then `./arcdex.toml`,
//! then `~/.arcdex/arcdex.toml`, then built-in defaults.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ArcdexError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "arcdex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".arcdex";

/// Root of the wiki every relative link is resolved against.
pub const DEFAULT_WIKI_BASE: &str = "https://arcraiders.wiki";

/// Directory of downloaded images, relative to the output directory. The
/// page and the cache refer to images as `images/<file>`.
pub const IMAGES_SUBDIR: &str = "images";

// ---------------------------------------------------------------------------
// Config structs (matching arcdex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Wiki location and listing pages.
    #[serde(default)]
    pub wiki: WikiConfig,

    /// Output locations and rendering options.
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// `[wiki]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Wiki origin used to resolve relative hrefs and image sources.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Listing pages to scrape, in display order.
    #[serde(default = "default_categories")]
    pub categories: Vec<CategorySource>,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            categories: default_categories(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_WIKI_BASE.into()
}

fn default_categories() -> Vec<CategorySource> {
    vec![
        CategorySource::new("Grenades", "https://arcraiders.wiki/wiki/Grenades"),
        CategorySource::new("Trinkets", "https://arcraiders.wiki/wiki/Category:Trinket"),
        CategorySource::new("Loot", "https://arcraiders.wiki/wiki/Loot"),
    ]
}

/// `[[wiki.categories]]` entry: one listing page and the category it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySource {
    /// Display category items from this page default to.
    pub name: String,
    /// Listing page URL (a `Category:` page or a page with item tables).
    pub url: String,
}

impl CategorySource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// What to do with each item's image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Save the image next to the HTML under `images/`.
    #[default]
    Download,
    /// Inline the image bytes as base64 into the cache and page.
    Embed,
    /// Reference the wiki-hosted image URL only.
    Link,
}

impl std::fmt::Display for ImageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Download => "download",
            Self::Embed => "embed",
            Self::Link => "link",
        };
        f.write_str(s)
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory for the cache, page and images.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// JSON cache file name inside `dir`.
    #[serde(default = "default_json_file")]
    pub json_file: String,

    /// HTML page file name inside `dir`.
    #[serde(default = "default_html_file")]
    pub html_file: String,

    /// Image handling mode.
    #[serde(default)]
    pub images: ImageMode,

    /// Page title and heading.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            json_file: default_json_file(),
            html_file: default_html_file(),
            images: ImageMode::default(),
            title: default_title(),
        }
    }
}

impl OutputConfig {
    pub fn json_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.json_file)
    }

    pub fn html_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.html_file)
    }

    pub fn images_dir(&self) -> PathBuf {
        Path::new(&self.dir).join(IMAGES_SUBDIR)
    }
}

fn default_output_dir() -> String {
    "output".into()
}
fn default_json_file() -> String {
    "items_data.json".into()
}
fn default_html_file() -> String {
    "items.html".into()
}
fn default_title() -> String {
    "Arc Raiders - Item Catalog".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Pause before every request, in milliseconds.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            rate_limit_ms: default_rate_limit(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_rate_limit() -> u64 {
    100
}

impl AppConfig {
    /// Check that the configured URLs parse and there is something to scrape.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.wiki.base_url).map_err(|e| {
            ArcdexError::config(format!("invalid wiki.base_url '{}': {e}", self.wiki.base_url))
        })?;

        if self.wiki.categories.is_empty() {
            return Err(ArcdexError::config("no wiki.categories configured"));
        }

        for cat in &self.wiki.categories {
            if cat.name.trim().is_empty() {
                return Err(ArcdexError::config(format!(
                    "category for {} has an empty name",
                    cat.url
                )));
            }
            Url::parse(&cat.url).map_err(|e| {
                ArcdexError::config(format!("invalid URL for category '{}': {e}", cat.name))
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.arcdex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ArcdexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.arcdex/arcdex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve and load the config.
///
/// An explicit path must exist. Without one, `./arcdex.toml` wins over the
/// user config; if neither exists the defaults are used.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let config = match explicit {
        Some(path) => load_config_from(path)?,
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                load_config_from(&local)?
            } else {
                match config_file_path() {
                    Ok(path) if path.exists() => load_config_from(&path)?,
                    _ => {
                        tracing::debug!("config file not found, using defaults");
                        AppConfig::default()
                    }
                }
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ArcdexError::io(path, e))?;

    tracing::debug!(path = %path.display(), "loading config");
    toml::from_str(&content)
        .map_err(|e| ArcdexError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `target` (or the user config path).
/// Refuses to overwrite an existing file. Returns the path written.
pub fn init_config(target: Option<&Path>) -> Result<PathBuf> {
    let path = match target {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    if path.exists() {
        return Err(ArcdexError::config(format!(
            "config file already exists at {}",
            path.display()
        )));
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ArcdexError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ArcdexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ArcdexError::io(&path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("Category:Trinket"));
        assert!(toml_str.contains("images = \"download\""));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.wiki.categories.len(), 3);
        assert_eq!(parsed.wiki.categories[1].name, "Trinkets");
        assert_eq!(parsed.http.timeout_secs, 30);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[output]
dir = "/tmp/catalog"
images = "embed"

[[wiki.categories]]
name = "Weapons"
url = "https://arcraiders.wiki/wiki/Weapons"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.wiki.categories.len(), 1);
        assert_eq!(config.wiki.categories[0].name, "Weapons");
        assert_eq!(config.wiki.base_url, DEFAULT_WIKI_BASE);
        assert_eq!(config.output.images, ImageMode::Embed);
        assert_eq!(config.output.json_file, "items_data.json");
        assert_eq!(
            config.output.json_path(),
            PathBuf::from("/tmp/catalog/items_data.json")
        );
        assert_eq!(config.output.images_dir(), PathBuf::from("/tmp/catalog/images"));
    }

    #[test]
    fn image_paths_resolve_under_images_dir() {
        let output = OutputConfig {
            dir: "site".into(),
            ..OutputConfig::default()
        };
        // A cached `image_path` is relative to the output directory
        let image_path = format!("{IMAGES_SUBDIR}/Loot_Battery.png");
        assert_eq!(
            Path::new(&output.dir).join(&image_path),
            output.images_dir().join("Loot_Battery.png")
        );
        assert_eq!(output.images_dir(), PathBuf::from("site").join(IMAGES_SUBDIR));
    }

    #[test]
    fn validate_rejects_empty_categories() {
        let mut config = AppConfig::default();
        config.wiki.categories.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no wiki.categories"));
    }

    #[test]
    fn validate_rejects_bad_category_url() {
        let mut config = AppConfig::default();
        config.wiki.categories.push(CategorySource::new("Broken", "not a url"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let missing = std::env::temp_dir().join("arcdex-definitely-missing/arcdex.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn image_mode_display_matches_serde() {
        for mode in [ImageMode::Download, ImageMode::Embed, ImageMode::Link] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
        }
    }
}
