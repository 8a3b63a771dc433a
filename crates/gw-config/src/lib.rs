//! Configuration management for gemwiki.
//!
//! Parses `gw.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.title`
//! - `links.site_root`
//! - `links.media_root`
//!
//! ## Example
//!
//! ```toml
//! [content]
//! root = "data"
//! blacklist = ["sidebar.txt", "_template.txt"]
//!
//! [links]
//! site_root = "gemini://${WIKI_HOST:-localhost}/"
//! media_root = "/media/"
//!
//! [site]
//! title = "My Wiki"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override wiki data directory.
    pub root: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "gw.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content configuration (paths are relative strings from TOML).
    content: ContentConfigRaw,
    /// Link prefixes.
    pub links: LinksConfig,
    /// Site presentation.
    pub site: SiteSection,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw content configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    root: Option<String>,
    blacklist: Option<Vec<String>>,
}

/// Resolved content configuration.
#[derive(Debug, Default)]
pub struct ContentConfig {
    /// Wiki data directory holding `pages/` and `media/`.
    pub root: PathBuf,
    /// File names excluded from the index.
    ///
    /// `None` keeps the indexer's built-in list.
    pub blacklist: Option<Vec<String>>,
}

/// Link prefixes used in generated link lines.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Prefix for page and section links.
    pub site_root: String,
    /// Prefix for media links.
    pub media_root: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            site_root: "/".to_owned(),
            media_root: "/media/".to_owned(),
        }
    }
}

/// Site presentation settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    /// Heading of the root section when it has no `start` page.
    pub title: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Wiki".to_owned(),
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
        /// Config field path (e.g., "`links.site_root`").
        field: String,
        /// Error message (e.g., "${`WIKI_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a link prefix to end with `/`.
fn require_trailing_slash(value: &str, field: &str) -> Result<(), ConfigError> {
    if !value.ends_with('/') {
        return Err(ConfigError::Validation(format!("{field} must end with /")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `gw.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// an environment variable is missing or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(root) = &settings.root {
            self.content_resolved.root.clone_from(root);
        }
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

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            content: ContentConfigRaw::default(),
            links: LinksConfig::default(),
            site: SiteSection::default(),
            content_resolved: ContentConfig {
                root: base.join("data"),
                blacklist: None,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.links.site_root, "links.site_root")?;
        require_trailing_slash(&self.links.site_root, "links.site_root")?;
        require_non_empty(&self.links.media_root, "links.media_root")?;
        require_trailing_slash(&self.links.media_root, "links.media_root")?;
        require_non_empty(&self.site.title, "site.title")?;

        if let Some(blacklist) = &self.content_resolved.blacklist
            && let Some(bad) = blacklist.iter().find(|name| name.contains(['/', '\\']))
        {
            return Err(ConfigError::Validation(format!(
                "content.blacklist entries are file names, got '{bad}'"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("site.title", &mut self.site.title),
            ("links.site_root", &mut self.links.site_root),
            ("links.media_root", &mut self.links.media_root),
        ] {
            expand_field(field, value)?;
        }
        Ok(())
    }

    /// Resolve the content root against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.content_resolved = ContentConfig {
            root: config_dir.join(self.content.root.as_deref().unwrap_or("data")),
            blacklist: self.content.blacklist.clone(),
        };
    }
}

/// Rewrite `value` in place with its `${...}` references resolved.
///
/// Only braced references are touched, so a bare `$` in a URL survives.
fn expand_field(field: &str, value: &mut String) -> Result<(), ConfigError> {
    if !value.contains("${") {
        return Ok(());
    }

    let expanded = shellexpand::env_with_context(value.as_str(), |name| {
        std::env::var(name).map(Some)
    })
    .map_err(|err| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", err.var_name),
    })?;
    *value = expanded.into_owned();
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/srv/wiki"));

        assert_eq!(config.content_resolved.root, PathBuf::from("/srv/wiki/data"));
        assert_eq!(config.content_resolved.blacklist, None);
        assert_eq!(config.links.site_root, "/");
        assert_eq!(config.links.media_root, "/media/");
        assert_eq!(config.site.title, "Wiki");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.links.site_root, "/");
        assert_eq!(config.site.title, "Wiki");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[content]
root = "wiki-data"
blacklist = ["sidebar.txt"]

[links]
site_root = "gemini://wiki.example/"
media_root = "gemini://wiki.example/files/"

[site]
title = "Example Wiki"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/srv"));

        assert_eq!(config.content_resolved.root, PathBuf::from("/srv/wiki-data"));
        assert_eq!(
            config.content_resolved.blacklist,
            Some(vec!["sidebar.txt".to_owned()])
        );
        assert_eq!(config.links.site_root, "gemini://wiki.example/");
        assert_eq!(config.links.media_root, "gemini://wiki.example/files/");
        assert_eq!(config.site.title, "Example Wiki");
    }

    #[test]
    fn test_absolute_root_kept() {
        let toml = r#"
[content]
root = "/var/lib/dokuwiki/data"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/etc/gw"));

        assert_eq!(
            config.content_resolved.root,
            PathBuf::from("/var/lib/dokuwiki/data")
        );
    }

    #[test]
    fn test_validate_link_roots() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        config.links.site_root = "gemini://wiki.example".to_owned();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("links.site_root"));

        config.links.site_root = "/".to_owned();
        config.links.media_root = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("links.media_root cannot be empty"));
    }

    #[test]
    fn test_validate_blacklist_names() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        config.content_resolved.blacklist = Some(vec!["wiki/secret.txt".to_owned()]);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("wiki/secret.txt"));
    }

    #[test]
    fn test_apply_cli_settings_root() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        let overrides = CliSettings {
            root: Some(PathBuf::from("/tmp/data")),
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.content_resolved.root, PathBuf::from("/tmp/data"));
        assert_eq!(config.site.title, "Wiki");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[content]\nroot = \"data\"\n\n[site]\ntitle = \"${GW_TEST_LOAD_TITLE:-Loaded}\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.content_resolved.root, dir.path().join("data"));
        assert_eq!(config.site.title, "Loaded");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[links\nsite_root = ").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_applies_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[content]\nroot = \"data\"\n").unwrap();
        let settings = CliSettings {
            root: Some(PathBuf::from("/override")),
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.content_resolved.root, PathBuf::from("/override"));
    }

    #[test]
    fn test_expand_field_set_and_default() {
        // SAFETY: variable names are unique to this test
        unsafe {
            std::env::set_var("GW_TEST_CAPSULE_HOST", "wiki.example");
            std::env::remove_var("GW_TEST_UNSET_TITLE");
        }

        let mut root = "gemini://${GW_TEST_CAPSULE_HOST}/".to_owned();
        expand_field("links.site_root", &mut root).unwrap();
        assert_eq!(root, "gemini://wiki.example/");

        let mut title = "${GW_TEST_UNSET_TITLE:-My Wiki}".to_owned();
        expand_field("site.title", &mut title).unwrap();
        assert_eq!(title, "My Wiki");

        unsafe {
            std::env::remove_var("GW_TEST_CAPSULE_HOST");
        }
    }

    #[test]
    fn test_expand_field_unset_names_field() {
        // SAFETY: variable names are unique to this test
        unsafe {
            std::env::remove_var("GW_TEST_MISSING_ROOT");
        }

        let mut media = "${GW_TEST_MISSING_ROOT}".to_owned();
        let err = expand_field("links.media_root", &mut media).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Environment variable error in links.media_root: ${GW_TEST_MISSING_ROOT} not set"
        );
        assert_eq!(media, "${GW_TEST_MISSING_ROOT}");
    }

    #[test]
    fn test_expand_field_leaves_literals() {
        let mut price = "/cost$5/".to_owned();
        expand_field("links.site_root", &mut price).unwrap();
        assert_eq!(price, "/cost$5/");
    }

    #[test]
    fn test_load_expands_title() {
        // SAFETY: variable names are unique to this test
        unsafe {
            std::env::set_var("GW_TEST_LOADED_TITLE", "Expanded Wiki");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[site]\ntitle = \"${GW_TEST_LOADED_TITLE}\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.site.title, "Expanded Wiki");
        unsafe {
            std::env::remove_var("GW_TEST_LOADED_TITLE");
        }
    }
}
