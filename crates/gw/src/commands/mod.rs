//! CLI command implementations.

pub(crate) mod convert;
pub(crate) mod render;
pub(crate) mod tree;

use std::path::PathBuf;

use clap::Args;
use gw_config::{CliSettings, Config};
use gw_index::Blacklist;
use gw_markup::LinkConfig;
use gw_site::SiteConfig;

use crate::error::CliError;

pub(crate) use convert::ConvertArgs;
pub(crate) use render::RenderArgs;
pub(crate) use tree::TreeArgs;

/// Flags shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover gw.toml).
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Wiki data directory holding `pages/` and `media/` (overrides config).
    #[arg(short, long, global = true, env = "GW_ROOT")]
    pub(crate) root: Option<PathBuf>,

    /// Enable verbose output (index and conversion logs).
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
}

impl GlobalArgs {
    /// Load configuration with CLI overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            root: self.root.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Link prefixes from the loaded configuration.
pub(crate) fn link_config(config: &Config) -> LinkConfig {
    LinkConfig {
        site_root: config.links.site_root.clone(),
        media_root: config.links.media_root.clone(),
    }
}

/// Index exclusions from the loaded configuration.
pub(crate) fn blacklist(config: &Config) -> Blacklist {
    config
        .content_resolved
        .blacklist
        .clone()
        .map_or_else(Blacklist::default, Blacklist::new)
}

/// Site settings from the loaded configuration.
pub(crate) fn site_config(config: &Config) -> SiteConfig {
    SiteConfig {
        root: config.content_resolved.root.clone(),
        blacklist: blacklist(config),
        links: link_config(config),
        title: config.site.title.clone(),
    }
}
