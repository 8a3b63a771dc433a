//! `gw render` command implementation.

use std::sync::Arc;

use clap::Args;
use gw_index::FsStorage;
use gw_site::{Response, Site};

use super::{GlobalArgs, site_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Request URI: a page (`wiki:syntax`), a section (`wiki`, or empty for
    /// the root) or a media file (`media/wiki:logo.png`).
    #[arg(default_value = "")]
    uri: String,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// Documents go to stdout. For media the resolved file path is printed.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or nothing is indexed under
    /// the URI.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;

        let site = Site::new(Arc::new(FsStorage::new()), site_config(&config));
        tracing::info!(uri = %self.uri, nodes = site.index().len(), "Rendering");

        match site.respond(&self.uri) {
            Response::Document(body) => output.document(&body),
            Response::Media(path) => output.document(&path.display().to_string()),
            Response::NoContent => output.warning(&format!("'{}' has no content", self.uri)),
            Response::NotFound => return Err(CliError::NotFound(self.uri)),
        }

        Ok(())
    }
}
