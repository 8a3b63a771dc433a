//! `gw convert` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use gw_markup::{Converter, get_links};

use super::{GlobalArgs, link_config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Wiki markup file, or `-` to read stdin.
    file: PathBuf,

    /// Print the absolute URLs found in the output after the document.
    #[arg(long)]
    links: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// Conversion warnings are reported on stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the input can't be read.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;

        let raw = if self.file == Path::new("-") {
            std::io::read_to_string(std::io::stdin())?
        } else {
            std::fs::read_to_string(&self.file)?
        };

        let converter = Converter::dokuwiki(&link_config(&config));
        let Some(conversion) = converter.convert(&raw) else {
            output.warning("Input is empty, nothing to convert");
            return Ok(());
        };

        for warning in &conversion.warnings {
            output.warning(&format!("Warning: {warning}"));
        }
        output.document(&conversion.text);

        if self.links {
            for url in get_links(&conversion.text) {
                output.document(&format!("=> {url}"));
            }
        }

        Ok(())
    }
}
