//! `gw tree` command implementation.

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use gw_index::{FsStorage, PathIndex};

use super::{GlobalArgs, blacklist};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    /// Print the indexed nodes as JSON.
    #[arg(long)]
    json: bool,
}

impl TreeArgs {
    /// Execute the tree command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or JSON serialization fails.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;

        let index = PathIndex::build(
            Arc::new(FsStorage::new()),
            &config.content_resolved.root,
            &blacklist(&config),
        );

        if self.json {
            output.document(&serde_json::to_string_pretty(index.nodes())?);
            return Ok(());
        }

        let resolver = index.resolver();
        for (dir, files) in index.tree() {
            let depth = relative(&index, dir).components().count();
            output.document(&format!("{}{}/", "  ".repeat(depth), name(&index, dir)));

            for file in files {
                let indent = "  ".repeat(depth + 1);
                match resolver.path_to_page_uri(file) {
                    Some(uri) => output.document(&format!("{indent}{} ({uri})", name(&index, file))),
                    None => output.document(&format!("{indent}{}", name(&index, file))),
                }
            }
        }

        output.info(&format!(
            "{} nodes indexed under {}",
            index.len(),
            index.root().display()
        ));
        Ok(())
    }
}

fn relative<'a>(index: &PathIndex, path: &'a Path) -> &'a Path {
    path.strip_prefix(index.root()).unwrap_or(path)
}

fn name(index: &PathIndex, path: &Path) -> String {
    match relative(index, path).file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => ".".to_owned(),
    }
}
