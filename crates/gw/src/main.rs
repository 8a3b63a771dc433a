//! gw CLI - `DokuWiki` content served as Gemtext.
//!
//! Provides commands for:
//! - `render`: Answer a request URI the way the site would
//! - `convert`: Convert a single markup file
//! - `tree`: Show the content index

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConvertArgs, GlobalArgs, RenderArgs, TreeArgs};
use output::Output;

/// gw - `DokuWiki` content served as Gemtext.
#[derive(Parser)]
#[command(name = "gw", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a page, section or media URI.
    Render(RenderArgs),
    /// Convert a markup file to Gemtext.
    Convert(ConvertArgs),
    /// Show the indexed content tree.
    Tree(TreeArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(&cli.global),
        Commands::Convert(args) => args.execute(&cli.global),
        Commands::Tree(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gw", "render", "wiki:syntax", "--root", "/srv/data", "-v"])
            .unwrap();

        assert_eq!(cli.global.root, Some(PathBuf::from("/srv/data")));
        assert!(cli.global.verbose);
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn test_render_defaults_to_root() {
        let cli = Cli::try_parse_from(["gw", "render"]).unwrap();

        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn test_tree_json_flag() {
        let cli = Cli::try_parse_from(["gw", "--config", "gw.toml", "tree", "--json"]).unwrap();

        assert_eq!(cli.global.config, Some(PathBuf::from("gw.toml")));
        assert!(matches!(cli.command, Commands::Tree(_)));
    }
}
