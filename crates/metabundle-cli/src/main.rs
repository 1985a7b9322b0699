//! Metabundle CLI
//!
//! Flattens the `.metadata.json` files of a library into one bundle:
//! `metabundle bundle` for ad-hoc runs, `metabundle index` driven by a `bundle.toml`.

mod commands;
mod logging;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "metabundle")]
#[command(about = "Flat metadata bundler", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle a root module and everything it re-exports
    Bundle {
        /// Root module, relative to the base directory (e.g. "src/public_api")
        root: String,
        /// Module name the bundle is imported as
        #[arg(long)]
        import_as: String,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Directory the metadata files are read from
        #[arg(short, long, default_value = ".")]
        base: PathBuf,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Generate a flat-module index from a bundle.toml
    Index {
        /// Configuration file
        #[arg(short, long, default_value = "bundle.toml")]
        config: PathBuf,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Bundle {
            root,
            import_as,
            out,
            base,
            pretty,
        } => commands::bundle::execute(commands::bundle::BundleArgs {
            root,
            import_as,
            out,
            base,
            pretty,
        }),

        Commands::Index { config, pretty } => commands::index::execute(&config, pretty),
    }
}
