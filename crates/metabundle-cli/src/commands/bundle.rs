//! `metabundle bundle` — bundle a root module read from a directory of metadata files.

use anyhow::Context;
use metabundle_engine::{DirectoryHost, MetadataBundler};
use std::path::PathBuf;
use tracing::info;

pub struct BundleArgs {
    pub root: String,
    pub import_as: String,
    pub out: Option<PathBuf>,
    pub base: PathBuf,
    pub pretty: bool,
}

pub fn execute(args: BundleArgs) -> anyhow::Result<()> {
    if !args.base.is_dir() {
        anyhow::bail!("Base directory not found: {}", args.base.display());
    }

    let root = root_module(&args.root);
    let host = DirectoryHost::new(&args.base);
    let bundle = MetadataBundler::new(root, &args.import_as, &host)
        .get_metadata_bundle()
        .with_context(|| format!("Failed to bundle {}", args.root))?;
    let json = bundle.to_json(args.pretty)?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote bundle");
        }
        None => println!("{}", json),
    }

    super::print_privates(&bundle.privates);
    Ok(())
}

/// Root module identifier from a path that may still carry a source or metadata extension
fn root_module(root: &str) -> &str {
    [".metadata.json", ".d.ts", ".ts"]
        .iter()
        .find_map(|suffix| root.strip_suffix(suffix))
        .unwrap_or(root)
}
