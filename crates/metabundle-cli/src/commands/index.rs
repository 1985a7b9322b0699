//! `metabundle index` — generate a flat-module index from a bundle.toml.

use anyhow::Context;
use metabundle_engine::{create_bundle_index, BundleConfig, DirectoryHost, IndexError};
use std::path::Path;

pub fn execute(config_path: &Path, pretty: bool) -> anyhow::Result<()> {
    let config = BundleConfig::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    // Paths in the config are relative to the config file.
    let base = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    let host = DirectoryHost::new(&base);

    let index = match create_bundle_index(&config.bundle.options, &config.bundle.files, &host) {
        Ok(index) => index,
        Err(IndexError::Config(diagnostics)) => {
            for diagnostic in &diagnostics {
                eprintln!("error: {}", diagnostic);
            }
            anyhow::bail!("Invalid configuration in {}", config_path.display());
        }
        Err(e) => return Err(e).context("Failed to create bundle index"),
    };

    let metadata_path = base.join(&index.metadata_name);
    let index_path = base.join(&index.index_name);
    if let Some(dir) = metadata_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    std::fs::write(&metadata_path, index.bundle.to_json(pretty)?)
        .with_context(|| format!("Failed to write {}", metadata_path.display()))?;
    std::fs::write(&index_path, &index.index_source)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;

    println!("Wrote {}", index.index_name);
    println!("Wrote {}", index.metadata_name);
    super::print_privates(&index.bundle.privates);
    Ok(())
}
