//! Flat-module index options (bundle.toml)
//!
//! Entry point used by build tooling: validates the root files, bundles the single root
//! module and names the generated index and metadata files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bundler::path::{basename, dirname, normalize};
use crate::bundler::{MetadataBundle, MetadataBundler, PrivateMetadata};
use crate::error::{ConfigError, IndexError};
use crate::host::{MetadataHost, METADATA_FILE_SUFFIX};

/// Message reported when the root files do not name exactly one module
pub const ONE_ROOT_FILE_REQUIRED: &str =
    "flat module index requires one and only one .ts file in the \"files\" field";

const INDEX_HEADER: &str = "/**\n * Generated bundle index. Do not edit.\n */\n";

/// Options controlling the generated flat-module index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FlatModuleOptions {
    /// File name of the generated index, relative to the root module's directory
    pub flat_module_out_file: String,
    /// Module name the bundle is imported as
    pub flat_module_id: String,
}

/// Bundle configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleConfig {
    /// `[bundle]` table
    pub bundle: BundleSection,
}

/// The `[bundle]` table of a configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BundleSection {
    /// Root files of the compilation
    #[serde(default)]
    pub files: Vec<String>,

    /// Index options
    #[serde(flatten)]
    pub options: FlatModuleOptions,
}

impl BundleConfig {
    /// Load a configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse a configuration from a string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: BundleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bundle.options.flat_module_id.is_empty() {
            return Err(ConfigError::Validation(
                "flat-module-id cannot be empty".to_string(),
            ));
        }
        if self.bundle.options.flat_module_out_file.is_empty() {
            return Err(ConfigError::Validation(
                "flat-module-out-file cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A problem with the index options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Description of the problem
    pub message: String,
    /// File the problem is attached to, if any
    pub file: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic not attached to a file
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}", file, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A generated flat-module index
#[derive(Debug, Clone, PartialEq)]
pub struct BundleIndex {
    /// Path of the generated index source
    pub index_name: String,
    /// Path of the generated bundle metadata
    pub metadata_name: String,
    /// Root module relative to the index
    pub library_index: String,
    /// Source of the generated index
    pub index_source: String,
    /// The bundle itself
    pub bundle: MetadataBundle,
}

/// Bundle the single root module of a compilation into a flat-module index
///
/// # Arguments
/// * `options` - Output file and import name
/// * `root_files` - Root files of the compilation; declaration files are ignored
/// * `host` - Source of per-module metadata
pub fn create_bundle_index<H: MetadataHost>(
    options: &FlatModuleOptions,
    root_files: &[String],
    host: H,
) -> Result<BundleIndex, IndexError> {
    let files: Vec<&String> = root_files
        .iter()
        .filter(|file| !file.ends_with(".d.ts"))
        .collect();
    let [file] = files.as_slice() else {
        return Err(IndexError::Config(vec![Diagnostic::new(
            ONE_ROOT_FILE_REQUIRED,
        )]));
    };

    let index_module = file.strip_suffix(".ts").unwrap_or(file.as_str());
    debug!(root = index_module, import_as = %options.flat_module_id, "creating bundle index");

    let bundle = MetadataBundler::new(index_module, &options.flat_module_id, host)
        .get_metadata_bundle()?;

    let index_name = join(dirname(index_module), &ts_file_name(&options.flat_module_out_file));
    let metadata_name = format!(
        "{}{}",
        index_name.strip_suffix(".ts").unwrap_or(&index_name),
        METADATA_FILE_SUFFIX
    );
    let library_index = format!("./{}", basename(index_module));
    let index_source = private_entries_to_index(&library_index, &bundle.privates);

    Ok(BundleIndex {
        index_name,
        metadata_name,
        library_index,
        index_source,
        bundle,
    })
}

/// Source of an index that re-exports the library and its hoisted private symbols
///
/// Private symbols are grouped by module; modules and names are sorted.
pub fn private_entries_to_index(library_index: &str, privates: &[PrivateMetadata]) -> String {
    let mut lines = vec![
        INDEX_HEADER.to_string(),
        format!("export * from '{}';", library_index),
        String::new(),
    ];

    let mut by_module: BTreeMap<&str, Vec<&PrivateMetadata>> = BTreeMap::new();
    for entry in privates {
        by_module.entry(&entry.module).or_default().push(entry);
    }
    for (module, mut entries) in by_module {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let symbols: Vec<String> = entries
            .iter()
            .map(|entry| format!("{} as {}", entry.name, entry.private_name))
            .collect();
        lines.push(format!("export {{{}}} from '{}';", symbols.join(","), module));
    }
    lines.join("\n")
}

/// Output file name with its `.js` extension (or none) replaced by `.ts`
fn ts_file_name(out_file: &str) -> String {
    format!("{}.ts", out_file.strip_suffix(".js").unwrap_or(out_file))
}

fn join(dir: &str, file: &str) -> String {
    let joined = normalize(&format!("{}/{}", dir, file));
    match joined.strip_prefix("./") {
        Some(relative) => relative.to_string(),
        None => joined,
    }
}
