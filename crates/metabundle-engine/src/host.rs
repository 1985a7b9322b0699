//! Metadata hosts
//!
//! A [`MetadataHost`] produces the metadata document of a single module. The bundler only
//! ever asks for modules inside the bundle and memoizes every answer (including "no
//! metadata") in a [`MetadataStore`] owned by the bundling run.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::bundler::path::{is_relative, resolve_module};
use crate::schema::ModuleMetadata;

/// File suffix of serialized metadata documents
pub const METADATA_FILE_SUFFIX: &str = ".metadata.json";

/// Source of per-module metadata
///
/// Implementations must be deterministic and side-effect free for a given module within
/// one bundling run.
pub trait MetadataHost {
    /// Metadata of `module`, or `None` when the module has none
    fn metadata_for(&self, module: &str) -> Option<ModuleMetadata>;
}

impl<H: MetadataHost + ?Sized> MetadataHost for &H {
    fn metadata_for(&self, module: &str) -> Option<ModuleMetadata> {
        (**self).metadata_for(module)
    }
}

/// In-memory host keyed by module identifier
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    modules: FxHashMap<String, ModuleMetadata>,
}

impl MemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the metadata of a module
    pub fn insert(&mut self, module: impl Into<String>, metadata: ModuleMetadata) {
        self.modules.insert(module.into(), metadata);
    }

    /// Builder form of [`MemoryHost::insert`]
    pub fn with_module(mut self, module: impl Into<String>, metadata: ModuleMetadata) -> Self {
        self.insert(module, metadata);
        self
    }

    /// Number of modules known to the host
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the host knows no modules
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl MetadataHost for MemoryHost {
    fn metadata_for(&self, module: &str) -> Option<ModuleMetadata> {
        self.modules.get(module).cloned()
    }
}

/// Host reading `<module>.metadata.json` files from disk
///
/// Module identifiers are interpreted relative to `base_dir` (rooted identifiers are used
/// as-is). Missing files mean "no metadata"; unreadable or malformed files are logged and
/// treated the same way.
#[derive(Debug, Clone)]
pub struct DirectoryHost {
    base_dir: PathBuf,
}

impl DirectoryHost {
    /// Create a host rooted at `base_dir`
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the metadata file for a module
    pub fn metadata_path(&self, module: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}{}", module, METADATA_FILE_SUFFIX))
    }

    /// Base directory of the host
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl MetadataHost for DirectoryHost {
    fn metadata_for(&self, module: &str) -> Option<ModuleMetadata> {
        let path = self.metadata_path(module);
        if !path.is_file() {
            trace!(module, path = %path.display(), "no metadata file");
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read metadata");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid metadata document");
                None
            }
        }
    }
}

/// Memoized metadata lookup for one bundling run
///
/// Relative module identifiers are resolved against the root module before the host is
/// asked; bare identifiers are outside the bundle and never have metadata.
pub struct MetadataStore<H> {
    host: H,
    root: String,
    cache: FxHashMap<String, Option<Rc<ModuleMetadata>>>,
}

impl<H: MetadataHost> MetadataStore<H> {
    /// Create a store for a bundle rooted at `root`
    pub fn new(host: H, root: impl Into<String>) -> Self {
        Self {
            host,
            root: root.into(),
            cache: FxHashMap::default(),
        }
    }

    /// Metadata of a bundle module
    pub fn get(&mut self, module: &str) -> Option<Rc<ModuleMetadata>> {
        if let Some(cached) = self.cache.get(module) {
            return cached.clone();
        }

        let metadata = if is_relative(module) {
            let full_name = resolve_module(module, &self.root);
            self.host.metadata_for(&full_name).map(Rc::new)
        } else {
            None
        };
        self.cache.insert(module.to_string(), metadata.clone());
        metadata
    }

    /// Number of modules looked up so far
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether nothing has been looked up yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
