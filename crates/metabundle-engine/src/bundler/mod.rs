//! Metadata bundler
//!
//! Flattens the metadata of every module reachable from a root module into one document
//! that looks as if it were produced for a single module.
//!
//! A run is strictly phased:
//!
//! 1. **Export resolution** (`exports`): walks re-exports from the root and records alias
//!    edges between symbols.
//! 2. **Canonicalization** (`canonical`): picks the identity every symbol is referenced
//!    through.
//! 3. **Conversion** (`convert`): rewrites the value of each exported symbol, pulling in
//!    every private symbol it references.
//! 4. **Naming** (`names`): allocates names for the referenced private symbols and
//!    resolves the bundled handles left by conversion.

mod canonical;
mod convert;
mod exports;
mod names;
pub mod path;
mod symbols;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::BundleResult;
use crate::host::{MetadataHost, MetadataStore};
use crate::schema::{MetadataMap, ModuleMetadata};

pub use canonical::{canonicalize, declaration, root_export};
pub use convert::RESERVED_NAME_PREFIX;
pub use names::{finalize_value, private_name, PrivateNameAllocator, PRIVATE_NAME_PREFIX};
pub use symbols::{Canonical, Symbol, SymbolId, SymbolTable};

/// A private symbol hoisted into the bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMetadata {
    /// Name the symbol has in the bundle
    #[serde(rename = "privateName")]
    pub private_name: String,
    /// Name the symbol was declared with
    pub name: String,
    /// Module that declared the symbol
    pub module: String,
}

/// Result of a bundling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataBundle {
    /// The flattened module document
    pub metadata: ModuleMetadata,
    /// Hoisted private symbols, in allocation order
    pub privates: Vec<PrivateMetadata>,
}

impl MetadataBundle {
    /// Serialize the bundle's module document
    pub fn to_json(&self, pretty: bool) -> BundleResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(&self.metadata)?
        } else {
            serde_json::to_string(&self.metadata)?
        };
        Ok(json)
    }
}

/// Bundles the metadata of a root module and everything it re-exports
pub struct MetadataBundler<H> {
    root_module: String,
    import_as: String,
    store: MetadataStore<H>,
    symbols: SymbolTable,
    /// Memoized export lists per module
    exports: FxHashMap<String, Vec<SymbolId>>,
    /// Modules whose exports are being computed
    in_progress: FxHashSet<String>,
    /// Symbols exported by the root module
    exported: FxHashSet<SymbolId>,
}

impl<H: MetadataHost> MetadataBundler<H> {
    /// Create a bundler
    ///
    /// # Arguments
    /// * `root` - Path of the root module without extension (e.g. `"src/index"`)
    /// * `import_as` - Module name other code will import the bundle as
    /// * `host` - Source of per-module metadata
    pub fn new(root: &str, import_as: &str, host: H) -> Self {
        Self {
            root_module: format!("./{}", path::basename(root)),
            import_as: import_as.to_string(),
            store: MetadataStore::new(host, root),
            symbols: SymbolTable::new(),
            exports: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            exported: FxHashSet::default(),
        }
    }

    /// Relative identifier of the root module
    pub fn root_module(&self) -> &str {
        &self.root_module
    }

    /// Symbols created so far
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Run every phase and produce the bundle
    pub fn get_metadata_bundle(mut self) -> BundleResult<MetadataBundle> {
        let root = self.root_module.clone();
        let exported = self.export_all(&root);
        self.canonicalize_symbols(&exported);

        let metadata = self.get_entries(&exported)?;
        let privates = self.private_metadata();

        info!(
            root = %self.root_module,
            exports = exported.len(),
            entries = metadata.len(),
            privates = privates.len(),
            modules = self.store.len(),
            "bundled metadata"
        );

        let mut module = ModuleMetadata::new(metadata);
        module.import_as = Some(self.import_as);
        Ok(MetadataBundle {
            metadata: module,
            privates,
        })
    }

    /// Convert every exported symbol and collect the bundle's entries
    fn get_entries(&mut self, exported: &[SymbolId]) -> BundleResult<MetadataMap> {
        for &id in exported {
            self.convert_symbol(id)?;
        }

        let reserved: Vec<String> = exported
            .iter()
            .map(|&id| self.symbols.get(id).name.clone())
            .collect();
        let mut allocator = PrivateNameAllocator::new(reserved);

        // Creation order keeps private names stable across runs.
        let referenced: Vec<SymbolId> = self
            .symbols
            .iter()
            .filter(|(_, symbol)| symbol.referenced)
            .map(|(id, _)| id)
            .collect();

        for &id in &referenced {
            if self.symbols.canonical(id)?.is_private {
                let name = allocator.next_name();
                let symbol = self.symbols.get_mut(id);
                debug!(module = %symbol.module, name = %symbol.name, private_name = %name, "hoisted private symbol");
                symbol.private_name = Some(name);
            }
        }

        let mut result = MetadataMap::new();
        for id in referenced {
            let Some(value) = self.symbols.get_mut(id).value.take() else {
                continue;
            };
            let value = finalize_value(value, &self.symbols)?;
            let symbol = self.symbols.get(id);
            let name = symbol
                .private_name
                .clone()
                .unwrap_or_else(|| symbol.name.clone());
            result.insert(name, value);
        }
        Ok(result)
    }

    fn private_metadata(&self) -> Vec<PrivateMetadata> {
        // Names were allocated in creation order, so this is allocation order too.
        self.symbols
            .iter()
            .filter_map(|(_, symbol)| {
                symbol.private_name.as_ref().map(|private_name| PrivateMetadata {
                    private_name: private_name.clone(),
                    name: symbol.name.clone(),
                    module: symbol.module.clone(),
                })
            })
            .collect()
    }
}
