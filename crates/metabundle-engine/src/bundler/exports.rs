//! Export graph resolution
//!
//! Computes, per module, the ordered list of symbols the module exports: its own entries,
//! entries that merely re-export an imported name, and `export ... from` declarations.
//! Every re-export records an alias edge in the symbol table.

use tracing::{debug, warn};

use super::path::resolve_module;
use super::symbols::SymbolId;
use super::MetadataBundler;
use crate::host::MetadataHost;
use crate::schema::Reference;

impl<H: MetadataHost> MetadataBundler<H> {
    /// Exported symbols of `module`
    ///
    /// Results are memoized per module. A module that is re-entered while its own exports
    /// are still being computed (a re-export cycle) contributes nothing to the inner visit.
    pub fn export_all(&mut self, module: &str) -> Vec<SymbolId> {
        if let Some(result) = self.exports.get(module) {
            return result.clone();
        }

        if !self.in_progress.insert(module.to_string()) {
            warn!(module, "re-export cycle detected; skipping nested visit");
            return Vec::new();
        }

        let metadata = self.store.get(module);
        let mut result = Vec::new();

        if let Some(metadata) = metadata {
            for (key, value) in &metadata.metadata {
                match value.as_reference() {
                    Some(Reference::Imported {
                        module: from, name, ..
                    }) => {
                        // The entry only re-exports an imported name.
                        let export_from = resolve_module(from, module);
                        self.export_all(&export_from);
                        let symbol = self.symbols.symbol_of(&export_from, name);
                        self.export_symbol(module, &mut result, symbol, key);
                    }
                    _ => {
                        let symbol = self.symbols.symbol_of(module, key);
                        if !result.contains(&symbol) {
                            result.push(symbol);
                        }
                    }
                }
            }

            for declaration in metadata.export_declarations() {
                let export_from = resolve_module(&declaration.from, module);
                // Resolved even when nothing is used from it; canonicalization needs every
                // module touched.
                let reexported = self.export_all(&export_from);

                match &declaration.export {
                    Some(items) => {
                        for item in items {
                            let symbol = self.symbols.symbol_of(&export_from, item.name());
                            self.export_symbol(module, &mut result, symbol, item.exported_as());
                        }
                    }
                    None => {
                        for symbol in reexported {
                            let name = self.symbols.get(symbol).name.clone();
                            self.export_symbol(module, &mut result, symbol, &name);
                        }
                    }
                }
            }
        }

        self.in_progress.remove(module);
        debug!(module, exports = result.len(), "resolved module exports");
        self.exports.insert(module.to_string(), result.clone());
        result
    }

    /// Register `exported` as exported from `module` under `export_as`
    fn export_symbol(
        &mut self,
        module: &str,
        result: &mut Vec<SymbolId>,
        exported: SymbolId,
        export_as: &str,
    ) {
        let alias = self.symbols.symbol_of(module, export_as);
        if result.contains(&alias) {
            debug!(module, name = export_as, "name already exported; keeping first export");
            return;
        }
        result.push(alias);
        self.symbols.link_alias(exported, alias);
    }
}
