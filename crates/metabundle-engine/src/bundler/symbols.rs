//! Symbol table
//!
//! Arena of every `(module, name)` identity seen during one bundling run. Symbols are
//! addressed by [`SymbolId`]; alias edges between them are plain ids, so chains and cycles
//! are walked without any shared ownership.

use rustc_hash::FxHashMap;

use crate::error::{BundleError, BundleResult};
use crate::schema::MetadataValue;

/// Index of a symbol in the [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the symbol in creation order
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Result of canonicalizing a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonical {
    /// Not reachable through the root module's exports
    pub is_private: bool,
    /// Symbol owning the actual declaration
    pub declaration: SymbolId,
    /// Identity used when referencing the symbol from the bundle
    pub symbol: SymbolId,
}

/// A named symbol of a module
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Module identifier
    pub module: String,
    /// Name within the module
    pub name: String,
    /// Symbols re-exporting this one, in link order
    pub aliases: Vec<SymbolId>,
    /// Symbol this alias re-exports
    pub exports: Option<SymbolId>,
    /// Filled in by canonicalization
    pub canonical: Option<Canonical>,
    /// Value has been (or is being) converted
    pub referenced: bool,
    /// Synthesized name of a referenced private symbol
    pub private_name: Option<String>,
    /// Converted value, pending name finalization
    pub value: Option<MetadataValue>,
}

impl Symbol {
    fn new(module: &str, name: &str) -> Self {
        Self {
            module: module.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            exports: None,
            canonical: None,
            referenced: false,
            private_name: None,
            value: None,
        }
    }
}

/// Registry of every symbol of a bundling run
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: FxHashMap<(String, String), SymbolId>,
}

impl SymbolTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the symbol for `(module, name)`
    pub fn symbol_of(&mut self, module: &str, name: &str) -> SymbolId {
        let key = (module.to_string(), name.to_string());
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = SymbolId::new(self.symbols.len());
        self.symbols.push(Symbol::new(module, name));
        self.index.insert(key, id);
        id
    }

    /// Look up an existing symbol
    pub fn lookup(&self, module: &str, name: &str) -> Option<SymbolId> {
        self.index
            .get(&(module.to_string(), name.to_string()))
            .copied()
    }

    /// Access a symbol
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Mutably access a symbol
    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    /// Record that `alias` re-exports `exported`
    ///
    /// An alias keeps the first symbol it was linked to and never points at itself.
    pub fn link_alias(&mut self, exported: SymbolId, alias: SymbolId) {
        if exported == alias {
            return;
        }
        if self.symbols[alias.index()].exports.is_some() {
            return;
        }
        self.symbols[alias.index()].exports = Some(exported);
        self.symbols[exported.index()].aliases.push(alias);
    }

    /// Canonicalization result of a symbol
    ///
    /// Fails when the symbol has not been canonicalized yet.
    pub fn canonical(&self, id: SymbolId) -> BundleResult<Canonical> {
        let symbol = self.get(id);
        symbol.canonical.ok_or_else(|| {
            BundleError::InvalidState(format!(
                "symbol {}:{} read before canonicalization",
                symbol.module, symbol.name
            ))
        })
    }

    /// Ids of all symbols in creation order
    pub fn ids(&self) -> impl Iterator<Item = SymbolId> {
        (0..self.symbols.len()).map(SymbolId::new)
    }

    /// All symbols in creation order
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolId::new(index), symbol))
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
