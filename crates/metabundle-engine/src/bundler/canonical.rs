//! Symbol canonicalization
//!
//! Every symbol is referenced from the bundle through one canonical identity: the name it
//! is exported under by the root module when it is public, or its declaring symbol when it
//! is private.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::symbols::{Canonical, SymbolId, SymbolTable};
use super::MetadataBundler;
use crate::host::MetadataHost;

impl<H: MetadataHost> MetadataBundler<H> {
    /// Canonicalize every symbol created so far against the root export set
    pub(crate) fn canonicalize_symbols(&mut self, exported: &[SymbolId]) {
        self.exported = exported.iter().copied().collect();
        let snapshot: Vec<SymbolId> = self.symbols.ids().collect();
        for id in snapshot {
            self.canonicalize_symbol(id);
        }
    }

    /// Canonicalize a single symbol
    pub(crate) fn canonicalize_symbol(&mut self, id: SymbolId) -> Canonical {
        let canonical = canonicalize(&self.symbols, &self.exported, id);
        self.symbols.get_mut(id).canonical = Some(canonical);
        canonical
    }

    /// Canonicalized symbol for `(module, name)`, created on demand
    pub(crate) fn canonical_symbol_of(&mut self, module: &str, name: &str) -> SymbolId {
        // Make sure the module's aliases are known before looking at the symbol.
        self.export_all(module);
        let id = self.symbols.symbol_of(module, name);
        if self.symbols.get(id).canonical.is_none() {
            self.canonicalize_symbol(id);
        }
        id
    }

    /// Canonicalization of `id`, computing it first if a later phase created the symbol
    pub(crate) fn ensure_canonical(&mut self, id: SymbolId) -> Canonical {
        match self.symbols.get(id).canonical {
            Some(canonical) => canonical,
            None => self.canonicalize_symbol(id),
        }
    }
}

/// Compute the canonicalization of `id`
///
/// A symbol is public when the root exports it, or when any alias of its declaration is
/// exported by the root; the order in which aliases were registered does not matter.
pub fn canonicalize(
    table: &SymbolTable,
    exported: &FxHashSet<SymbolId>,
    id: SymbolId,
) -> Canonical {
    let declaration = declaration(table, id);
    let root = root_export(table, exported, id)
        .or_else(|| root_export(table, exported, declaration));
    match root {
        Some(root) => Canonical {
            is_private: false,
            declaration,
            symbol: root,
        },
        None => Canonical {
            is_private: true,
            declaration,
            symbol: declaration,
        },
    }
}

/// First root export reachable from `id` through its aliases, in registration order
pub fn root_export(
    table: &SymbolTable,
    exported: &FxHashSet<SymbolId>,
    id: SymbolId,
) -> Option<SymbolId> {
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        if exported.contains(&current) {
            return Some(current);
        }
        queue.extend(table.get(current).aliases.iter().copied());
    }
    None
}

/// Symbol owning the declaration an alias chain ends at
///
/// The walk stops before any symbol is visited twice.
pub fn declaration(table: &SymbolTable, id: SymbolId) -> SymbolId {
    let mut seen = FxHashSet::default();
    seen.insert(id);
    let mut current = id;
    while let Some(candidate) = table.get(current).exports {
        if !seen.insert(candidate) {
            break;
        }
        current = candidate;
    }
    current
}
