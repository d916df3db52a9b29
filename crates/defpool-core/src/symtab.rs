//! The pool's single namespace of qualified names.
//!
//! Messages, enums, enum values, services and extensions share one table.
//! Names are unique across kinds, so a lookup that asks for a specific
//! kind has to check the tag of whatever it finds.

use crate::def::{Def, DefKind};
use rustc_hash::FxHashMap;

/// Qualified name to tagged definition reference
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: FxHashMap<Box<str>, Def>,
}

impl SymbolTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with room for `capacity` symbols, or `None`
    /// if that much space cannot be allocated
    pub fn try_with_capacity(capacity: usize) -> Option<Self> {
        let mut entries = FxHashMap::default();
        entries.try_reserve(capacity).ok()?;
        Some(Self { entries })
    }

    /// Adds a binding. Returns false only if the table cannot grow.
    ///
    /// Callers check [`contains`](Self::contains) first; an existing binding
    /// for `name` is replaced.
    pub fn insert(&mut self, name: &str, def: Def) -> bool {
        if self.entries.try_reserve(1).is_err() {
            return false;
        }
        self.entries.insert(name.into(), def);
        true
    }

    /// Looks up `name`, returning it only if it has the wanted kind
    pub fn lookup(&self, name: &str, kind: DefKind) -> Option<Def> {
        self.lookup_any(name).filter(|def| def.kind() == kind)
    }

    /// Looks up `name` whatever its kind
    pub fn lookup_any(&self, name: &str) -> Option<Def> {
        self.entries.get(name).copied()
    }

    /// Returns true if `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over all bindings in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Def)> + '_ {
        self.entries.iter().map(|(name, def)| (&**name, *def))
    }

    /// Removes every binding for which `keep` returns false, returning how
    /// many were removed
    pub fn retain(&mut self, mut keep: impl FnMut(&str, Def) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|name, def| keep(name, *def));
        before - self.entries.len()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
