//! Extension registry: (extended message layout, field number) to
//! extension identity.

use crate::ids::{ExtensionId, LayoutId};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Resolves extensions by number against a message layout
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    entries: FxHashMap<(LayoutId, i32), ExtensionId>,
}

impl ExtensionRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the extension registered for `number` on `extendee`
    pub fn get(&self, extendee: LayoutId, number: i32) -> Option<ExtensionId> {
        self.entries.get(&(extendee, number)).copied()
    }

    /// Returns true if `number` is taken on `extendee`
    pub fn contains(&self, extendee: LayoutId, number: i32) -> bool {
        self.entries.contains_key(&(extendee, number))
    }

    /// Reserves room for `additional` registrations
    pub(crate) fn try_reserve(&mut self, additional: usize) -> bool {
        self.entries.try_reserve(additional).is_ok()
    }

    /// Registers an extension. Returns false if the number is already
    /// taken on that message, leaving the registry unchanged.
    pub(crate) fn add(&mut self, extendee: LayoutId, number: i32, extension: ExtensionId) -> bool {
        match self.entries.entry((extendee, number)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(extension);
                true
            }
        }
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
