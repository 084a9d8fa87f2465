//! Object classifier: flat record stream -> typed entity registries
//!
//! Each entity type declares the primary class it is built from and projects
//! an explicit set of attributes out of the record ([`Entity::from_record`]).
//! A [`Registry`] holds one entity per DN; the first record for a DN wins and
//! later duplicates are ignored, so malformed input can never overwrite an
//! entity that has already been classified.

use crate::dn::Dn;
use crate::mo::{ClassTag, ObjectRecord};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// A typed accumulator built from one primary record.
pub trait Entity: Sized {
    /// Primary class this entity is classified from.
    const CLASS: ClassTag;

    /// Project the allow-listed attributes of a primary record.
    fn from_record(record: &ObjectRecord) -> Self;

    /// Name used for name -> DN lookups.
    fn name(&self) -> &str;
}

// ── Key ───────────────────────────────────────────────────────

/// DN of an entity held in a `Registry<E>`.
///
/// Only registries hand out keys, and a `Key<Contract>` cannot be used
/// against a `Registry<Epg>`.
pub struct Key<E> {
    dn: Dn,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Key<E> {
    fn new(dn: Dn) -> Self {
        Self {
            dn,
            _entity: PhantomData,
        }
    }

    pub fn dn(&self) -> &Dn {
        &self.dn
    }
}

impl<E> Clone for Key<E> {
    fn clone(&self) -> Self {
        Self::new(self.dn.clone())
    }
}

impl<E> PartialEq for Key<E> {
    fn eq(&self, other: &Self) -> bool {
        self.dn == other.dn
    }
}

impl<E> Eq for Key<E> {}

impl<E> fmt::Debug for Key<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.dn).finish()
    }
}

// ── NameTable ─────────────────────────────────────────────────

/// Name -> DN lookup. When several DNs share a name, the one first in DN
/// order wins whatever order they were inserted in.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: BTreeMap<String, Dn>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, dn: Dn) {
        let name = name.into();
        if name.is_empty() {
            return;
        }
        match self.entries.get_mut(&name) {
            Some(existing) if dn < *existing => *existing = dn,
            Some(_) => {}
            None => {
                self.entries.insert(name, dn);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Dn> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Registry ──────────────────────────────────────────────────

/// Entities of one type keyed by DN, iterated in DN order.
#[derive(Debug, Clone)]
pub struct Registry<E> {
    entries: BTreeMap<Dn, E>,
    names: NameTable,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            names: NameTable::new(),
        }
    }
}

impl<E: Entity> Registry<E> {
    /// Classify every primary record of `E::CLASS`; other classes are ignored.
    pub fn classify(records: &[ObjectRecord]) -> Self {
        let mut registry = Self::default();
        for record in records.iter().filter(|r| r.class == E::CLASS) {
            if record.dn.is_empty() {
                tracing::debug!(class = %E::CLASS, "primary record without a DN skipped");
                continue;
            }
            if !registry.insert(record.dn.clone(), E::from_record(record)) {
                tracing::warn!(
                    class = %E::CLASS,
                    dn = %record.dn,
                    "duplicate primary record ignored"
                );
            }
        }
        registry
    }

    /// Insert unless the DN is already present. Returns `false` on duplicates.
    pub fn insert(&mut self, dn: Dn, entity: E) -> bool {
        if self.entries.contains_key(&dn) {
            return false;
        }
        self.names.insert(entity.name(), dn.clone());
        self.entries.insert(dn, entity);
        true
    }
}

impl<E> Registry<E> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn key(&self, dn: &Dn) -> Option<Key<E>> {
        self.entries.contains_key(dn).then(|| Key::new(dn.clone()))
    }

    pub fn get(&self, key: &Key<E>) -> Option<&E> {
        self.entries.get(&key.dn)
    }

    pub fn get_mut(&mut self, key: &Key<E>) -> Option<&mut E> {
        self.entries.get_mut(&key.dn)
    }

    pub fn get_by_dn(&self, dn: &Dn) -> Option<&E> {
        self.entries.get(dn)
    }

    /// Nearest registered strict ancestor of `dn`.
    ///
    /// Walking the ancestors nearest-first and probing the map is the same
    /// answer as [`crate::dn::owner_of`] over every registered DN.
    pub fn owner_of(&self, dn: &Dn) -> Option<Key<E>> {
        dn.ancestors()
            .find(|ancestor| self.entries.contains_key(ancestor))
            .map(Key::new)
    }

    /// `dn` itself when registered, else its nearest registered ancestor.
    pub fn containing(&self, dn: &Dn) -> Option<Key<E>> {
        self.key(dn).or_else(|| self.owner_of(dn))
    }

    /// Names of the registered entities.
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dn, &E)> {
        self.entries.iter()
    }

    /// Entities in DN order.
    pub fn into_values(self) -> Vec<E> {
        self.entries.into_values().collect()
    }
}

impl<E> IntoIterator for Registry<E> {
    type Item = (Dn, E);
    type IntoIter = std::collections::btree_map::IntoIter<Dn, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
