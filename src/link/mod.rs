//! Relationship linker
//!
//! Relation records (`fvRsProv`, `fvRsPathAtt`, `fvSubnet`, selectors, ...)
//! are resolved onto entities that were already classified, then decoded into
//! the owner's collections.
//!
//! Linking is split in two so that a relation either lands completely or not
//! at all:
//! - [`Linker::bind`] resolves and decodes, producing `(owner key, value)`
//!   pairs without touching any registry
//! - [`attach`] folds those pairs into the owners
//!
//! A relation whose owner cannot be found is dropped and counted in the
//! [`LinkReport`].

pub mod decode;

pub use decode::{BindingKind, PathBinding};

use crate::classify::{Entity, Key, NameTable, Registry};
use crate::mo::{ClassTag, ObjectRecord};
use serde::Serialize;
use std::collections::BTreeMap;

// ── Report ────────────────────────────────────────────────────

/// Relation records dropped for lack of an owner, counted per class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LinkReport {
    unresolved: BTreeMap<String, usize>,
}

impl LinkReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unresolved(&mut self, class: &ClassTag) {
        *self.unresolved.entry(class.as_str().to_string()).or_default() += 1;
    }

    pub fn merge(&mut self, other: LinkReport) {
        for (class, count) in other.unresolved {
            *self.unresolved.entry(class).or_default() += count;
        }
    }

    pub fn count(&self, class: &ClassTag) -> usize {
        self.unresolved.get(class.as_str()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.unresolved.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.unresolved
    }
}

// ── Resolution strategies ─────────────────────────────────────

/// How a relation record finds its owner.
#[derive(Clone, Copy)]
pub enum Resolve<'t> {
    /// Nearest registered ancestor of the relation's own DN.
    Parent,
    /// The entity named by the relation's `tDn` (or its nearest registered
    /// ancestor). Only a relation without a `tDn` falls back to the entity
    /// whose name is in `name_attr`; a `tDn` outside the registry stays
    /// unresolved even when the name matches.
    Target { name_attr: &'static str },
    /// Own-DN prefix first. Failing that, the first of `keys(record)` found
    /// in `table`; the DN found there may be the owner itself or one of its
    /// descendants, so it is scanned against the registry once more.
    Named {
        table: &'t NameTable,
        keys: fn(&ObjectRecord) -> Vec<String>,
    },
}

impl Resolve<'_> {
    pub fn owner<E>(&self, registry: &Registry<E>, record: &ObjectRecord) -> Option<Key<E>> {
        match self {
            Resolve::Parent => registry.owner_of(&record.dn),
            Resolve::Target { name_attr } => match record.target() {
                Some(target) => registry.containing(&target),
                None => {
                    let name = record.attr(name_attr)?;
                    let dn = registry.names().get(name)?;
                    registry.containing(dn)
                }
            },
            Resolve::Named { table, keys } => registry.owner_of(&record.dn).or_else(|| {
                let dn = keys(record).iter().find_map(|key| table.get(key))?;
                registry.containing(dn)
            }),
        }
    }
}

// ── Record selection ──────────────────────────────────────────

/// Records of exactly this class.
pub fn class(tag: ClassTag) -> impl Fn(&ObjectRecord) -> bool {
    move |record| record.class == tag
}

/// Records of this class whose parent segment carries `marker`.
///
/// `fvRsProv` hangs under EPGs, ESGs and external EPGs alike; each section
/// only considers the ones under its own owner kind.
pub fn child_of(tag: ClassTag, marker: &'static str) -> impl Fn(&ObjectRecord) -> bool {
    move |record| {
        record.class == tag
            && record
                .dn
                .parent()
                .and_then(|parent| parent.last_segment().map(|s| s.marker() == marker))
                .unwrap_or(false)
    }
}

/// Like [`child_of`], with the parent itself directly under an `outer`
/// segment. Tells `out-*/instP-*` apart from `l2out-*/instP-*`.
pub fn child_of_within(
    tag: ClassTag,
    marker: &'static str,
    outer: &'static str,
) -> impl Fn(&ObjectRecord) -> bool {
    let direct = child_of(tag, marker);
    move |record| {
        direct(record)
            && record
                .dn
                .parent()
                .and_then(|parent| parent.parent())
                .and_then(|grand| grand.last_segment().map(|s| s.marker() == outer))
                .unwrap_or(false)
    }
}

// ── Linker ────────────────────────────────────────────────────

/// Resolves relation records from one flattened subtree.
pub struct Linker<'r> {
    records: &'r [ObjectRecord],
    report: LinkReport,
}

impl<'r> Linker<'r> {
    pub fn new(records: &'r [ObjectRecord]) -> Self {
        Self {
            records,
            report: LinkReport::new(),
        }
    }

    /// Resolve and decode every selected record.
    ///
    /// Records without an owner are counted as unresolved. Records whose
    /// decoder yields nothing are skipped; decoding already falls back as far
    /// as it can, so those carry no usable value at all.
    pub fn bind<E, T>(
        &mut self,
        registry: &Registry<E>,
        select: impl Fn(&ObjectRecord) -> bool,
        resolve: Resolve<'_>,
        decode: impl Fn(&ObjectRecord) -> Option<T>,
    ) -> Vec<(Key<E>, T)> {
        let mut bound = Vec::new();
        for record in self.records.iter().filter(|r| select(*r)) {
            let Some(owner) = resolve.owner(registry, record) else {
                self.report.record_unresolved(&record.class);
                continue;
            };
            match decode(record) {
                Some(value) => bound.push((owner, value)),
                None => tracing::trace!(
                    class = %record.class,
                    dn = %record.dn,
                    "relation carries nothing to decode"
                ),
            }
        }
        bound
    }

    /// Nest classified child entities under their nearest registered
    /// ancestor in `parents`. Orphans are counted under the child's class.
    pub fn nest<P, C: Entity>(
        &mut self,
        parents: &Registry<P>,
        children: Registry<C>,
    ) -> Vec<(Key<P>, C)> {
        let mut nested = Vec::new();
        for (dn, child) in children {
            match parents.owner_of(&dn) {
                Some(owner) => nested.push((owner, child)),
                None => self.report.record_unresolved(&C::CLASS),
            }
        }
        nested
    }

    pub fn finish(self) -> LinkReport {
        if !self.report.is_empty() {
            tracing::debug!(
                unresolved = self.report.total(),
                classes = ?self.report.counts(),
                "unresolved relations dropped"
            );
        }
        self.report
    }
}

/// Fold resolved bindings into their owners.
pub fn attach<E, T>(
    registry: &mut Registry<E>,
    bindings: Vec<(Key<E>, T)>,
    mut apply: impl FnMut(&mut E, T),
) {
    for (key, value) in bindings {
        if let Some(owner) = registry.get_mut(&key) {
            apply(owner, value);
        }
    }
}
