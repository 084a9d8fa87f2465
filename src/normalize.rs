//! Deterministic ordering for harvested collections
//!
//! The controller makes no ordering guarantee, so every derived collection is
//! cleaned up before it leaves a harvester:
//! - blank entries dropped
//! - exact duplicates dropped
//! - sorted by the element's `Ord` (for structs, the field order is the key)
//!
//! Connector and connection attribute maps additionally lose their volatile
//! keys (timestamps, ownership and status flags).

use std::collections::BTreeMap;

/// Attribute keys that change between fetches without a configuration change.
pub const VOLATILE_KEYS: &[&str] = &[
    "modTs",
    "lcOwn",
    "status",
    "childAction",
    "uid",
    "userdom",
    "extMngdBy",
    "monPolDn",
    "configIssues",
    "configSt",
];

/// Entries that carry no information.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for &str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

/// Drop blanks and duplicates, then sort.
///
/// ```
/// use aci_docgen::normalize::sorted_unique;
///
/// let names = vec!["web".to_string(), "".to_string(), "db".to_string(), "web".to_string()];
/// assert_eq!(sorted_unique(names), vec!["db", "web"]);
/// ```
pub fn sorted_unique<T: Ord + Blank>(items: Vec<T>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().filter(|item| !item.is_blank()).collect();
    items.sort();
    items.dedup();
    items
}

/// Attribute map with volatile keys removed.
pub fn strip_volatile(attributes: BTreeMap<String, String>) -> BTreeMap<String, String> {
    attributes
        .into_iter()
        .filter(|(key, _)| !VOLATILE_KEYS.contains(&key.as_str()))
        .collect()
}

/// Entities that clean up their own derived collections.
pub trait Normalize {
    fn normalize(self) -> Self;
}

/// Normalize every element, then sort and dedup the collection itself.
pub fn normalize_all<T: Normalize + Ord + Blank>(items: Vec<T>) -> Vec<T> {
    sorted_unique(items.into_iter().map(Normalize::normalize).collect())
}
