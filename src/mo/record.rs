//! Object records as returned by the APIC REST API
//!
//! An `imdata` entry looks like
//! `{"fvBD": {"attributes": {"dn": "...", "name": "..."}, "children": [...]}}`.
//! Decoding here is best-effort: anything that does not look like a managed
//! object is skipped rather than reported.

use super::class::ClassTag;
use crate::dn::Dn;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// One managed object: class, DN, string attributes and nested children.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub class: ClassTag,
    pub dn: Dn,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<ObjectRecord>,
}

impl ObjectRecord {
    pub fn new(class: &str, dn: impl Into<Dn>) -> Self {
        Self {
            class: ClassTag::parse(class),
            dn: dn.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: ObjectRecord) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute value; empty strings count as absent.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// First present attribute among `keys`.
    pub fn attr_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.attr(key))
    }

    /// Owned copy of an attribute, `None` when absent.
    pub fn attr_owned(&self, key: &str) -> Option<String> {
        self.attr(key).map(str::to_string)
    }

    /// The relation target (`tDn`), when the record carries one.
    pub fn target(&self) -> Option<Dn> {
        self.attr("tDn").map(Dn::new)
    }

    /// Decode one `imdata` entry. `parent` supplies the DN prefix for
    /// children that only carry an `rn`.
    pub fn from_imdata_item(item: &Value, parent: Option<&Dn>) -> Option<Self> {
        let object = item.as_object()?;
        if object.len() != 1 {
            return None;
        }
        let (class, body) = object.iter().next()?;

        let attributes: BTreeMap<String, String> = body
            .get("attributes")
            .and_then(Value::as_object)
            .map(|attrs| {
                attrs
                    .iter()
                    .filter_map(|(key, value)| {
                        attribute_text(value).map(|text| (key.clone(), text))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let dn = match (attributes.get("dn"), attributes.get("rn"), parent) {
            (Some(dn), _, _) if !dn.is_empty() => Dn::new(dn.as_str()),
            (_, Some(rn), Some(parent)) if !rn.is_empty() => parent.child(rn),
            (_, Some(rn), None) if !rn.is_empty() => Dn::new(rn.as_str()),
            _ => Dn::default(),
        };

        let children = body
            .get("children")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|child| Self::from_imdata_item(child, Some(&dn)))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            class: ClassTag::parse(class),
            dn,
            attributes,
            children,
        })
    }

    /// Decode a whole `imdata` array.
    pub fn from_imdata(items: &[Value]) -> Vec<Self> {
        items
            .iter()
            .filter_map(|item| Self::from_imdata_item(item, None))
            .collect()
    }
}

fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Flatten nested records depth-first, parents before children.
///
/// A record whose `(class, dn)` was already emitted is dropped: a
/// `query-target=subtree&rsp-subtree=full` response lists every descendant
/// both at the top level and nested under its parent.
pub fn flatten(records: Vec<ObjectRecord>) -> Vec<ObjectRecord> {
    let mut seen: HashSet<(ClassTag, Dn)> = HashSet::new();
    let mut flat = Vec::new();
    let mut stack: Vec<ObjectRecord> = records.into_iter().rev().collect();

    while let Some(mut record) = stack.pop() {
        let children = std::mem::take(&mut record.children);
        stack.extend(children.into_iter().rev());

        if record.dn.is_empty() || seen.insert((record.class.clone(), record.dn.clone())) {
            flat.push(record);
        }
    }
    flat
}
