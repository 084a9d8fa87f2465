//! Tenant discovery

use crate::classify::Entity;
use crate::dn::Dn;
use crate::mo::{ClassTag, ObjectRecord};
use serde::Serialize;
use std::collections::HashSet;

/// Tenants owned by the fabric itself.
pub const SYSTEM_TENANTS: &[&str] = &["common", "infra", "mgmt"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub name: String,
    pub dn: Dn,
    pub descr: Option<String>,
}

impl Entity for Tenant {
    const CLASS: ClassTag = ClassTag::FvTenant;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("tn")),
            dn: record.dn.clone(),
            descr: record.attr_owned("descr"),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub fn is_system_tenant(name: &str) -> bool {
    SYSTEM_TENANTS.contains(&name)
}

/// Tenants in discovery order.
///
/// System tenants are dropped unless `include_system`; a non-empty `only`
/// keeps just the listed names. A DN seen twice keeps its first record.
pub fn discover(records: &[ObjectRecord], include_system: bool, only: &[String]) -> Vec<Tenant> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| record.class == Tenant::CLASS && !record.dn.is_empty())
        .filter(|record| seen.insert(record.dn.clone()))
        .map(Tenant::from_record)
        .filter(|tenant| include_system || !is_system_tenant(&tenant.name))
        .filter(|tenant| only.is_empty() || only.iter().any(|name| name == &tenant.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenants() -> Vec<ObjectRecord> {
        ["zeta", "common", "alpha", "mgmt", "infra"]
            .into_iter()
            .map(|name| {
                ObjectRecord::new("fvTenant", format!("uni/tn-{name}")).with_attr("name", name)
            })
            .collect()
    }

    #[test]
    fn test_discovery_keeps_order_and_drops_system() {
        let found = discover(&tenants(), false, &[]);
        let names: Vec<&str> = found.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_discovery_with_system_and_filter() {
        assert_eq!(discover(&tenants(), true, &[]).len(), 5);

        let only = vec!["common".to_string(), "alpha".to_string()];
        let names: Vec<String> = discover(&tenants(), true, &only)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["common", "alpha"]);
    }

    #[test]
    fn test_duplicate_tenant_record_ignored() {
        let mut records = tenants();
        records.push(ObjectRecord::new("fvTenant", "uni/tn-zeta").with_attr("name", "zeta"));
        assert_eq!(discover(&records, false, &[]).len(), 2);
    }
}
