//! The harvested document: one entry per tenant
//!
//! A section is `None` when it was not requested or its fetch failed; the
//! failure then shows up in [`Diagnostics::failed_sections`]. Serialization
//! skips absent sections and empty diagnostics so the JSON snapshot only
//! carries what was harvested.

use crate::dn::Dn;
use crate::error::HarvestError;
use crate::harvest::bds::BridgeDomain;
use crate::harvest::contracts::Contract;
use crate::harvest::epgs::Epg;
use crate::harvest::esg::EndpointSecurityGroup;
use crate::harvest::l2out::L2Out;
use crate::harvest::l3out::L3Out;
use crate::harvest::service_graphs::ServiceGraph;
use crate::harvest::tenants::Tenant;
use crate::harvest::vmm::VmmDomainRef;
use crate::harvest::vrfs::Vrf;
use crate::harvest::{Harvest, Section};
use crate::link::LinkReport;
use serde::Serialize;
use std::collections::BTreeMap;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Top-level document, tenants in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FabricDocument {
    pub tenants: Vec<TenantDocument>,
    /// Set when the sweep was cancelled before every tenant was visited.
    #[serde(skip_serializing_if = "is_false")]
    pub interrupted: bool,
}

impl FabricDocument {
    pub fn tenant(&self, name: &str) -> Option<&TenantDocument> {
        self.tenants.iter().find(|tenant| tenant.name == name)
    }

    /// Tenants with at least one failed section or VMM domain.
    pub fn failed_tenants(&self) -> impl Iterator<Item = &TenantDocument> {
        self.tenants
            .iter()
            .filter(|tenant| tenant.diagnostics.has_failures())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TenantDocument {
    pub name: String,
    pub dn: Dn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrfs: Option<Vec<Vrf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bds: Option<Vec<BridgeDomain>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epgs: Option<Vec<Epg>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contracts: Option<Vec<Contract>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l3outs: Option<Vec<L3Out>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l2outs: Option<Vec<L2Out>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_graphs: Option<Vec<ServiceGraph>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmm: Option<Vec<VmmDomainRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub esgs: Option<Vec<EndpointSecurityGroup>>,
    #[serde(skip_serializing_if = "Diagnostics::is_empty")]
    pub diagnostics: Diagnostics,
}

/// What a tenant's harvest could not do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Unresolved relation counts, keyed by section name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub unresolved: BTreeMap<String, LinkReport>,
    /// Error message per failed section.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failed_sections: BTreeMap<String, String>,
    /// Error message per VMM domain whose own fetch failed, keyed by DN. The
    /// domain stays in `vmm` without its enrichment.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failed_domains: BTreeMap<String, String>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty() && !self.has_failures()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_sections.is_empty() || !self.failed_domains.is_empty()
    }
}

impl TenantDocument {
    pub fn new(tenant: &Tenant) -> Self {
        Self {
            name: tenant.name.clone(),
            dn: tenant.dn.clone(),
            descr: tenant.descr.clone(),
            ..Self::default()
        }
    }

    /// Keep a section's unresolved counts and hand back its items.
    pub fn absorb<T>(&mut self, section: Section, harvest: Harvest<T>) -> Option<Vec<T>> {
        if !harvest.report.is_empty() {
            self.diagnostics
                .unresolved
                .insert(section.as_str().to_string(), harvest.report);
        }
        Some(harvest.items)
    }

    pub fn record_failure(&mut self, section: Section, error: &HarvestError) {
        self.diagnostics
            .failed_sections
            .insert(section.as_str().to_string(), error.to_string());
    }

    pub fn record_domain_failure(&mut self, domain: &Dn, error: &HarvestError) {
        self.diagnostics
            .failed_domains
            .insert(domain.to_string(), error.to_string());
    }

    pub fn failed(&self, section: Section) -> Option<&str> {
        self.diagnostics
            .failed_sections
            .get(section.as_str())
            .map(String::as_str)
    }

    /// Item count of a harvested section, `None` when it is absent.
    pub fn count(&self, section: Section) -> Option<usize> {
        match section {
            Section::Vrfs => self.vrfs.as_ref().map(Vec::len),
            Section::Bds => self.bds.as_ref().map(Vec::len),
            Section::Epgs => self.epgs.as_ref().map(Vec::len),
            Section::Contracts => self.contracts.as_ref().map(Vec::len),
            Section::L3Outs => self.l3outs.as_ref().map(Vec::len),
            Section::L2Outs => self.l2outs.as_ref().map(Vec::len),
            Section::ServiceGraphs => self.service_graphs.as_ref().map(Vec::len),
            Section::Vmm => self.vmm.as_ref().map(Vec::len),
            Section::Esgs => self.esgs.as_ref().map(Vec::len),
        }
    }

    /// Sections that were harvested or attempted, in document order.
    pub fn sections(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| self.count(*section).is_some() || self.failed(*section).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mo::ClassTag;
    use serde_json::json;

    fn tenant() -> Tenant {
        Tenant {
            name: "Prod".to_string(),
            dn: Dn::new("uni/tn-Prod"),
            descr: None,
        }
    }

    #[test]
    fn test_absent_sections_are_not_serialized() {
        let mut entry = TenantDocument::new(&tenant());
        entry.vrfs = Some(Vec::new());

        let value = serde_json::to_value(FabricDocument {
            tenants: vec![entry],
            interrupted: false,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"tenants": [{"name": "Prod", "dn": "uni/tn-Prod", "vrfs": []}]})
        );
    }

    #[test]
    fn test_absorb_keeps_non_empty_reports() {
        let mut entry = TenantDocument::new(&tenant());

        let mut report = LinkReport::new();
        report.record_unresolved(&ClassTag::FvRsProv);
        entry.epgs = entry.absorb(Section::Epgs, Harvest::new(Vec::new(), report));
        entry.bds = entry.absorb(Section::Bds, Harvest::new(Vec::new(), LinkReport::new()));

        assert_eq!(entry.diagnostics.unresolved.len(), 1);
        assert_eq!(entry.diagnostics.unresolved["epgs"].count(&ClassTag::FvRsProv), 1);
        assert_eq!(entry.sections(), vec![Section::Bds, Section::Epgs]);
    }

    #[test]
    fn test_failures_are_reported_per_section() {
        let mut entry = TenantDocument::new(&tenant());
        entry.record_failure(Section::Vmm, &HarvestError::Controller("denied".into()));

        assert_eq!(entry.failed(Section::Vmm), Some("controller error: denied"));
        assert_eq!(entry.count(Section::Vmm), None);
        assert_eq!(entry.sections(), vec![Section::Vmm]);

        let doc = FabricDocument {
            tenants: vec![entry],
            interrupted: true,
        };
        assert_eq!(doc.failed_tenants().count(), 1);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["interrupted"], json!(true));
        assert_eq!(
            value["tenants"][0]["diagnostics"]["failed_sections"]["vmm"],
            json!("controller error: denied")
        );
    }
}
