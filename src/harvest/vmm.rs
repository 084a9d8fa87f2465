//! VMM domains referenced by a tenant
//!
//! A tenant does not own VMM domains; it references them through the
//! `fvRsDomAtt` relations of its EPGs. [`references`] collects those from the
//! tenant subtree, then [`enrich`] fills in one domain from its own subtree
//! (`uni/vmmp-<provider>/dom-<name>`), which the orchestrator fetches.

use super::Harvest;
use crate::classify::{Entity, Registry};
use crate::dn::Dn;
use crate::link::{attach, class, decode, Linker, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{sorted_unique, Normalize};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VmmDomainRef {
    pub name: String,
    pub dn: Dn,
    /// Provider, e.g. `VMware` or `Microsoft`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `ap/epg` labels of the EPGs attached to the domain.
    pub epgs: Vec<String>,
    pub mode: Option<String>,
    pub controllers: Vec<String>,
    pub vlan_pools: Vec<String>,
}

impl VmmDomainRef {
    /// A reference to the VMM domain at `target`, if it is one.
    pub fn referenced(target: &Dn) -> Option<Self> {
        let (kind, name) = decode::vmm_domain(target)?;
        Some(Self {
            name,
            dn: target.clone(),
            kind,
            ..Self::default()
        })
    }
}

impl Entity for VmmDomainRef {
    const CLASS: ClassTag = ClassTag::VmmDomP;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("dom")),
            dn: record.dn.clone(),
            kind: record.dn.name_after("vmmp"),
            mode: record.attr_owned("mode"),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Normalize for VmmDomainRef {
    fn normalize(mut self) -> Self {
        self.epgs = sorted_unique(self.epgs);
        self.controllers = sorted_unique(self.controllers);
        self.vlan_pools = sorted_unique(self.vlan_pools);
        self
    }
}

/// Distinct VMM domains referenced by the tenant's EPGs, not yet enriched.
pub fn references(records: &[ObjectRecord]) -> Vec<VmmDomainRef> {
    let mut domains = Registry::<VmmDomainRef>::default();
    for record in records.iter().filter(|r| r.class == ClassTag::FvRsDomAtt) {
        let Some(target) = record.target() else {
            continue;
        };
        let Some(domain) = VmmDomainRef::referenced(&target) else {
            continue;
        };
        domains.insert(target.clone(), domain);
        if let (Some(key), Some(epg)) = (domains.key(&target), record.dn.parent()) {
            if let Some(domain) = domains.get_mut(&key) {
                domain.epgs.push(decode::endpoint_label(&epg));
            }
        }
    }
    domains
        .into_values()
        .into_iter()
        .map(Normalize::normalize)
        .collect()
}

/// Fill in mode, controllers and VLAN pools from the domain's own subtree.
pub fn enrich(reference: VmmDomainRef, records: &[ObjectRecord]) -> Harvest<VmmDomainRef> {
    let mut fetched = Registry::<VmmDomainRef>::classify(records);
    if fetched.key(&reference.dn).is_none() {
        // The subtree answered without the vmmDomP itself; keep the reference.
        fetched.insert(reference.dn.clone(), reference.clone());
    }
    let mut linker = Linker::new(records);

    let controllers = linker.bind(
        &fetched,
        class(ClassTag::VmmCtrlrP),
        Resolve::Parent,
        |r| r.attr_owned("name").or_else(|| r.attr_owned("hostOrIp")),
    );
    let pools = linker.bind(
        &fetched,
        |r| matches!(r.class, ClassTag::InfraRsVlanNs | ClassTag::VmmRsVlanNs),
        Resolve::Parent,
        |r| r.target().map(|target| decode::vlan_pool_name(&target)),
    );
    attach(&mut fetched, controllers, |domain, name| domain.controllers.push(name));
    attach(&mut fetched, pools, |domain, name| domain.vlan_pools.push(name));

    let report = linker.finish();
    let enriched = match fetched.key(&reference.dn).and_then(|key| fetched.get(&key)) {
        Some(domain) => VmmDomainRef {
            mode: domain.mode.clone(),
            controllers: domain.controllers.clone(),
            vlan_pools: domain.vlan_pools.clone(),
            ..reference
        },
        None => reference,
    };
    Harvest::new(vec![enriched.normalize()], report)
}
