//! Section harvesters
//!
//! Each harvester is a pure function over one tenant's flattened subtree:
//! classify the primary records, link the relations onto them, normalize.
//! Fetching and composition live in [`crate::pipeline`].
//!
//! - [`tenants`]: tenant discovery from the `fvTenant` class fetch
//! - [`vrfs`], [`bds`], [`epgs`]: the `tenants` section
//! - [`contracts`], [`l3out`], [`l2out`], [`service_graphs`], [`vmm`], [`esg`]

pub mod bds;
pub mod contracts;
pub mod epgs;
pub mod esg;
pub mod l2out;
pub mod l3out;
pub mod service_graphs;
pub mod tenants;
pub mod vmm;
pub mod vrfs;

use crate::link::LinkReport;
use crate::mo::{ClassTag, ObjectRecord};
use std::fmt;

/// Entities produced by one harvester plus the relations it had to drop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Harvest<T> {
    pub items: Vec<T>,
    pub report: LinkReport,
}

impl<T> Harvest<T> {
    pub fn new(items: Vec<T>, report: LinkReport) -> Self {
        Self { items, report }
    }
}

/// One harvester, named as it appears in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Vrfs,
    Bds,
    Epgs,
    Contracts,
    L3Outs,
    L2Outs,
    ServiceGraphs,
    Vmm,
    Esgs,
}

const VRF_CLASSES: &[ClassTag] = &[ClassTag::FvCtx];
const BD_CLASSES: &[ClassTag] = &[ClassTag::FvBd];
const EPG_CLASSES: &[ClassTag] = &[ClassTag::FvAEPg];
const CONTRACT_CLASSES: &[ClassTag] = &[ClassTag::VzBrCP, ClassTag::VzSubj];
const L3OUT_CLASSES: &[ClassTag] = &[ClassTag::L3extOut, ClassTag::L3extInstP];
const L2OUT_CLASSES: &[ClassTag] = &[ClassTag::L2extOut];
const GRAPH_CLASSES: &[ClassTag] = &[
    ClassTag::VnsAbsGraph,
    ClassTag::VnsAbsNode,
    ClassTag::VnsAbsConnection,
    ClassTag::VnsLDevCtx,
];
const VMM_CLASSES: &[ClassTag] = &[ClassTag::FvRsDomAtt];
const ESG_CLASSES: &[ClassTag] = &[ClassTag::FvESg];

impl Section {
    pub const ALL: [Section; 9] = [
        Section::Vrfs,
        Section::Bds,
        Section::Epgs,
        Section::Contracts,
        Section::L3Outs,
        Section::L2Outs,
        Section::ServiceGraphs,
        Section::Vmm,
        Section::Esgs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Vrfs => "vrfs",
            Section::Bds => "bds",
            Section::Epgs => "epgs",
            Section::Contracts => "contracts",
            Section::L3Outs => "l3outs",
            Section::L2Outs => "l2outs",
            Section::ServiceGraphs => "service_graphs",
            Section::Vmm => "vmm",
            Section::Esgs => "esgs",
        }
    }

    /// Classes this section classifies into entities. VMM is driven by the
    /// `fvRsDomAtt` relations that reference a domain.
    pub fn primary_classes(&self) -> &'static [ClassTag] {
        match self {
            Section::Vrfs => VRF_CLASSES,
            Section::Bds => BD_CLASSES,
            Section::Epgs => EPG_CLASSES,
            Section::Contracts => CONTRACT_CLASSES,
            Section::L3Outs => L3OUT_CLASSES,
            Section::L2Outs => L2OUT_CLASSES,
            Section::ServiceGraphs => GRAPH_CLASSES,
            Section::Vmm => VMM_CLASSES,
            Section::Esgs => ESG_CLASSES,
        }
    }

    /// Number of records in `records` this section would classify.
    pub fn primary_count(&self, records: &[ObjectRecord]) -> usize {
        let classes = self.primary_classes();
        records
            .iter()
            .filter(|record| classes.contains(&record.class))
            .count()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
