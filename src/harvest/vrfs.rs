//! VRFs (`fvCtx`)

use super::Harvest;
use crate::classify::{Entity, Registry};
use crate::dn::Dn;
use crate::link::{attach, child_of, class, decode, Linker, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{sorted_unique, Normalize};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vrf {
    pub name: String,
    pub dn: Dn,
    pub pc_enf_pref: Option<String>,
    pub pc_enf_dir: Option<String>,
    pub knw_mcast_act: Option<String>,
    pub ip_data_plane_learning: Option<String>,
    pub bd_enforced_enable: Option<String>,
    pub pc_tag: Option<String>,
    pub health: Option<String>,
    pub bds: Vec<String>,
    pub bd_count: usize,
    pub vz_any: VzAny,
    /// Filled in by the orchestrator from the l3out section.
    pub l3outs: Vec<String>,
}

/// Contracts provided and consumed by the VRF's vzAny.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VzAny {
    pub provided: Vec<String>,
    pub consumed: Vec<String>,
}

impl Entity for Vrf {
    const CLASS: ClassTag = ClassTag::FvCtx;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("ctx")),
            dn: record.dn.clone(),
            pc_enf_pref: record.attr_owned("pcEnfPref"),
            pc_enf_dir: record.attr_owned("pcEnfDir"),
            knw_mcast_act: record.attr_owned("knwMcastAct"),
            ip_data_plane_learning: record.attr_owned("ipDataPlaneLearning"),
            bd_enforced_enable: record.attr_owned("bdEnforcedEnable"),
            pc_tag: record.attr_owned("pcTag"),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Normalize for Vrf {
    fn normalize(mut self) -> Self {
        self.bds = sorted_unique(self.bds);
        self.bd_count = self.bds.len();
        self.vz_any.provided = sorted_unique(self.vz_any.provided);
        self.vz_any.consumed = sorted_unique(self.vz_any.consumed);
        self.l3outs = sorted_unique(self.l3outs);
        self
    }
}

pub fn harvest(records: &[ObjectRecord]) -> Harvest<Vrf> {
    let mut vrfs = Registry::<Vrf>::classify(records);
    let mut linker = Linker::new(records);

    let health = linker.bind(
        &vrfs,
        child_of(ClassTag::HealthInst, "ctx"),
        Resolve::Parent,
        |r| r.attr_owned("cur"),
    );
    // fvRtCtx is the reverse side of a BD's fvRsCtx; its tDn names the BD.
    let bds = linker.bind(
        &vrfs,
        child_of(ClassTag::FvRtCtx, "ctx"),
        Resolve::Parent,
        decode::bd_name,
    );
    let provided = linker.bind(
        &vrfs,
        class(ClassTag::VzRsAnyToProv),
        Resolve::Parent,
        decode::contract_name,
    );
    let consumed = linker.bind(
        &vrfs,
        class(ClassTag::VzRsAnyToCons),
        Resolve::Parent,
        decode::contract_name,
    );

    attach(&mut vrfs, health, |vrf, cur| vrf.health = Some(cur));
    attach(&mut vrfs, bds, |vrf, bd| vrf.bds.push(bd));
    attach(&mut vrfs, provided, |vrf, name| vrf.vz_any.provided.push(name));
    attach(&mut vrfs, consumed, |vrf, name| vrf.vz_any.consumed.push(name));

    let items = vrfs
        .into_values()
        .into_iter()
        .map(Normalize::normalize)
        .collect();
    Harvest::new(items, linker.finish())
}
