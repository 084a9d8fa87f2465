//! Bridge domains (`fvBD`) and their subnets

use super::Harvest;
use crate::classify::{Entity, Registry};
use crate::dn::{decode_bracketed_interior, Dn};
use crate::link::{attach, child_of, decode, Linker, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{sorted_unique, Blank, Normalize};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeDomain {
    pub name: String,
    pub dn: Dn,
    pub unicast_route: Option<String>,
    pub arp_flood: Option<String>,
    pub unk_mac_ucast_act: Option<String>,
    pub limit_ip_learn_to_subnets: Option<String>,
    pub ip_learning: Option<String>,
    pub multi_dst_pkt_act: Option<String>,
    pub vrf: Option<String>,
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Subnet {
    pub ip: String,
    pub scope: Option<String>,
}

impl Subnet {
    /// `ip` attribute, else the bracketed value of the subnet's own RN.
    pub fn from_record(record: &ObjectRecord) -> Option<Self> {
        let ip = record.attr_owned("ip").or_else(|| {
            record
                .dn
                .last_segment()
                .and_then(|segment| decode_bracketed_interior(segment.raw()))
                .map(str::to_string)
        })?;
        Some(Self {
            ip,
            scope: record.attr_owned("scope"),
        })
    }
}

impl Blank for Subnet {
    fn is_blank(&self) -> bool {
        self.ip.is_blank()
    }
}

impl Entity for BridgeDomain {
    const CLASS: ClassTag = ClassTag::FvBd;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("BD")),
            dn: record.dn.clone(),
            unicast_route: record.attr_owned("unicastRoute"),
            arp_flood: record.attr_owned("arpFlood"),
            unk_mac_ucast_act: record.attr_owned("unkMacUcastAct"),
            limit_ip_learn_to_subnets: record.attr_owned("limitIpLearnToSubnets"),
            ip_learning: record.attr_owned("ipLearning"),
            multi_dst_pkt_act: record.attr_owned("multiDstPktAct"),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Normalize for BridgeDomain {
    fn normalize(mut self) -> Self {
        self.subnets = sorted_unique(self.subnets);
        self
    }
}

pub fn harvest(records: &[ObjectRecord]) -> Harvest<BridgeDomain> {
    let mut bds = Registry::<BridgeDomain>::classify(records);
    let mut linker = Linker::new(records);

    let vrfs = linker.bind(
        &bds,
        child_of(ClassTag::FvRsCtx, "BD"),
        Resolve::Parent,
        decode::vrf_name,
    );
    let subnets = linker.bind(
        &bds,
        child_of(ClassTag::FvSubnet, "BD"),
        Resolve::Parent,
        Subnet::from_record,
    );

    attach(&mut bds, vrfs, |bd, vrf| bd.vrf = Some(vrf));
    attach(&mut bds, subnets, |bd, subnet| bd.subnets.push(subnet));

    let items = bds
        .into_values()
        .into_iter()
        .map(Normalize::normalize)
        .collect();
    Harvest::new(items, linker.finish())
}
