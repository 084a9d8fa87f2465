//! Routed external connectivity (`l3extOut`)

use super::Harvest;
use crate::classify::{Entity, Registry};
use crate::dn::{decode_bracketed_interior, Dn};
use crate::link::{attach, child_of, child_of_within, class, decode, Linker, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{normalize_all, sorted_unique, Blank, Normalize};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct L3Out {
    pub name: String,
    pub dn: Dn,
    pub vrf: Option<String>,
    pub domain: Option<String>,
    pub protocols: Vec<String>,
    pub nodes: Vec<BorderNode>,
    pub external_subnets: Vec<ExternalSubnet>,
    pub instps: Vec<ExternalEpg>,
}

/// Border leaf attached through a logical node profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BorderNode {
    pub node_id: String,
    pub router_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ExternalSubnet {
    pub ip: String,
    pub scope: Option<String>,
    pub instp: String,
}

/// External EPG (`l3extInstP`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ExternalEpg {
    pub name: String,
    pub provided_contracts: Vec<String>,
    pub consumed_contracts: Vec<String>,
}

impl Entity for L3Out {
    const CLASS: ClassTag = ClassTag::L3extOut;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("out")),
            dn: record.dn.clone(),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for ExternalEpg {
    const CLASS: ClassTag = ClassTag::L3extInstP;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("instP")),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Blank for BorderNode {
    fn is_blank(&self) -> bool {
        self.node_id.is_blank()
    }
}

impl Blank for ExternalSubnet {
    fn is_blank(&self) -> bool {
        self.ip.is_blank()
    }
}

impl Blank for ExternalEpg {
    fn is_blank(&self) -> bool {
        self.name.is_blank()
    }
}

impl Normalize for ExternalEpg {
    fn normalize(mut self) -> Self {
        self.provided_contracts = sorted_unique(self.provided_contracts);
        self.consumed_contracts = sorted_unique(self.consumed_contracts);
        self
    }
}

impl Normalize for L3Out {
    fn normalize(mut self) -> Self {
        self.protocols = sorted_unique(self.protocols);
        self.nodes = sorted_unique(self.nodes);
        self.external_subnets = sorted_unique(self.external_subnets);
        self.instps = normalize_all(self.instps);
        self
    }
}

/// Routing protocol enabled by a protocol profile class.
fn protocol(class: &ClassTag) -> Option<&'static str> {
    match class {
        ClassTag::OspfExtP => Some("OSPF"),
        ClassTag::BgpExtP => Some("BGP"),
        ClassTag::EigrpExtP => Some("EIGRP"),
        _ => None,
    }
}

fn border_node(record: &ObjectRecord) -> Option<BorderNode> {
    let target = record.target()?;
    Some(BorderNode {
        node_id: target.name_after("node"),
        router_id: record.attr_owned("rtrId"),
    })
}

fn external_subnet(record: &ObjectRecord) -> Option<ExternalSubnet> {
    let ip = record.attr_owned("ip").or_else(|| {
        record
            .dn
            .last_segment()
            .and_then(|segment| decode_bracketed_interior(segment.raw()))
            .map(str::to_string)
    })?;
    Some(ExternalSubnet {
        ip,
        scope: record.attr_owned("scope"),
        instp: record.dn.name_after("instP"),
    })
}

pub fn harvest(records: &[ObjectRecord]) -> Harvest<L3Out> {
    let mut outs = Registry::<L3Out>::classify(records);
    let mut instps = Registry::<ExternalEpg>::classify(records);
    let mut linker = Linker::new(records);

    let provided = linker.bind(
        &instps,
        child_of_within(ClassTag::FvRsProv, "instP", "out"),
        Resolve::Parent,
        decode::contract_name,
    );
    let consumed = linker.bind(
        &instps,
        child_of_within(ClassTag::FvRsCons, "instP", "out"),
        Resolve::Parent,
        decode::contract_name,
    );
    attach(&mut instps, provided, |instp, name| instp.provided_contracts.push(name));
    attach(&mut instps, consumed, |instp, name| instp.consumed_contracts.push(name));

    let vrfs = linker.bind(
        &outs,
        child_of(ClassTag::L3extRsEctx, "out"),
        Resolve::Parent,
        decode::vrf_name,
    );
    let domains = linker.bind(
        &outs,
        child_of(ClassTag::L3extRsL3DomAtt, "out"),
        Resolve::Parent,
        |r| r.target().map(|target| decode::domain_label(&target)),
    );
    let protocols = linker.bind(
        &outs,
        |r| protocol(&r.class).is_some(),
        Resolve::Parent,
        |r| protocol(&r.class).map(str::to_string),
    );
    let nodes = linker.bind(
        &outs,
        class(ClassTag::L3extRsNodeL3OutAtt),
        Resolve::Parent,
        border_node,
    );
    let subnets = linker.bind(
        &outs,
        class(ClassTag::L3extSubnet),
        Resolve::Parent,
        external_subnet,
    );
    let nested = linker.nest(&outs, instps);

    attach(&mut outs, vrfs, |out, vrf| out.vrf = Some(vrf));
    attach(&mut outs, domains, |out, domain| out.domain = Some(domain));
    attach(&mut outs, protocols, |out, name| out.protocols.push(name));
    attach(&mut outs, nodes, |out, node| out.nodes.push(node));
    attach(&mut outs, subnets, |out, subnet| out.external_subnets.push(subnet));
    attach(&mut outs, nested, |out, instp| out.instps.push(instp));

    let items = outs
        .into_values()
        .into_iter()
        .map(Normalize::normalize)
        .collect();
    Harvest::new(items, linker.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<ObjectRecord> {
        vec![
            ObjectRecord::new("l3extOut", "uni/tn-T/out-Core").with_attr("name", "Core"),
            ObjectRecord::new("l3extRsEctx", "uni/tn-T/out-Core/rsectx")
                .with_attr("tDn", "uni/tn-T/ctx-Prod"),
            ObjectRecord::new("l3extRsL3DomAtt", "uni/tn-T/out-Core/rsl3DomAtt")
                .with_attr("tDn", "uni/l3dom-WAN"),
            ObjectRecord::new("bgpExtP", "uni/tn-T/out-Core/bgpExtP"),
            ObjectRecord::new("ospfExtP", "uni/tn-T/out-Core/ospfExtP"),
            ObjectRecord::new(
                "l3extRsNodeL3OutAtt",
                "uni/tn-T/out-Core/lnodep-Border/rsnodeL3OutAtt-[topology/pod-1/node-101]",
            )
            .with_attr("tDn", "topology/pod-1/node-101")
            .with_attr("rtrId", "1.1.1.101"),
            ObjectRecord::new("l3extInstP", "uni/tn-T/out-Core/instP-Any").with_attr("name", "Any"),
            ObjectRecord::new("l3extSubnet", "uni/tn-T/out-Core/instP-Any/extsubnet-[0.0.0.0/0]")
                .with_attr("scope", "import-security"),
            ObjectRecord::new("fvRsCons", "uni/tn-T/out-Core/instP-Any/rscons-web")
                .with_attr("tDn", "uni/tn-T/brc-web"),
            ObjectRecord::new("fvRsProv", "uni/tn-T/ap-A/epg-E/rsprov-web")
                .with_attr("tDn", "uni/tn-T/brc-web"),
        ]
    }

    #[test]
    fn test_l3out_relations() {
        let harvest = harvest(&fixture());
        assert_eq!(harvest.items.len(), 1);

        let core = &harvest.items[0];
        assert_eq!(core.vrf.as_deref(), Some("Prod"));
        assert_eq!(core.domain.as_deref(), Some("l3dom:WAN"));
        assert_eq!(core.protocols, vec!["BGP", "OSPF"]);
        assert_eq!(
            core.nodes,
            vec![BorderNode {
                node_id: "101".to_string(),
                router_id: Some("1.1.1.101".to_string())
            }]
        );
        assert_eq!(
            core.external_subnets,
            vec![ExternalSubnet {
                ip: "0.0.0.0/0".to_string(),
                scope: Some("import-security".to_string()),
                instp: "Any".to_string()
            }]
        );
    }

    #[test]
    fn test_external_epg_contracts() {
        let harvest = harvest(&fixture());
        let instps = &harvest.items[0].instps;
        assert_eq!(instps.len(), 1);
        assert_eq!(instps[0].name, "Any");
        assert_eq!(instps[0].consumed_contracts, vec!["web"]);
        assert!(instps[0].provided_contracts.is_empty());
        assert!(harvest.report.is_empty());
    }

    #[test]
    fn test_l2out_external_epg_contracts_ignored() {
        let mut records = fixture();
        records.push(ObjectRecord::new("l2extOut", "uni/tn-T/l2out-Legacy").with_attr("name", "Legacy"));
        records.push(ObjectRecord::new("l2extInstP", "uni/tn-T/l2out-Legacy/instP-E"));
        records.push(
            ObjectRecord::new("fvRsCons", "uni/tn-T/l2out-Legacy/instP-E/rscons-web")
                .with_attr("tDn", "uni/tn-T/brc-web"),
        );

        let harvest = harvest(&records);
        assert_eq!(harvest.items.len(), 1);
        assert_eq!(harvest.items[0].instps[0].consumed_contracts, vec!["web"]);
        assert!(harvest.report.is_empty());
    }
}
