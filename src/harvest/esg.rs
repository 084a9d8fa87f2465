//! Endpoint security groups (`fvESg`) and their selectors

use super::Harvest;
use crate::classify::{Entity, Registry};
use crate::dn::Dn;
use crate::link::{attach, child_of, class, decode, Linker, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{sorted_unique, Normalize};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointSecurityGroup {
    pub name: String,
    pub dn: Dn,
    pub pc_tag: Option<String>,
    pub pc_enf_pref: Option<String>,
    pub provided_contracts: Vec<String>,
    pub consumed_contracts: Vec<String>,
    /// `tenant/ap/epg` of each selected EPG.
    pub epg_selectors: Vec<String>,
    pub ip_selectors: Vec<String>,
    pub tag_selectors: Vec<String>,
}

impl Entity for EndpointSecurityGroup {
    const CLASS: ClassTag = ClassTag::FvESg;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("esg")),
            dn: record.dn.clone(),
            pc_tag: record.attr_owned("pcTag"),
            pc_enf_pref: record.attr_owned("pcEnfPref"),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Normalize for EndpointSecurityGroup {
    fn normalize(mut self) -> Self {
        self.provided_contracts = sorted_unique(self.provided_contracts);
        self.consumed_contracts = sorted_unique(self.consumed_contracts);
        self.epg_selectors = sorted_unique(self.epg_selectors);
        self.ip_selectors = sorted_unique(self.ip_selectors);
        self.tag_selectors = sorted_unique(self.tag_selectors);
        self
    }
}

/// EP selectors (`fvEPSelector`, `fvAEPSelector`) matching `match_class`.
fn ep_selector(record: &ObjectRecord, match_class: &str) -> bool {
    matches!(record.class, ClassTag::FvEPSelector | ClassTag::FvAEPSelector)
        && record.attr("matchClass") == Some(match_class)
}

fn ip_selector_class(record: &ObjectRecord) -> bool {
    matches!(record.class, ClassTag::IpSelector(_)) && record.dn.has_marker("esg")
}

pub fn harvest(records: &[ObjectRecord]) -> Harvest<EndpointSecurityGroup> {
    let mut esgs = Registry::<EndpointSecurityGroup>::classify(records);
    let mut linker = Linker::new(records);

    let provided = linker.bind(
        &esgs,
        child_of(ClassTag::FvRsProv, "esg"),
        Resolve::Parent,
        decode::contract_name,
    );
    let consumed = linker.bind(
        &esgs,
        child_of(ClassTag::FvRsCons, "esg"),
        Resolve::Parent,
        decode::contract_name,
    );
    let epg_selectors = linker.bind(
        &esgs,
        class(ClassTag::FvEPgSelector),
        Resolve::Parent,
        |r| Some(decode::epg_selector(r)),
    );
    let ep_epg_selectors = linker.bind(
        &esgs,
        |r| ep_selector(r, "fvEPg"),
        Resolve::Parent,
        |r| Some(decode::epg_selector(r)),
    );
    let ep_ip_selectors = linker.bind(
        &esgs,
        |r| ep_selector(r, "fvIp"),
        Resolve::Parent,
        |r| Some(decode::ip_selector(r)),
    );
    let ip_selectors = linker.bind(
        &esgs,
        ip_selector_class,
        Resolve::Parent,
        |r| Some(decode::ip_selector(r)),
    );
    let tag_selectors = linker.bind(
        &esgs,
        class(ClassTag::FvTagSelector),
        Resolve::Parent,
        |r| Some(decode::tag_selector(r)),
    );

    attach(&mut esgs, provided, |esg, name| esg.provided_contracts.push(name));
    attach(&mut esgs, consumed, |esg, name| esg.consumed_contracts.push(name));
    for bindings in [epg_selectors, ep_epg_selectors] {
        attach(&mut esgs, bindings, |esg, epg| esg.epg_selectors.push(epg));
    }
    for bindings in [ep_ip_selectors, ip_selectors] {
        attach(&mut esgs, bindings, |esg, ip| esg.ip_selectors.push(ip));
    }
    attach(&mut esgs, tag_selectors, |esg, tag| esg.tag_selectors.push(tag));

    let items = esgs
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
        let esg = "uni/tn-T/ap-App/esg-Web";
        vec![
            ObjectRecord::new("fvESg", esg)
                .with_attr("name", "Web")
                .with_attr("pcTag", "16386")
                .with_attr("pcEnfPref", "enforced"),
            ObjectRecord::new("fvRsProv", format!("{esg}/rsprov-web"))
                .with_attr("tDn", "uni/tn-T/brc-web"),
            ObjectRecord::new("fvRsCons", format!("{esg}/rscons-dns"))
                .with_attr("tnVzBrCPName", "dns"),
            ObjectRecord::new(
                "fvEPgSelector",
                format!("{esg}/epgselector-[uni/tn-T/ap-App/epg-Frontend]"),
            ),
            ObjectRecord::new("fvEPSelector", format!("{esg}/epselector-1"))
                .with_attr("matchClass", "fvEPg")
                .with_attr("matchEpgDn", "uni/tn-T/ap-Legacy/epg-Old"),
            ObjectRecord::new("fvEPSelector", format!("{esg}/epselector-2"))
                .with_attr("matchClass", "fvIp")
                .with_attr("matchExpression", "ip=='10.100.109.0/24'"),
            ObjectRecord::new("fvEsgIpSelector", format!("{esg}/ipsel-1"))
                .with_attr("ip", "10.1.0.0/16"),
            ObjectRecord::new("fvTagSelector", format!("{esg}/tagselector-env"))
                .with_attr("key", "env")
                .with_attr("operator", "equals")
                .with_attr("value", "prod"),
        ]
    }

    #[test]
    fn test_esg_selectors() {
        let harvest = harvest(&fixture());
        assert_eq!(harvest.items.len(), 1);

        let esg = &harvest.items[0];
        assert_eq!(esg.pc_tag.as_deref(), Some("16386"));
        assert_eq!(esg.provided_contracts, vec!["web"]);
        assert_eq!(esg.consumed_contracts, vec!["dns"]);
        assert_eq!(esg.epg_selectors, vec!["T/App/Frontend", "T/Legacy/Old"]);
        assert_eq!(esg.ip_selectors, vec!["10.1.0.0/16", "10.100.109.0/24"]);
        assert_eq!(esg.tag_selectors, vec!["env equals prod"]);
        assert!(harvest.report.is_empty());
    }
}
