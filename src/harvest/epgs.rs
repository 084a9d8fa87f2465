//! Application EPGs (`fvAEPg`)
//!
//! Relations are owned by path prefix. Two application profiles may both
//! contain an EPG called `Web`; matching on the name alone would merge them.

use super::Harvest;
use crate::classify::{Entity, Registry};
use crate::dn::Dn;
use crate::link::{attach, child_of, decode, Linker, PathBinding, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{sorted_unique, Normalize};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Epg {
    pub name: String,
    pub dn: Dn,
    pub ap: String,
    pub pc_enf_pref: Option<String>,
    pub pref_gr_memb: Option<String>,
    pub bd: Option<String>,
    pub domains: Vec<String>,
    pub static_paths: Vec<PathBinding>,
    pub provided_contracts: Vec<String>,
    pub consumed_contracts: Vec<String>,
}

impl Entity for Epg {
    const CLASS: ClassTag = ClassTag::FvAEPg;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("epg")),
            dn: record.dn.clone(),
            ap: record.dn.name_after("ap"),
            pc_enf_pref: record.attr_owned("pcEnfPref"),
            pref_gr_memb: record.attr_owned("prefGrMemb"),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Normalize for Epg {
    fn normalize(mut self) -> Self {
        self.domains = sorted_unique(self.domains);
        self.static_paths = sorted_unique(self.static_paths);
        self.provided_contracts = sorted_unique(self.provided_contracts);
        self.consumed_contracts = sorted_unique(self.consumed_contracts);
        self
    }
}

pub fn harvest(records: &[ObjectRecord]) -> Harvest<Epg> {
    let mut epgs = Registry::<Epg>::classify(records);
    let mut linker = Linker::new(records);

    let bds = linker.bind(
        &epgs,
        child_of(ClassTag::FvRsBd, "epg"),
        Resolve::Parent,
        decode::bd_name,
    );
    let domains = linker.bind(
        &epgs,
        child_of(ClassTag::FvRsDomAtt, "epg"),
        Resolve::Parent,
        |r| r.target().map(|target| decode::domain_label(&target)),
    );
    let paths = linker.bind(
        &epgs,
        child_of(ClassTag::FvRsPathAtt, "epg"),
        Resolve::Parent,
        PathBinding::from_record,
    );
    let provided = linker.bind(
        &epgs,
        child_of(ClassTag::FvRsProv, "epg"),
        Resolve::Parent,
        decode::contract_name,
    );
    let consumed = linker.bind(
        &epgs,
        child_of(ClassTag::FvRsCons, "epg"),
        Resolve::Parent,
        decode::contract_name,
    );

    attach(&mut epgs, bds, |epg, bd| epg.bd = Some(bd));
    attach(&mut epgs, domains, |epg, domain| epg.domains.push(domain));
    attach(&mut epgs, paths, |epg, path| epg.static_paths.push(path));
    attach(&mut epgs, provided, |epg, name| epg.provided_contracts.push(name));
    attach(&mut epgs, consumed, |epg, name| epg.consumed_contracts.push(name));

    let items = epgs
        .into_values()
        .into_iter()
        .map(Normalize::normalize)
        .collect();
    Harvest::new(items, linker.finish())
}
