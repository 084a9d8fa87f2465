//! Bridged external connectivity (`l2extOut`)

use super::Harvest;
use crate::classify::{Entity, Registry};
use crate::dn::Dn;
use crate::link::{attach, child_of, class, decode, Linker, PathBinding, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{sorted_unique, Blank, Normalize};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct L2Out {
    pub name: String,
    pub dn: Dn,
    pub bd: Option<String>,
    /// VLAN from the bridge-domain binding's encapsulation.
    pub vlan: Option<u16>,
    pub domains: Vec<String>,
    pub paths: Vec<PathBinding>,
    pub instps: Vec<L2ExternalEpg>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct L2ExternalEpg {
    pub name: String,
}

impl Blank for L2ExternalEpg {
    fn is_blank(&self) -> bool {
        self.name.is_blank()
    }
}

impl Entity for L2Out {
    const CLASS: ClassTag = ClassTag::L2extOut;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("l2out")),
            dn: record.dn.clone(),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Normalize for L2Out {
    fn normalize(mut self) -> Self {
        self.domains = sorted_unique(self.domains);
        self.paths = sorted_unique(self.paths);
        self.instps = sorted_unique(self.instps);
        self
    }
}

struct BdBinding {
    name: String,
    vlan: Option<u16>,
}

fn bd_binding(record: &ObjectRecord) -> Option<BdBinding> {
    Some(BdBinding {
        name: decode::bd_name(record)?,
        vlan: record.attr("encap").and_then(decode::parse_vlan),
    })
}

pub fn harvest(records: &[ObjectRecord]) -> Harvest<L2Out> {
    let mut outs = Registry::<L2Out>::classify(records);
    let mut linker = Linker::new(records);

    let bds = linker.bind(
        &outs,
        child_of(ClassTag::L2extRsEBd, "l2out"),
        Resolve::Parent,
        bd_binding,
    );
    let domains = linker.bind(
        &outs,
        child_of(ClassTag::L2extRsL2DomAtt, "l2out"),
        Resolve::Parent,
        |r| r.target().map(|target| decode::domain_label(&target)),
    );
    // Interface paths sit under lnodep-*/lifp-*.
    let paths = linker.bind(
        &outs,
        class(ClassTag::L2extRsPathL2OutAtt),
        Resolve::Parent,
        PathBinding::from_record,
    );
    let instps = linker.bind(
        &outs,
        class(ClassTag::L2extInstP),
        Resolve::Parent,
        |r| {
            Some(L2ExternalEpg {
                name: r
                    .attr_owned("name")
                    .unwrap_or_else(|| r.dn.name_after("instP")),
            })
        },
    );

    attach(&mut outs, bds, |out, bd| {
        out.bd = Some(bd.name);
        out.vlan = bd.vlan;
    });
    attach(&mut outs, domains, |out, domain| out.domains.push(domain));
    attach(&mut outs, paths, |out, path| out.paths.push(path));
    attach(&mut outs, instps, |out, instp| out.instps.push(instp));

    let items = outs
        .into_values()
        .into_iter()
        .map(|mut out| {
            // Paths carry no encap of their own; they use the BD binding's.
            for path in &mut out.paths {
                path.vlan = path.vlan.or(out.vlan);
            }
            out.normalize()
        })
        .collect();
    Harvest::new(items, linker.finish())
}
