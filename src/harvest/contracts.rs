//! Contracts (`vzBrCP`), their subjects, and who provides or consumes them

use super::Harvest;
use crate::classify::{Entity, Registry};
use crate::dn::Dn;
use crate::link::{attach, class, decode, Linker, Resolve};
use crate::mo::{ClassTag, ObjectRecord};
use crate::normalize::{normalize_all, sorted_unique, Blank, Normalize};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contract {
    pub name: String,
    pub dn: Dn,
    pub scope: Option<String>,
    pub subjects: Vec<Subject>,
    /// Endpoint labels (`ap/epg`, `ap/esg`, `l3out/instp`, `vzAny/vrf`).
    pub providers: Vec<String>,
    pub consumers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Subject {
    pub name: String,
    pub filters: Vec<String>,
    pub service_graph: Option<String>,
}

impl Entity for Contract {
    const CLASS: ClassTag = ClassTag::VzBrCP;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("brc")),
            dn: record.dn.clone(),
            scope: record.attr_owned("scope"),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Subject {
    const CLASS: ClassTag = ClassTag::VzSubj;

    fn from_record(record: &ObjectRecord) -> Self {
        Self {
            name: record
                .attr_owned("name")
                .unwrap_or_else(|| record.dn.name_after("subj")),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Blank for Subject {
    fn is_blank(&self) -> bool {
        self.name.is_blank()
    }
}

impl Normalize for Subject {
    fn normalize(mut self) -> Self {
        self.filters = sorted_unique(self.filters);
        self
    }
}

impl Normalize for Contract {
    fn normalize(mut self) -> Self {
        self.subjects = normalize_all(self.subjects);
        self.providers = sorted_unique(self.providers);
        self.consumers = sorted_unique(self.consumers);
        self
    }
}

fn provides(record: &ObjectRecord) -> bool {
    matches!(record.class, ClassTag::FvRsProv | ClassTag::VzRsAnyToProv)
}

fn consumes(record: &ObjectRecord) -> bool {
    matches!(record.class, ClassTag::FvRsCons | ClassTag::VzRsAnyToCons)
}

/// Label of the EPG, ESG, external EPG or vzAny holding a contract relation.
fn endpoint(record: &ObjectRecord) -> Option<String> {
    record.dn.parent().map(|parent| decode::endpoint_label(&parent))
}

pub fn harvest(records: &[ObjectRecord]) -> Harvest<Contract> {
    let mut contracts = Registry::<Contract>::classify(records);
    let mut subjects = Registry::<Subject>::classify(records);
    let mut linker = Linker::new(records);

    // Filters may sit directly under the subject or under its in/out terms.
    let filters = linker.bind(
        &subjects,
        class(ClassTag::VzRsSubjFiltAtt),
        Resolve::Parent,
        decode::filter_name,
    );
    let graphs = linker.bind(
        &subjects,
        class(ClassTag::VzRsSubjGraphAtt),
        Resolve::Parent,
        decode::graph_name,
    );
    attach(&mut subjects, filters, |subject, name| subject.filters.push(name));
    attach(&mut subjects, graphs, |subject, name| subject.service_graph = Some(name));

    let target = Resolve::Target {
        name_attr: "tnVzBrCPName",
    };
    let providers = linker.bind(&contracts, provides, target, endpoint);
    let consumers = linker.bind(&contracts, consumes, target, endpoint);
    let nested = linker.nest(&contracts, subjects);

    attach(&mut contracts, providers, |contract, label| contract.providers.push(label));
    attach(&mut contracts, consumers, |contract, label| contract.consumers.push(label));
    attach(&mut contracts, nested, |contract, subject| contract.subjects.push(subject));

    let items = contracts
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
            ObjectRecord::new("vzBrCP", "uni/tn-T/brc-web")
                .with_attr("name", "web")
                .with_attr("scope", "context"),
            ObjectRecord::new("vzSubj", "uni/tn-T/brc-web/subj-http").with_attr("name", "http"),
            ObjectRecord::new("vzRsSubjFiltAtt", "uni/tn-T/brc-web/subj-http/rssubjFiltAtt-tcp80")
                .with_attr("tDn", "uni/tn-T/flt-tcp80"),
            ObjectRecord::new(
                "vzRsSubjFiltAtt",
                "uni/tn-T/brc-web/subj-http/intmnl/rsfiltAtt-tcp443",
            )
            .with_attr("tnVzFilterName", "tcp443"),
            ObjectRecord::new("vzRsSubjGraphAtt", "uni/tn-T/brc-web/subj-http/rsSubjGraphAtt")
                .with_attr("tnVnsAbsGraphName", "FW-Graph"),
            ObjectRecord::new("fvRsProv", "uni/tn-T/ap-App/epg-Web/rsprov-web")
                .with_attr("tDn", "uni/tn-T/brc-web"),
            ObjectRecord::new("fvRsProv", "uni/tn-T/ap-App/esg-Sec/rsprov-web")
                .with_attr("tnVzBrCPName", "web"),
            ObjectRecord::new("fvRsCons", "uni/tn-T/out-Core/instP-Ext/rscons-web")
                .with_attr("tDn", "uni/tn-T/brc-web"),
            ObjectRecord::new("vzRsAnyToCons", "uni/tn-T/ctx-Prod/any/rsanyToCons-web")
                .with_attr("tDn", "uni/tn-T/brc-web"),
            ObjectRecord::new("fvRsProv", "uni/tn-T/ap-App/epg-Db/rsprov-unknown")
                .with_attr("tDn", "uni/tn-common/brc-unknown"),
        ]
    }

    #[test]
    fn test_contract_subjects_and_filters() {
        let harvest = harvest(&fixture());
        assert_eq!(harvest.items.len(), 1);

        let web = &harvest.items[0];
        assert_eq!(web.scope.as_deref(), Some("context"));
        assert_eq!(web.subjects.len(), 1);
        assert_eq!(web.subjects[0].filters, vec!["tcp443", "tcp80"]);
        assert_eq!(web.subjects[0].service_graph.as_deref(), Some("FW-Graph"));
    }

    #[test]
    fn test_providers_and_consumers() {
        let harvest = harvest(&fixture());
        let web = &harvest.items[0];
        assert_eq!(web.providers, vec!["App/Sec", "App/Web"]);
        assert_eq!(web.consumers, vec!["Core/Ext", "vzAny/Prod"]);
    }

    #[test]
    fn test_unknown_provider_contract_dropped() {
        let harvest = harvest(&fixture());
        assert!(harvest
            .items
            .iter()
            .all(|c| !c.providers.iter().any(|p| p == "App/Db")));
        assert_eq!(harvest.report.count(&ClassTag::FvRsProv), 1);
    }

    #[test]
    fn test_foreign_target_ignores_matching_name() {
        // A common-tenant contract that shares its name with a local one.
        let records = vec![
            ObjectRecord::new("vzBrCP", "uni/tn-T/brc-web").with_attr("name", "web"),
            ObjectRecord::new("fvRsProv", "uni/tn-T/ap-A/epg-E/rsprov-web")
                .with_attr("tDn", "uni/tn-common/brc-web")
                .with_attr("tnVzBrCPName", "web"),
            ObjectRecord::new("fvRsCons", "uni/tn-T/ap-A/epg-F/rscons-web")
                .with_attr("tnVzBrCPName", "web"),
            ObjectRecord::new("fvRsCons", "uni/tn-T/l2out-Legacy/instP-E/rscons-web")
                .with_attr("tDn", "uni/tn-T/brc-web"),
        ];
        let harvest = harvest(&records);

        let web = &harvest.items[0];
        assert!(web.providers.is_empty());
        assert_eq!(web.consumers, vec!["A/F", "Legacy/E"]);
        assert_eq!(harvest.report.count(&ClassTag::FvRsProv), 1);
        assert_eq!(harvest.report.count(&ClassTag::FvRsCons), 0);
    }
}
