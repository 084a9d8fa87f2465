//! End-to-end tenant sweeps against an in-memory controller

use aci_docgen::apic::memory::Fetch;
use aci_docgen::apic::MemorySource;
use aci_docgen::config::SectionsConfig;
use aci_docgen::dn::Dn;
use aci_docgen::harvest::Section;
use aci_docgen::link::BindingKind;
use aci_docgen::mo::{flatten, ClassTag, ObjectRecord};
use aci_docgen::pipeline::Harvester;
use aci_docgen::FabricDocument;
use proptest::prelude::*;
use serde_json::Value;
use std::time::Duration;

const FABRIC: &str = include_str!("fixtures/fabric.json");
const DOMAIN_DN: &str = "uni/vmmp-VMware/dom-DC1";

fn fabric() -> MemorySource {
    let response: Value = serde_json::from_str(FABRIC).unwrap();
    let items = response["imdata"].as_array().unwrap();
    MemorySource::from_imdata(items)
}

fn every_section() -> SectionsConfig {
    SectionsConfig {
        include_system_tenants: false,
        ..SectionsConfig::all()
    }
}

#[tokio::test]
async fn test_full_sweep() {
    let harvester = Harvester::new(fabric(), every_section());
    let document = harvester.run().await.unwrap();

    assert!(!document.interrupted);
    let names: Vec<&str> = document.tenants.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Prod", "Dev"]);

    let prod = document.tenant("Prod").unwrap();
    assert_eq!(prod.descr.as_deref(), Some("production"));
    assert_eq!(prod.sections(), Section::ALL.to_vec());

    let vrfs = prod.vrfs.as_ref().unwrap();
    assert_eq!(vrfs.len(), 1);
    assert_eq!(vrfs[0].health.as_deref(), Some("100"));
    assert_eq!(vrfs[0].pc_tag.as_deref(), Some("49153"));
    assert_eq!(vrfs[0].bds, vec!["Web"]);
    assert_eq!(vrfs[0].bd_count, 1);
    assert_eq!(vrfs[0].l3outs, vec!["wan"]);

    let bds = prod.bds.as_ref().unwrap();
    assert_eq!(bds[0].vrf.as_deref(), Some("Prod"));
    assert_eq!(bds[0].subnets[0].ip, "10.0.0.1/24");

    let epgs = prod.epgs.as_ref().unwrap();
    let web = epgs.iter().find(|epg| epg.name == "Web").unwrap();
    assert_eq!(web.ap, "App");
    assert_eq!(web.bd.as_deref(), Some("Web"));
    assert_eq!(web.domains, vec!["VMware:DC1"]);
    assert_eq!(web.provided_contracts, vec!["web"]);
    assert_eq!(web.static_paths.len(), 1);
    assert_eq!(web.static_paths[0].kind, BindingKind::Vpc);
    assert_eq!(web.static_paths[0].leafs, vec!["101", "102"]);
    assert_eq!(web.static_paths[0].port, "PC-ESX");
    assert_eq!(web.static_paths[0].vlan, Some(110));

    let contracts = prod.contracts.as_ref().unwrap();
    assert_eq!(contracts[0].name, "web");
    assert_eq!(contracts[0].subjects[0].filters, vec!["tcp80"]);
    assert_eq!(contracts[0].subjects[0].service_graph.as_deref(), Some("FW"));
    assert_eq!(contracts[0].providers, vec!["App/Sec", "App/Web"]);
    assert_eq!(contracts[0].consumers, vec!["App/Db", "Legacy/Ext", "wan/Ext"]);

    let l3outs = prod.l3outs.as_ref().unwrap();
    assert_eq!(l3outs[0].protocols, vec!["BGP"]);
    assert_eq!(l3outs[0].instps.len(), 1);
    assert_eq!(l3outs[0].instps[0].consumed_contracts, vec!["web"]);

    let l2outs = prod.l2outs.as_ref().unwrap();
    assert_eq!(l2outs.len(), 1);
    assert_eq!(l2outs[0].name, "Legacy");
    assert_eq!(l2outs[0].bd.as_deref(), Some("Web"));
    assert_eq!(l2outs[0].vlan, Some(300));
    assert_eq!(l2outs[0].domains, vec!["l2dom:LEGACY"]);
    assert_eq!(l2outs[0].instps[0].name, "Ext");

    let graphs = prod.service_graphs.as_ref().unwrap();
    assert_eq!(graphs.len(), 1);
    assert_eq!(graphs[0].name, "FW");
    assert_eq!(graphs[0].nodes[0].name, "N1");
    assert_eq!(graphs[0].nodes[0].connectors[0].name, "consumer");
    assert_eq!(graphs[0].connections[0].connectors, vec!["N1/consumer"]);
    assert_eq!(graphs[0].contracts, vec!["web"]);
    assert_eq!(graphs[0].device_contexts.len(), 1);
    assert_eq!(graphs[0].device_contexts[0].contract, "web");
    assert_eq!(graphs[0].device_contexts[0].device.as_deref(), Some("ASAv"));

    let esgs = prod.esgs.as_ref().unwrap();
    assert_eq!(esgs.len(), 1);
    assert_eq!(esgs[0].name, "Sec");
    assert_eq!(esgs[0].pc_tag.as_deref(), Some("16386"));
    assert_eq!(esgs[0].provided_contracts, vec!["web"]);
    assert_eq!(esgs[0].epg_selectors, vec!["Prod/App/Db"]);
    assert_eq!(esgs[0].ip_selectors, vec!["10.9.0.0/24"]);

    let vmm = prod.vmm.as_ref().unwrap();
    assert_eq!(vmm.len(), 1);
    assert_eq!(vmm[0].name, "DC1");
    assert_eq!(vmm[0].kind, "VMware");
    assert_eq!(vmm[0].mode.as_deref(), Some("default"));
    assert_eq!(vmm[0].controllers, vec!["vc01"]);
    assert_eq!(vmm[0].vlan_pools, vec!["VMM-Pool"]);
    assert_eq!(vmm[0].epgs, vec!["App/Web"]);

    assert!(prod.diagnostics.is_empty());

    let dev = document.tenant("Dev").unwrap();
    assert_eq!(dev.vrfs.as_ref().unwrap()[0].name, "Dev");
    assert!(dev.vmm.as_ref().unwrap().is_empty());
}

#[tokio::test]
async fn test_one_subtree_fetch_per_tenant() {
    let harvester = Harvester::new(fabric(), every_section());
    harvester.run().await.unwrap();

    let source = harvester.source();
    assert_eq!(source.subtree_fetches(&Dn::new("uni/tn-Prod")).await, 1);
    assert_eq!(source.subtree_fetches(&Dn::new("uni/tn-Dev")).await, 1);
    assert_eq!(source.subtree_fetches(&Dn::new("uni/tn-common")).await, 0);
    assert_eq!(
        source.fetches().await,
        vec![
            Fetch::Class(ClassTag::FvTenant),
            Fetch::Subtree(Dn::new("uni/tn-Prod")),
            Fetch::Subtree(Dn::new(DOMAIN_DN)),
            Fetch::Subtree(Dn::new("uni/tn-Dev")),
        ]
    );
}

#[tokio::test]
async fn test_tenant_failure_is_isolated() {
    let source = fabric().with_failure("uni/tn-Prod", "400: bad query");
    let document = Harvester::new(source, every_section()).run().await.unwrap();

    assert_eq!(document.tenants.len(), 2);
    let prod = document.tenant("Prod").unwrap();
    assert!(prod.vrfs.is_none());
    assert_eq!(prod.diagnostics.failed_sections.len(), Section::ALL.len());
    assert_eq!(
        prod.failed(Section::Epgs),
        Some("controller error: 400: bad query")
    );

    let dev = document.tenant("Dev").unwrap();
    assert!(dev.diagnostics.is_empty());
    assert_eq!(dev.vrfs.as_ref().unwrap().len(), 1);
}

#[tokio::test]
async fn test_vmm_domain_failure_keeps_other_domains() {
    let second = "uni/vmmp-VMware/dom-DC2";
    let source = fabric()
        .with_records(vec![ObjectRecord::new(
            "fvRsDomAtt",
            format!("uni/tn-Prod/ap-App/epg-Db/rsdomAtt-[{second}]"),
        )
        .with_attr("tDn", second)])
        .with_failure(second, "403: forbidden");
    let document = Harvester::new(source, every_section()).run().await.unwrap();

    let prod = document.tenant("Prod").unwrap();
    assert!(prod.diagnostics.failed_sections.is_empty());
    assert_eq!(
        prod.diagnostics.failed_domains.get(second).map(String::as_str),
        Some("controller error: 403: forbidden")
    );
    assert_eq!(document.failed_tenants().count(), 1);

    let vmm = prod.vmm.as_ref().unwrap();
    assert_eq!(vmm.len(), 2);
    assert_eq!(vmm[0].name, "DC1");
    assert_eq!(vmm[0].controllers, vec!["vc01"]);
    assert_eq!(vmm[1].name, "DC2");
    assert_eq!(vmm[1].epgs, vec!["App/Db"]);
    assert!(vmm[1].mode.is_none());
    assert!(vmm[1].controllers.is_empty());
    assert_eq!(prod.epgs.as_ref().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_tenant_times_out() {
    let source = fabric().with_delay("uni/tn-Dev", Duration::from_secs(60));
    let document = Harvester::new(source, every_section())
        .with_fetch_timeout(Duration::from_secs(5))
        .run()
        .await
        .unwrap();

    let dev = document.tenant("Dev").unwrap();
    assert_eq!(
        dev.failed(Section::Vrfs),
        Some("subtree uni/tn-Dev timed out after 5000ms")
    );
    assert!(document.tenant("Prod").unwrap().diagnostics.is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let harvester = Harvester::new(fabric(), every_section());
    harvester.cancellation_token().cancel();

    let document = harvester.run().await.unwrap();
    assert!(document.interrupted);
    assert!(document.tenants.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_sweep_keeps_partial_document() {
    let source = fabric().with_delay("uni/tn-Dev", Duration::from_secs(10));
    let harvester = Harvester::new(source, every_section());
    let cancel = harvester.cancellation_token();

    let (document, _) = tokio::join!(harvester.run(), async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });
    let document = document.unwrap();

    assert!(document.interrupted);
    assert!(document.tenant("Prod").unwrap().diagnostics.is_empty());
    let dev = document.tenant("Dev").unwrap();
    assert_eq!(dev.failed(Section::Vrfs), Some("harvest cancelled"));
}

#[tokio::test]
async fn test_only_tenants_filter() {
    let sections = SectionsConfig {
        tenants: true,
        only_tenants: vec!["Dev".to_string()],
        ..SectionsConfig::default()
    };
    let harvester = Harvester::new(fabric(), sections);
    let document = harvester.run().await.unwrap();

    assert_eq!(document.tenants.len(), 1);
    assert_eq!(document.tenants[0].name, "Dev");
    assert!(document.tenants[0].contracts.is_none());
    assert_eq!(
        harvester.source().subtree_fetches(&Dn::new("uni/tn-Prod")).await,
        0
    );
}

fn flat_fabric() -> Vec<ObjectRecord> {
    let response: Value = serde_json::from_str(FABRIC).unwrap();
    flatten(ObjectRecord::from_imdata(response["imdata"].as_array().unwrap()))
}

fn sweep(records: Vec<ObjectRecord>) -> FabricDocument {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime
        .block_on(Harvester::new(MemorySource::new(records), every_section()).run())
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // Shuffles records inside every tenant subtree, not just the tenant list.
    #[test]
    fn record_order_does_not_change_output(records in Just(flat_fabric()).prop_shuffle()) {
        let expected = sweep(flat_fabric());
        let shuffled = sweep(records);

        prop_assert_eq!(shuffled.tenants.len(), expected.tenants.len());
        // Discovery order follows the controller; compare per tenant.
        for tenant in &expected.tenants {
            let other = shuffled.tenant(&tenant.name).unwrap();
            prop_assert_eq!(
                serde_json::to_value(tenant).unwrap(),
                serde_json::to_value(other).unwrap()
            );
        }
    }
}
