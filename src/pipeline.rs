//! Tenant sweep
//!
//! [`Harvester::run`] discovers tenants, fetches each tenant's subtree once,
//! and runs every enabled section over that cached record set. Sections
//! fail independently: a failed fetch is recorded against the sections that
//! needed it and the sweep moves on. Cancellation stops the sweep between
//! fetches and returns what was harvested so far.

use crate::apic::ObjectSource;
use crate::config::SectionsConfig;
use crate::dn::Dn;
use crate::document::{FabricDocument, TenantDocument};
use crate::error::{HarvestError, Result};
use crate::harvest::tenants::{self, Tenant};
use crate::harvest::vmm::{self, VmmDomainRef};
use crate::harvest::{
    bds, contracts, epgs, esg, l2out, l3out, service_graphs, vrfs, Harvest, Section,
};
use crate::link::LinkReport;
use crate::mo::{flatten, ClassTag, ObjectRecord};
use crate::normalize::sorted_unique;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default per-fetch deadline.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Harvester<S> {
    source: S,
    sections: SectionsConfig,
    fetch_timeout: Duration,
    cancel: CancellationToken,
}

impl<S: ObjectSource> Harvester<S> {
    pub fn new(source: S, sections: SectionsConfig) -> Self {
        Self {
            source,
            sections,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the sweep when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sections(&self) -> &SectionsConfig {
        &self.sections
    }

    /// Harvest every selected tenant.
    ///
    /// Only tenant discovery can fail the whole run. Cancellation is not an
    /// error: the document comes back with `interrupted` set.
    pub async fn run(&self) -> Result<FabricDocument> {
        let mut document = FabricDocument::default();

        let tenants = match self.discover().await {
            Ok(tenants) => tenants,
            Err(HarvestError::Cancelled) => {
                tracing::warn!("Harvest cancelled during tenant discovery");
                document.interrupted = true;
                return Ok(document);
            }
            Err(err) => return Err(err),
        };
        tracing::info!(
            tenants = tenants.len(),
            sections = ?self.sections.enabled(),
            "Starting tenant sweep"
        );

        for tenant in &tenants {
            if self.cancel.is_cancelled() {
                document.interrupted = true;
                break;
            }
            let entry = self.harvest_tenant(tenant).await;
            document.tenants.push(entry);
        }
        if self.cancel.is_cancelled() {
            document.interrupted = true;
        }

        if document.interrupted {
            tracing::warn!(
                harvested = document.tenants.len(),
                discovered = tenants.len(),
                "Harvest interrupted"
            );
        } else {
            tracing::info!(tenants = document.tenants.len(), "Harvest complete");
        }
        Ok(document)
    }

    pub async fn discover(&self) -> Result<Vec<Tenant>> {
        let records = self
            .guarded("class fvTenant", self.source.class(&ClassTag::FvTenant))
            .await?;
        Ok(tenants::discover(
            &records,
            self.sections.include_system_tenants,
            &self.sections.only_tenants,
        ))
    }

    /// Run every enabled section for one tenant. Never fails; failures land
    /// in the entry's diagnostics.
    pub async fn harvest_tenant(&self, tenant: &Tenant) -> TenantDocument {
        let mut entry = TenantDocument::new(tenant);
        let sections = self.sections.enabled();
        if sections.is_empty() {
            return entry;
        }

        let operation = format!("subtree {}", tenant.dn);
        let records = match self.guarded(&operation, self.source.subtree(&tenant.dn)).await {
            Ok(records) => flatten(records),
            Err(err) => {
                tracing::warn!(
                    tenant = %tenant.name,
                    transport = err.is_transport(),
                    error = %err,
                    "Tenant fetch failed"
                );
                for section in sections {
                    entry.record_failure(section, &err);
                }
                return entry;
            }
        };
        tracing::debug!(tenant = %tenant.name, records = records.len(), "Tenant subtree cached");

        for section in sections {
            tracing::debug!(
                tenant = %tenant.name,
                section = %section,
                primary = section.primary_count(&records),
                "Harvesting section"
            );
            match section {
                Section::Vrfs => entry.vrfs = entry.absorb(section, vrfs::harvest(&records)),
                Section::Bds => entry.bds = entry.absorb(section, bds::harvest(&records)),
                Section::Epgs => entry.epgs = entry.absorb(section, epgs::harvest(&records)),
                Section::Contracts => {
                    entry.contracts = entry.absorb(section, contracts::harvest(&records))
                }
                Section::L3Outs => entry.l3outs = entry.absorb(section, l3out::harvest(&records)),
                Section::L2Outs => entry.l2outs = entry.absorb(section, l2out::harvest(&records)),
                Section::ServiceGraphs => {
                    entry.service_graphs = entry.absorb(section, service_graphs::harvest(&records))
                }
                Section::Esgs => entry.esgs = entry.absorb(section, esg::harvest(&records)),
                Section::Vmm => match self.harvest_vmm(&records).await {
                    Ok((harvest, failures)) => {
                        for (domain, err) in &failures {
                            tracing::warn!(
                                tenant = %tenant.name,
                                domain = %domain,
                                error = %err,
                                "VMM domain fetch failed"
                            );
                            entry.record_domain_failure(domain, err);
                        }
                        entry.vmm = entry.absorb(section, harvest);
                    }
                    Err(err) => {
                        tracing::warn!(
                            tenant = %tenant.name,
                            section = %section,
                            error = %err,
                            "Section failed"
                        );
                        entry.record_failure(section, &err);
                    }
                },
            }
        }

        link_l3outs_to_vrfs(&mut entry);
        for (section, report) in &entry.diagnostics.unresolved {
            tracing::debug!(
                tenant = %tenant.name,
                section = %section,
                unresolved = report.total(),
                "Unresolved relations"
            );
        }
        tracing::info!(
            tenant = %tenant.name,
            sections = entry.sections().len(),
            failed = entry.diagnostics.failed_sections.len(),
            "Tenant harvested"
        );
        entry
    }

    /// Referenced VMM domains, each enriched from its own subtree.
    ///
    /// A domain whose fetch fails is kept as referenced and returned with its
    /// error. Only cancellation fails the whole section.
    async fn harvest_vmm(
        &self,
        records: &[ObjectRecord],
    ) -> Result<(Harvest<VmmDomainRef>, Vec<(Dn, HarvestError)>)> {
        let mut items = Vec::new();
        let mut report = LinkReport::new();
        let mut failures = Vec::new();
        for reference in vmm::references(records) {
            let operation = format!("subtree {}", reference.dn);
            match self
                .guarded(&operation, self.source.subtree(&reference.dn))
                .await
            {
                Ok(domain) => {
                    let enriched = vmm::enrich(reference, &flatten(domain));
                    items.extend(enriched.items);
                    report.merge(enriched.report);
                }
                Err(HarvestError::Cancelled) => return Err(HarvestError::Cancelled),
                Err(err) => {
                    failures.push((reference.dn.clone(), err));
                    items.push(reference);
                }
            }
        }
        Ok((Harvest::new(items, report), failures))
    }

    /// Bound a fetch by the per-fetch timeout and the cancellation token.
    async fn guarded<T>(&self, operation: &str, fetch: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(HarvestError::Cancelled),
            outcome = tokio::time::timeout(self.fetch_timeout, fetch) => match outcome {
                Ok(result) => result,
                Err(_) => Err(HarvestError::Timeout {
                    operation: operation.to_string(),
                    after_ms: self.fetch_timeout.as_millis() as u64,
                }),
            },
        }
    }
}

/// Fill each VRF's `l3outs` from the L3Outs bound to it by name. Needs both
/// sections in the entry; otherwise the VRFs keep empty lists.
pub fn link_l3outs_to_vrfs(entry: &mut TenantDocument) {
    let (Some(vrfs), Some(outs)) = (entry.vrfs.as_mut(), entry.l3outs.as_ref()) else {
        return;
    };
    for vrf in vrfs.iter_mut() {
        let names = outs
            .iter()
            .filter(|out| out.vrf.as_deref() == Some(vrf.name.as_str()))
            .map(|out| out.name.clone())
            .collect();
        vrf.l3outs = sorted_unique(names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apic::MemorySource;
    use crate::harvest::l3out::L3Out;
    use crate::harvest::vrfs::Vrf;

    #[test]
    fn test_link_l3outs_to_vrfs() {
        let tenant = Tenant {
            name: "T".to_string(),
            dn: Dn::new("uni/tn-T"),
            descr: None,
        };
        let mut entry = TenantDocument::new(&tenant);
        entry.vrfs = Some(vec![
            Vrf {
                name: "Prod".to_string(),
                ..Vrf::default()
            },
            Vrf {
                name: "Dev".to_string(),
                ..Vrf::default()
            },
        ]);
        entry.l3outs = Some(vec![
            L3Out {
                name: "wan".to_string(),
                vrf: Some("Prod".to_string()),
                ..L3Out::default()
            },
            L3Out {
                name: "inet".to_string(),
                vrf: Some("Prod".to_string()),
                ..L3Out::default()
            },
            L3Out {
                name: "orphan".to_string(),
                ..L3Out::default()
            },
        ]);

        link_l3outs_to_vrfs(&mut entry);
        let vrfs = entry.vrfs.unwrap();
        assert_eq!(vrfs[0].l3outs, vec!["inet", "wan"]);
        assert!(vrfs[1].l3outs.is_empty());
    }

    #[tokio::test]
    async fn test_no_sections_skips_subtree_fetch() {
        let source = MemorySource::new(vec![
            ObjectRecord::new("fvTenant", "uni/tn-T").with_attr("name", "T")
        ]);
        let harvester = Harvester::new(source, SectionsConfig::default());

        let document = harvester.run().await.unwrap();
        assert_eq!(document.tenants.len(), 1);
        assert!(document.tenants[0].sections().is_empty());
        assert_eq!(
            harvester.source().subtree_fetches(&Dn::new("uni/tn-T")).await,
            0
        );
    }

    #[tokio::test]
    async fn test_discovery_failure_is_an_error() {
        struct Down;

        #[async_trait::async_trait]
        impl ObjectSource for Down {
            async fn subtree(&self, _dn: &Dn) -> Result<Vec<ObjectRecord>> {
                Err(HarvestError::Auth("expired".into()))
            }
            async fn class(&self, _class: &ClassTag) -> Result<Vec<ObjectRecord>> {
                Err(HarvestError::Auth("expired".into()))
            }
        }

        let harvester = Harvester::new(Down, SectionsConfig::all());
        assert!(matches!(
            harvester.run().await,
            Err(HarvestError::Auth(_))
        ));
    }
}
