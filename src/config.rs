//! Harvest configuration
//!
//! - [`SectionsConfig`]: which sections to harvest, from `sections.yml`
//! - [`ApicConfig`]: controller address, credentials and timeouts

use crate::error::{HarvestError, Result};
use crate::harvest::Section;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Section toggles. Every toggle defaults to off; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SectionsConfig {
    /// VRFs, bridge domains and EPGs.
    pub tenants: bool,
    pub contracts: bool,
    pub l3out: bool,
    pub l2out: bool,
    pub service_graphs: bool,
    pub vmm: bool,
    pub esg: bool,
    /// Keep `common`, `infra` and `mgmt`.
    pub include_system_tenants: bool,
    /// When non-empty, harvest only these tenants.
    pub only_tenants: Vec<String>,
}

impl SectionsConfig {
    /// Load from a YAML file. An empty file enables nothing.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Everything on, system tenants included.
    pub fn all() -> Self {
        Self {
            tenants: true,
            contracts: true,
            l3out: true,
            l2out: true,
            service_graphs: true,
            vmm: true,
            esg: true,
            include_system_tenants: true,
            only_tenants: Vec::new(),
        }
    }

    /// Enabled sections in document order.
    pub fn enabled(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| self.is_enabled(*section))
            .collect()
    }

    pub fn is_enabled(&self, section: Section) -> bool {
        match section {
            Section::Vrfs | Section::Bds | Section::Epgs => self.tenants,
            Section::Contracts => self.contracts,
            Section::L3Outs => self.l3out,
            Section::L2Outs => self.l2out,
            Section::ServiceGraphs => self.service_graphs,
            Section::Vmm => self.vmm,
            Section::Esgs => self.esg,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Controller connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApicConfig {
    /// Base URL, e.g. `https://apic.example.net`; no trailing `/`.
    pub url: String,
    pub user: String,
    pub password: String,
    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,
    /// HTTP timeout and per-fetch timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApicConfig {
    pub fn new(url: &str, user: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| HarvestError::Config(format!("invalid APIC URL {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HarvestError::Config(format!(
                "APIC URL must be http(s), got {}",
                parsed.scheme()
            )));
        }
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
            insecure: false,
            timeout_secs: default_timeout_secs(),
        })
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Absolute URL for an API path such as `/api/class/fvTenant.json`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }
}
