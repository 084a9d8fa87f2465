//! ACI fabric documentation
//!
//! Harvests tenant configuration from an APIC managed-object tree and
//! normalizes it into a per-tenant document.
//!
//! ## Flow
//! Object source -> tenant discovery -> one subtree fetch per tenant ->
//! section harvesters (classify, link, normalize) -> document -> JSON
//! snapshot and Markdown report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aci_docgen::apic::ApicClient;
//! use aci_docgen::config::{ApicConfig, SectionsConfig};
//! use aci_docgen::pipeline::Harvester;
//!
//! # async fn example() -> aci_docgen::error::Result<()> {
//! let config = ApicConfig::new("https://apic.example.net", "admin", "secret")?;
//! let client = ApicClient::connect(config).await?;
//! let document = Harvester::new(client, SectionsConfig::all()).run().await?;
//! println!("{} tenants", document.tenants.len());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Distinguished names and managed-object records
pub mod dn;
pub mod mo;

// Classification, relation linking and normalization
pub mod classify;
pub mod link;
pub mod normalize;

// Section harvesters and the document they fill
pub mod document;
pub mod harvest;

// Controller access, configuration and the tenant sweep
pub mod apic;
pub mod config;
pub mod pipeline;

// Output writers
pub mod render;

pub use document::{FabricDocument, TenantDocument};
pub use error::{HarvestError, Result};
pub use pipeline::Harvester;
