//! Access to the APIC object tree
//!
//! [`ObjectSource`] is the only way the pipeline reads fabric state:
//! [`ApicClient`] answers from a live controller, [`MemorySource`] from
//! records held in memory.

pub mod client;
pub mod memory;
pub mod types;

pub use client::ApicClient;
pub use memory::MemorySource;

use crate::dn::Dn;
use crate::error::Result;
use crate::mo::{ClassTag, ObjectRecord};
use async_trait::async_trait;

/// Read-only view of the managed-object tree.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// `dn` and all of its descendants. A DN that does not exist yields no
    /// records.
    async fn subtree(&self, dn: &Dn) -> Result<Vec<ObjectRecord>>;

    /// Every object of `class`, without children.
    async fn class(&self, class: &ClassTag) -> Result<Vec<ObjectRecord>>;
}

#[async_trait]
impl<S: ObjectSource + ?Sized> ObjectSource for std::sync::Arc<S> {
    async fn subtree(&self, dn: &Dn) -> Result<Vec<ObjectRecord>> {
        (**self).subtree(dn).await
    }

    async fn class(&self, class: &ClassTag) -> Result<Vec<ObjectRecord>> {
        (**self).class(class).await
    }
}
