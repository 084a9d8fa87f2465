//! In-memory object source
//!
//! Answers subtree and class queries from a flat record set, the way the
//! controller would. Failures and delays can be injected per DN to exercise
//! the pipeline's isolation, timeout and cancellation paths.

use super::ObjectSource;
use crate::dn::Dn;
use crate::error::{HarvestError, Result};
use crate::mo::{flatten, ClassTag, ObjectRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// One query answered by a [`MemorySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    Subtree(Dn),
    Class(ClassTag),
}

#[derive(Debug, Default)]
pub struct MemorySource {
    records: Vec<ObjectRecord>,
    failures: HashMap<Dn, String>,
    delays: HashMap<Dn, Duration>,
    fetches: Mutex<Vec<Fetch>>,
}

impl MemorySource {
    pub fn new(records: Vec<ObjectRecord>) -> Self {
        Self {
            records: flatten(records),
            ..Self::default()
        }
    }

    /// Build from a controller `imdata` array.
    pub fn from_imdata(items: &[serde_json::Value]) -> Self {
        Self::new(ObjectRecord::from_imdata(items))
    }

    pub fn with_records(mut self, records: Vec<ObjectRecord>) -> Self {
        self.records.extend(flatten(records));
        self
    }

    /// Subtree queries rooted at `dn` fail with a controller error.
    pub fn with_failure(mut self, dn: impl Into<Dn>, message: impl Into<String>) -> Self {
        self.failures.insert(dn.into(), message.into());
        self
    }

    /// Subtree queries rooted at `dn` answer after `delay`.
    pub fn with_delay(mut self, dn: impl Into<Dn>, delay: Duration) -> Self {
        self.delays.insert(dn.into(), delay);
        self
    }

    /// Queries answered so far, in order.
    pub async fn fetches(&self) -> Vec<Fetch> {
        self.fetches.lock().await.clone()
    }

    pub async fn subtree_fetches(&self, dn: &Dn) -> usize {
        self.fetches
            .lock()
            .await
            .iter()
            .filter(|fetch| matches!(fetch, Fetch::Subtree(fetched) if fetched == dn))
            .count()
    }
}

#[async_trait]
impl ObjectSource for MemorySource {
    async fn subtree(&self, dn: &Dn) -> Result<Vec<ObjectRecord>> {
        self.fetches.lock().await.push(Fetch::Subtree(dn.clone()));

        if let Some(delay) = self.delays.get(dn) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.failures.get(dn) {
            return Err(HarvestError::Controller(message.clone()));
        }

        Ok(self
            .records
            .iter()
            .filter(|record| &record.dn == dn || dn.is_strict_prefix_of(&record.dn))
            .cloned()
            .collect())
    }

    async fn class(&self, class: &ClassTag) -> Result<Vec<ObjectRecord>> {
        self.fetches.lock().await.push(Fetch::Class(class.clone()));

        Ok(self
            .records
            .iter()
            .filter(|record| &record.class == class)
            .cloned()
            .collect())
    }
}
