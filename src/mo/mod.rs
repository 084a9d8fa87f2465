//! Managed-object records
//!
//! - [`ClassTag`]: closed enum over the APIC classes the harvesters read
//! - [`ObjectRecord`]: one decoded `imdata` entry
//! - [`flatten`]: depth-first flattening of nested subtree responses

pub mod class;
pub mod record;

pub use class::ClassTag;
pub use record::{flatten, ObjectRecord};
