//! Output writers
//!
//! - [`snapshot`]: the whole document as `reports/summary.json`
//! - [`markdown`]: a human-readable report, one page per tenant

pub mod markdown;
pub mod snapshot;

pub use markdown::MarkdownRenderer;
pub use snapshot::write_snapshot;
