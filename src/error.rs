//! Error handling for the harvest pipeline
//!
//! Only transport, configuration and output failures surface as errors.
//! Malformed records are recovered by fallback decoding and unresolved
//! relations are counted in a [`LinkReport`](crate::link::LinkReport), so
//! neither has a variant here.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Main error type for harvesting, configuration and rendering
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("APIC returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("controller error: {0}")]
    Controller(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("harvest cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render error: {0}")]
    Render(String),
}

impl HarvestError {
    /// Errors raised while talking to the controller (network, HTTP status,
    /// login, controller-side error records, fetch timeouts).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Status { .. }
                | Self::Auth(_)
                | Self::Controller(_)
                | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(HarvestError::Auth("bad password".into()).is_transport());
        assert!(HarvestError::Timeout {
            operation: "subtree uni/tn-T".into(),
            after_ms: 30_000
        }
        .is_transport());
        assert!(!HarvestError::Cancelled.is_transport());
        assert!(!HarvestError::Config("missing apic".into()).is_transport());
    }

    #[test]
    fn test_display_messages() {
        let err = HarvestError::Status {
            status: 400,
            url: "https://apic/api/class/fvTenant.json".into(),
            body: "bad request".into(),
        };
        assert_eq!(
            err.to_string(),
            "APIC returned 400 for https://apic/api/class/fvTenant.json: bad request"
        );
        assert_eq!(HarvestError::Cancelled.to_string(), "harvest cancelled");
    }
}
