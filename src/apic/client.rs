//! APIC REST client
//!
//! Logs in once through `aaaLogin`; the controller answers with an
//! `APIC-cookie` session cookie which the client's cookie store replays on
//! every later query.

use super::types::{ImdataResponse, LoginRequest};
use super::ObjectSource;
use crate::config::ApicConfig;
use crate::dn::Dn;
use crate::error::{HarvestError, Result};
use crate::mo::{ClassTag, ObjectRecord};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

const LOGIN_PATH: &str = "/api/aaaLogin.json";
const BODY_EXCERPT_CHARS: usize = 200;

/// Path of a full-subtree query rooted at `dn`.
pub fn subtree_path(dn: &Dn) -> String {
    format!("/api/node/mo/{dn}.json?query-target=subtree&rsp-subtree=full")
}

/// Path of a class query.
pub fn class_path(class: &ClassTag) -> String {
    format!("/api/class/{class}.json")
}

/// Map a non-success status to an error; 401 and 403 mean the session is
/// not (or no longer) authenticated.
fn check_status(status: StatusCode, url: &str, body: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(HarvestError::Auth(format!("{status} from {url}: {excerpt}")));
    }
    Err(HarvestError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body: excerpt,
    })
}

pub struct ApicClient {
    client: Client,
    config: ApicConfig,
}

impl ApicClient {
    /// Build the HTTP client without contacting the controller.
    pub fn new(config: ApicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build the client and log in.
    pub async fn connect(config: ApicConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.login().await?;
        Ok(client)
    }

    pub fn config(&self) -> &ApicConfig {
        &self.config
    }

    pub async fn login(&self) -> Result<()> {
        let url = self.config.endpoint(LOGIN_PATH);
        tracing::debug!(url = %url, user = %self.config.user, "POST aaaLogin");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest::new(&self.config.user, &self.config.password))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        check_status(status, &url, &text)?;

        let parsed: ImdataResponse = serde_json::from_str(&text)?;
        if let Some(message) = parsed.controller_error() {
            return Err(HarvestError::Auth(message));
        }

        tracing::info!(url = %self.config.url, user = %self.config.user, "Logged in to APIC");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<ImdataResponse> {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "GET");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if let Err(err) = check_status(status, &url, &text) {
            tracing::warn!(url = %url, status = %status, "APIC query failed");
            return Err(err);
        }

        let parsed: ImdataResponse = serde_json::from_str(&text)?;
        if let Some(message) = parsed.controller_error() {
            tracing::warn!(url = %url, error = %message, "APIC returned an error object");
            return Err(HarvestError::Controller(message));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl ObjectSource for ApicClient {
    async fn subtree(&self, dn: &Dn) -> Result<Vec<ObjectRecord>> {
        Ok(self.get(&subtree_path(dn)).await?.into_records())
    }

    async fn class(&self, class: &ClassTag) -> Result<Vec<ObjectRecord>> {
        Ok(self.get(&class_path(class)).await?.into_records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_paths() {
        assert_eq!(
            subtree_path(&Dn::new("uni/tn-Prod")),
            "/api/node/mo/uni/tn-Prod.json?query-target=subtree&rsp-subtree=full"
        );
        assert_eq!(class_path(&ClassTag::FvTenant), "/api/class/fvTenant.json");
    }

    #[test]
    fn test_status_mapping() {
        let url = "https://apic/api/class/fvTenant.json";
        assert!(check_status(StatusCode::OK, url, "").is_ok());
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, url, "token expired"),
            Err(HarvestError::Auth(_))
        ));

        let long_body = "x".repeat(500);
        match check_status(StatusCode::BAD_REQUEST, url, &long_body) {
            Err(HarvestError::Status { status, body, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(body.len(), BODY_EXCERPT_CHARS);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_does_not_contact_controller() {
        let config = ApicConfig::new("https://apic.invalid", "admin", "secret")
            .unwrap()
            .with_insecure(true);
        let client = ApicClient::new(config).unwrap();
        assert!(client.config().insecure);
    }
}
