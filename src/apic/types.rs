//! APIC REST response and request bodies
//!
//! Every query answers with `{"totalCount": "N", "imdata": [...]}`. A failed
//! query still answers that way, with a single `error` object in `imdata`.

use crate::mo::{ClassTag, ObjectRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level query response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImdataResponse {
    #[serde(rename = "totalCount", default)]
    pub total_count: Option<String>,
    #[serde(default)]
    pub imdata: Vec<Value>,
}

impl ImdataResponse {
    /// Message of the first `error` object, formatted `code: text`.
    pub fn controller_error(&self) -> Option<String> {
        ObjectRecord::from_imdata(&self.imdata)
            .into_iter()
            .find(|record| record.class == ClassTag::Error)
            .map(|record| {
                let text = record.attr("text").unwrap_or("unknown error");
                match record.attr("code") {
                    Some(code) => format!("{code}: {text}"),
                    None => text.to_string(),
                }
            })
    }

    pub fn into_records(self) -> Vec<ObjectRecord> {
        ObjectRecord::from_imdata(&self.imdata)
    }
}

/// `POST /api/aaaLogin.json` body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "aaaUser")]
    pub aaa_user: AaaUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct AaaUser {
    pub attributes: AaaUserAttributes,
}

#[derive(Debug, Clone, Serialize)]
pub struct AaaUserAttributes {
    pub name: String,
    pub pwd: String,
}

impl LoginRequest {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            aaa_user: AaaUser {
                attributes: AaaUserAttributes {
                    name: user.to_string(),
                    pwd: password.to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_response() {
        let response: ImdataResponse = serde_json::from_value(json!({
            "totalCount": "1",
            "imdata": [{"error": {"attributes": {"code": "400", "text": "Unknown class"}}}]
        }))
        .unwrap();
        assert_eq!(
            response.controller_error().as_deref(),
            Some("400: Unknown class")
        );
    }

    #[test]
    fn test_records_response() {
        let response: ImdataResponse = serde_json::from_value(json!({
            "totalCount": "2",
            "imdata": [
                {"fvTenant": {"attributes": {"dn": "uni/tn-A", "name": "A"}}},
                {"fvTenant": {"attributes": {"dn": "uni/tn-B", "name": "B"}}}
            ]
        }))
        .unwrap();
        assert!(response.controller_error().is_none());
        assert_eq!(response.total_count.as_deref(), Some("2"));

        let records = response.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].dn.as_str(), "uni/tn-B");
    }

    #[test]
    fn test_missing_imdata_is_empty() {
        let response: ImdataResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_records().is_empty());
    }

    #[test]
    fn test_login_body() {
        let body = serde_json::to_value(LoginRequest::new("admin", "secret")).unwrap();
        assert_eq!(
            body,
            json!({"aaaUser": {"attributes": {"name": "admin", "pwd": "secret"}}})
        );
    }
}
