use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::{LedgerError, Result};
use crate::types::DocumentKind;

/// one finished document handed to the persistence gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub kind: DocumentKind,
    /// header fields, two-decimal figures keyed by form field name
    pub fields: BTreeMap<String, String>,
    /// serialized detail records
    pub detail: String,
}

/// successful gateway answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReply {
    #[serde(default)]
    pub msg: String,
    /// where the form surface should navigate next
    #[serde(default)]
    pub url: Option<String>,
}

impl GatewayReply {
    /// interpret a status code and json body from the gateway.
    ///
    /// An `error` field is a rejection even on a success status. A
    /// non-success status without one gets a generic message.
    pub fn from_response(status: u16, body: &str) -> Result<Self> {
        let success = (200..300).contains(&status);

        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return Err(LedgerError::GatewayRejected {
                message: if success {
                    "unreadable response from gateway".to_string()
                } else {
                    format!("HTTP {}", status)
                },
            });
        };

        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            return Err(LedgerError::GatewayRejected {
                message: match error {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                },
            });
        }

        if !success {
            return Err(LedgerError::GatewayRejected {
                message: format!("HTTP {}", status),
            });
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// durable storage for finished documents.
///
/// Implementations own the transport. A failed submit must leave the
/// caller's session as it was so the user can retry.
pub trait PersistenceGateway {
    fn submit(&mut self, submission: &Submission) -> Result<GatewayReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_reply() {
        let reply = GatewayReply::from_response(
            200,
            r#"{"msg": "Invoice saved.", "url": "/invoices/"}"#,
        ).unwrap();

        assert_eq!(reply.msg, "Invoice saved.");
        assert_eq!(reply.url.as_deref(), Some("/invoices/"));
    }

    #[test]
    fn test_success_without_url() {
        let reply = GatewayReply::from_response(201, r#"{"msg": "updated"}"#).unwrap();
        assert_eq!(reply.url, None);
    }

    #[test]
    fn test_error_field_wins_on_success_status() {
        let err = GatewayReply::from_response(200, r#"{"error": "product 7 not found"}"#).unwrap_err();
        assert_eq!(err.to_string(), "gateway rejected submission: product 7 not found");
    }

    #[test]
    fn test_structured_errors_are_rendered_compactly() {
        let err = GatewayReply::from_response(400, r#"{"error": {"customer": ["required"]}}"#).unwrap_err();
        match err {
            LedgerError::GatewayRejected { message } => {
                assert_eq!(message, r#"{"customer":["required"]}"#);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_failure_status_without_error_field() {
        let err = GatewayReply::from_response(500, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, LedgerError::GatewayRejected { ref message } if message == "HTTP 500"));

        let err = GatewayReply::from_response(404, r#"{"msg": "gone"}"#).unwrap_err();
        assert!(matches!(err, LedgerError::GatewayRejected { ref message } if message == "HTTP 404"));
    }

    #[test]
    fn test_unreadable_success_body() {
        assert!(GatewayReply::from_response(200, "").is_err());
    }
}
