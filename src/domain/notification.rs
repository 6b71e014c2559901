use crate::error::CallbackError;
use serde::{Deserialize, Serialize};

pub const SIGNATURE_HEADER: &str = "X-Signature";
pub const PAYMENT_HASH_PARAM: &str = "paymentHash";

/// Payment state reported by the gateway.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum NotificationStatus {
    Success,
    Completed,
    Other(String),
}

impl NotificationStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "success" => Self::Success,
            "completed" => Self::Completed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Only these two statuses mean the customer has paid.
    pub fn confirms_payment(&self) -> bool {
        matches!(self, Self::Success | Self::Completed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Completed => "completed",
            Self::Other(raw) => raw,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    merchant_order_id: Option<String>,
}

/// A verified gateway notification.
#[derive(Debug, PartialEq, Clone)]
pub struct WebhookNotification {
    pub status: NotificationStatus,
    pub gateway_order_id: Option<String>,
    pub merchant_order_id: Option<String>,
}

impl WebhookNotification {
    /// Parses the JSON body. Call only after the signature has been checked.
    pub fn parse(raw_body: &[u8]) -> Result<Self, CallbackError> {
        let body: NotificationBody = serde_json::from_slice(raw_body)?;
        Ok(Self {
            status: NotificationStatus::from_raw(&body.status),
            gateway_order_id: body.id,
            merchant_order_id: body.merchant_order_id,
        })
    }
}

/// Request parameters of the inbound call, in arrival order.
///
/// Keys keep their raw form, so `paymentHash[]=x` stays distinguishable
/// from `paymentHash=x`.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct RequestParams(Vec<(String, String)>);

impl RequestParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Parses a URL query string (with or without the leading `?`).
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        )
    }

    /// The value of `name` if it was sent exactly once, as a plain scalar and
    /// non-empty.
    ///
    /// Array-style keys (`name[]`, `name[k]`) and repeated keys yield `None`.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        let mut found = None;
        for (key, value) in &self.0 {
            if key == name {
                if found.is_some() {
                    return None;
                }
                found = Some(value.as_str());
            } else if key
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('['))
            {
                return None;
            }
        }
        found.filter(|value| !value.is_empty())
    }
}

/// An inbound notification call as received over HTTP.
#[derive(Debug, Default, Clone)]
pub struct CallbackRequest {
    pub body: Vec<u8>,
    /// Value of the `X-Signature` header, if any.
    pub signature: Option<String>,
    pub params: RequestParams,
}

/// The JSON answer to the gateway; nothing else is written after it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct CallbackResponse {
    pub status: CallbackStatus,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Success,
    Error,
}

impl CallbackResponse {
    pub const SUCCESS: Self = Self {
        status: CallbackStatus::Success,
    };
    pub const ERROR: Self = Self {
        status: CallbackStatus::Error,
    };

    pub fn is_success(&self) -> bool {
        self.status == CallbackStatus::Success
    }

    pub fn to_json(&self) -> String {
        match self.status {
            CallbackStatus::Success => r#"{"status":"success"}"#.to_string(),
            CallbackStatus::Error => r#"{"status":"error"}"#.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        let n = WebhookNotification::parse(br#"{"status":"completed","id":"g-1"}"#).unwrap();
        assert_eq!(n.status, NotificationStatus::Completed);
        assert!(n.status.confirms_payment());
        assert_eq!(n.gateway_order_id.as_deref(), Some("g-1"));

        let n = WebhookNotification::parse(br#"{"status":"failed"}"#).unwrap();
        assert_eq!(n.status, NotificationStatus::Other("failed".to_string()));
        assert!(!n.status.confirms_payment());
    }

    #[test]
    fn test_missing_status_does_not_confirm() {
        let n = WebhookNotification::parse(b"{}").unwrap();
        assert!(!n.status.confirms_payment());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            WebhookNotification::parse(b"not json"),
            Err(CallbackError::UnparsableNotification(_))
        ));
    }

    #[test]
    fn test_scalar_param() {
        let params = RequestParams::from_query("?paymentHash=abc&other=1");
        assert_eq!(params.scalar(PAYMENT_HASH_PARAM), Some("abc"));
    }

    #[test]
    fn test_array_param_rejected() {
        let params = RequestParams::from_query("paymentHash[]=abc");
        assert_eq!(params.scalar(PAYMENT_HASH_PARAM), None);

        let params = RequestParams::from_query("paymentHash%5Bx%5D=abc&paymentHash=def");
        assert_eq!(params.scalar(PAYMENT_HASH_PARAM), None);
    }

    #[test]
    fn test_repeated_and_empty_param_rejected() {
        let params = RequestParams::from_query("paymentHash=a&paymentHash=b");
        assert_eq!(params.scalar(PAYMENT_HASH_PARAM), None);

        let params = RequestParams::from_query("paymentHash=");
        assert_eq!(params.scalar(PAYMENT_HASH_PARAM), None);

        let params = RequestParams::from_query("paymentHashes=abc");
        assert_eq!(params.scalar(PAYMENT_HASH_PARAM), None);
    }

    #[test]
    fn test_response_json() {
        assert_eq!(CallbackResponse::SUCCESS.to_json(), r#"{"status":"success"}"#);
        assert_eq!(
            serde_json::to_string(&CallbackResponse::ERROR).unwrap(),
            r#"{"status":"error"}"#
        );
    }
}
