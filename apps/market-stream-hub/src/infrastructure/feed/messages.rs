//! Upstream feed message types.

use serde::{Deserialize, Serialize};

/// Interest update sent to the upstream streamer.
///
/// Serializes as `{"subscribe":[...]}` or `{"unsubscribe":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedRequest {
    /// Start streaming these symbols.
    Subscribe(Vec<String>),
    /// Stop streaming these symbols.
    Unsubscribe(Vec<String>),
}

impl FeedRequest {
    /// Symbols carried by the request.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        match self {
            Self::Subscribe(symbols) | Self::Unsubscribe(symbols) => symbols,
        }
    }
}

/// JSON wrapper some streamer versions put around the base64 payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEnvelope {
    /// Message kind, e.g. `pricing`. Not interpreted.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Base64 tick record.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_serializes_as_keyed_list() {
        let json = serde_json::to_string(&FeedRequest::Subscribe(vec![
            "TCS.NS".to_string(),
            "INFY.NS".to_string(),
        ]))
        .unwrap();

        assert_eq!(json, r#"{"subscribe":["TCS.NS","INFY.NS"]}"#);
    }

    #[test]
    fn unsubscribe_serializes_as_keyed_list() {
        let json =
            serde_json::to_string(&FeedRequest::Unsubscribe(vec!["ITC.NS".to_string()])).unwrap();

        assert_eq!(json, r#"{"unsubscribe":["ITC.NS"]}"#);
    }

    #[test]
    fn envelope_type_is_optional() {
        let envelope: FeedEnvelope = serde_json::from_str(r#"{"message":"abc"}"#).unwrap();

        assert!(envelope.kind.is_none());
        assert_eq!(envelope.message, "abc");
    }
}
