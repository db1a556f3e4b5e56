//! Exchange protocol — request/response bodies for discovery and reflect
//!
//! Discovery is a GET of the `address` resource returning the address as plain
//! text. Reflect is a POST to the `rfm` resource:
//!
//! ```text
//! request:  { "id", "outQueueOffset", "inQueueOffset", "inQueue": [msg...] }
//! response: { "outQueue": [msg...] }
//! msg:      { "source", "destination", "type", "data" }
//! ```

use crate::message::{decode_message, CodecError, Message, WireMessage};
use crate::transport::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Resource that hands out client addresses.
pub const ADDRESS_PATH: &str = "address";

/// Resource that trades outgoing messages for inbound ones.
pub const REFLECT_PATH: &str = "rfm";

/// Errors reported by a discovery or reflect exchange.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ExchangeError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ExchangeError::Transport(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ExchangeError::Validation(_))
    }
}

/// Body of a reflect request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectRequest {
    /// Session identifier (last element of the client's address).
    pub id: String,
    /// Messages this client has already accepted.
    pub out_queue_offset: u64,
    /// Offset of the first message in `in_queue`.
    pub in_queue_offset: u64,
    pub in_queue: Vec<WireMessage>,
}

impl ReflectRequest {
    pub fn new(id: &str, out_queue_offset: u64, in_queue_offset: u64, outgoing: &[Message]) -> Self {
        Self {
            id: id.to_string(),
            out_queue_offset,
            in_queue_offset,
            in_queue: outgoing.iter().map(WireMessage::from).collect(),
        }
    }
}

/// Validate a reflect response and rebuild its inbound messages.
///
/// The whole response is rejected if any entry is malformed; no partial list
/// is ever returned.
pub fn parse_reflect_response(response: &Value) -> Result<Vec<Message>, ExchangeError> {
    let obj = response
        .as_object()
        .ok_or_else(|| ExchangeError::Validation("response is not a JSON object".to_string()))?;

    let entries = match obj.get("outQueue") {
        None | Some(Value::Null) => {
            return Err(ExchangeError::Validation("missing outQueue".to_string()))
        }
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ExchangeError::Validation("outQueue is not an array".to_string())),
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            decode_message(entry)
                .map_err(|e: CodecError| ExchangeError::Validation(format!("outQueue[{}]: {}", i, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_field_names() {
        let msg = Message::new(
            "servlet:abc".parse().unwrap(),
            "actor:echoer".parse().unwrap(),
            "java.lang.String",
            json!("testmsg"),
        );
        let req = ReflectRequest::new("abc", 4, 2, &[msg]);

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "id": "abc",
                "outQueueOffset": 4,
                "inQueueOffset": 2,
                "inQueue": [{
                    "source": "servlet:abc",
                    "destination": "actor:echoer",
                    "type": "java.lang.String",
                    "data": "testmsg"
                }]
            })
        );
    }

    #[test]
    fn test_parse_empty_response() {
        let messages = parse_reflect_response(&json!({ "outQueue": [] })).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for bad in [json!([]), json!({}), json!({ "outQueue": null }), json!({ "outQueue": "x" })] {
            let err = parse_reflect_response(&bad).unwrap_err();
            assert!(err.is_validation(), "{:?} should fail validation", bad);
        }
    }

    #[test]
    fn test_parse_reports_entry_index() {
        let response = json!({
            "outQueue": [
                { "source": "a", "destination": "b", "type": "t", "data": 1 },
                { "source": "a", "destination": "b\\", "type": "t", "data": 2 }
            ]
        });
        match parse_reflect_response(&response) {
            Err(ExchangeError::Validation(reason)) => assert!(reason.starts_with("outQueue[1]")),
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
