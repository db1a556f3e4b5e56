// Message codec — JSON wire form with validation of remote payloads
//
// Addresses travel in their escaped text form. Anything coming back from the
// remote side is checked field by field before a Message is rebuilt from it.

use super::address::{Address, AddressError};
use super::types::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Field {field} has wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Invalid address in {field}: {reason}")]
    InvalidAddress { field: &'static str, reason: String },
    #[error("Expected a JSON object")]
    NotAnObject,
}

/// Message as it appears inside request and response bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub source: String,
    pub destination: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub data: Value,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        Self {
            source: msg.source().to_string(),
            destination: msg.destination().to_string(),
            message_type: msg.message_type().to_string(),
            data: msg.data().clone(),
        }
    }
}

fn required<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, CodecError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(CodecError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, CodecError> {
    required(obj, field)?
        .as_str()
        .ok_or(CodecError::WrongType {
            field,
            expected: "string",
        })
}

fn required_address(obj: &Map<String, Value>, field: &'static str) -> Result<Address, CodecError> {
    required_str(obj, field)?
        .parse()
        .map_err(|e: AddressError| CodecError::InvalidAddress {
            field,
            reason: e.to_string(),
        })
}

/// Rebuild a Message from an untrusted JSON descriptor.
///
/// All four fields must be present and non-null; `source` and `destination`
/// must be well-formed addresses.
pub fn decode_message(value: &Value) -> Result<Message, CodecError> {
    let obj = value.as_object().ok_or(CodecError::NotAnObject)?;

    let source = required_address(obj, "source")?;
    let destination = required_address(obj, "destination")?;
    let message_type = required_str(obj, "type")?;
    let data = required(obj, "data")?.clone();

    Ok(Message::new(source, destination, message_type, data))
}
