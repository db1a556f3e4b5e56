// Message types — what travels between actors

use super::address::Address;
use serde_json::Value;

/// An immutable message envelope.
///
/// `data` is opaque to the engine: it is carried as a JSON value and handed to
/// listeners exactly as the remote side produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    source: Address,
    destination: Address,
    message_type: String,
    data: Value,
}

impl Message {
    pub fn new(
        source: Address,
        destination: Address,
        message_type: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            source,
            destination,
            message_type: message_type.into(),
            data,
        }
    }

    pub fn source(&self) -> &Address {
        &self.source
    }

    pub fn destination(&self) -> &Address {
        &self.destination
    }

    /// Free-form type tag, e.g. the remote's class name for `data`.
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_accessors() {
        let msg = Message::new(
            "servlet:abc".parse().unwrap(),
            "actor:echoer".parse().unwrap(),
            "java.lang.String",
            json!("testmsg"),
        );

        assert_eq!(msg.source().to_string(), "servlet:abc");
        assert_eq!(msg.destination().to_string(), "actor:echoer");
        assert_eq!(msg.message_type(), "java.lang.String");
        assert_eq!(msg.data(), &json!("testmsg"));
    }
}
