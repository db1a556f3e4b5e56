//! Communicator — discovery and reflect exchanges over a Transport

use super::protocol::{
    parse_reflect_response, ExchangeError, ReflectRequest, ADDRESS_PATH, REFLECT_PATH,
};
use crate::message::{Address, AddressError, Message};
use crate::transport::Transport;
use std::sync::Arc;
use tracing::debug;

/// Protocol layer between the client session and the remote endpoint.
#[derive(Clone)]
pub struct Communicator {
    endpoint: String,
    transport: Arc<dyn Transport>,
}

impl Communicator {
    /// Create a communicator for `endpoint`, e.g. `http://host:8080/actor`.
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            endpoint,
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// Ask the remote side for this client's address.
    pub async fn discover(&self) -> Result<Address, ExchangeError> {
        let url = self.url(ADDRESS_PATH);
        debug!("Discovering address via {}", url);

        let text = self.transport.fetch_text(&url).await?;
        text.parse()
            .map_err(|e: AddressError| ExchangeError::Validation(format!("bad address {:?}: {}", text, e)))
    }

    /// Send the outgoing snapshot and collect whatever the remote side has
    /// queued for this client.
    pub async fn reflect(
        &self,
        id: &str,
        out_queue_offset: u64,
        in_queue_offset: u64,
        outgoing: &[Message],
    ) -> Result<Vec<Message>, ExchangeError> {
        let request = ReflectRequest::new(id, out_queue_offset, in_queue_offset, outgoing);
        let body = serde_json::to_value(&request)
            .map_err(|e| ExchangeError::InvalidArgument(e.to_string()))?;

        let url = self.url(REFLECT_PATH);
        debug!(
            "Reflect {} (id={}, outQueueOffset={}, inQueueOffset={}, sending {})",
            url,
            id,
            out_queue_offset,
            in_queue_offset,
            outgoing.len()
        );

        let response = self.transport.post_json(&url, body).await?;
        parse_reflect_response(&response)
    }
}

// ============================================================================
// TESTS
// ============================================================================
