// HTTP transport — hyper client implementing the Transport trait

use super::abstraction::{Transport, TransportError};
use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request};
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// Plain HTTP/1.1 transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector>,
    timeout: Option<Duration>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: None,
        }
    }

    /// Fail a request that has not produced a response within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn execute(&self, req: Request<Body>) -> Result<Bytes, TransportError> {
        let uri = req.uri().clone();
        trace!("{} {}", req.method(), uri);

        let pending = self.client.request(req);
        let resp = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| TransportError::Timeout(format!("{} after {:?}", uri, limit)))?,
            None => pending.await,
        }
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        // Check HTTP status before handing the body back
        let status = resp.status();
        let body = hyper::body::to_bytes(resp.into_body())
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(url)
            .header("accept", "text/plain")
            .body(Body::empty())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let body = self.execute(req).await?;
        String::from_utf8(body.to_vec()).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }

    async fn post_json(&self, url: &str, body: Value) -> Result<Value, TransportError> {
        let json = serde_json::to_string(&body)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let req = Request::builder()
            .method(Method::POST)
            .uri(url)
            .header("content-type", "application/json")
            .body(Body::from(json))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let body = self.execute(req).await?;
        serde_json::from_slice(&body).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}
