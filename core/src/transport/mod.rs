// Transport module — request/response plumbing under the communicator

pub mod abstraction;
pub mod http;

pub use abstraction::{Transport, TransportError};
pub use http::HttpTransport;
