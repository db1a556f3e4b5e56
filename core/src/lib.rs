// actorlink core — addressed message exchange with a remote actor endpoint
//
// A client discovers its own address, then keeps polling the endpoint with a
// reflect exchange: queued outgoing messages go up, messages addressed to the
// client come back and are fanned out to listeners by address prefix.

pub mod client;
pub mod exchange;
pub mod message;
pub mod store;
pub mod transport;

use thiserror::Error;

pub use client::{
    ActorClient, ClientConfig, ClientState, ListenerId, QueueStats, RetryPolicy, StatusEvent,
};
pub use exchange::{Communicator, ExchangeError};
pub use message::{Address, AddressError, IntoAddress, Message};
pub use transport::{HttpTransport, Transport, TransportError};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors returned synchronously by [`ActorClient`] operations.
///
/// Exchange failures never surface here; they are reported as
/// [`StatusEvent`]s while the client keeps retrying.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),
    #[error("Client already started")]
    AlreadyStarted,
    #[error("Client stopped")]
    Stopped,
}
