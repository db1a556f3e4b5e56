// Status events — what the client reports about its own progress

use crate::exchange::ExchangeError;
use crate::message::Address;
use std::fmt;

/// Connection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Created, `start` not called yet
    Uninitialized,
    /// Waiting for the remote side to assign an address
    Discovering,
    /// Address known, exchanging messages
    Polling,
    /// Shut down, or a capped retry policy gave up
    Stopped,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Uninitialized => write!(f, "uninitialized"),
            ClientState::Discovering => write!(f, "discovering"),
            ClientState::Polling => write!(f, "polling"),
            ClientState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Informational events broadcast to status subscribers.
///
/// Exchange failures are reported here instead of being returned anywhere;
/// the loops keep retrying on their own.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    DiscoveryStarted,
    DiscoverySucceeded(Address),
    DiscoveryFailed(ExchangeError),
    PollStarted,
    PollSucceeded { received: usize },
    PollFailed(ExchangeError),
    Stopped,
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::DiscoveryStarted => write!(f, "discovery started"),
            StatusEvent::DiscoverySucceeded(address) => write!(f, "discovered address {}", address),
            StatusEvent::DiscoveryFailed(e) => write!(f, "discovery failed: {}", e),
            StatusEvent::PollStarted => write!(f, "poll started"),
            StatusEvent::PollSucceeded { received } => write!(f, "poll succeeded ({} received)", received),
            StatusEvent::PollFailed(e) => write!(f, "poll failed: {}", e),
            StatusEvent::Stopped => write!(f, "stopped"),
        }
    }
}
