// Exchange module — protocol layer between a session and the remote endpoint

pub mod communicator;
pub mod protocol;

pub use communicator::Communicator;
pub use protocol::{ExchangeError, ReflectRequest, ADDRESS_PATH, REFLECT_PATH};
