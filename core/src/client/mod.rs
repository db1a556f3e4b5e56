// Client module — session orchestration on top of the exchange layer

pub mod actor_client;
pub mod config;
pub mod registry;
pub mod status;

pub use actor_client::{ActorClient, QueueStats};
pub use config::{ClientConfig, RetryPolicy, DEFAULT_ENDPOINT};
pub use registry::{Listener, ListenerId, ListenerRegistry};
pub use status::{ClientState, StatusEvent};
