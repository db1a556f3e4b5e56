// Store module — the two session queues

pub mod in_queue;
pub mod out_queue;

pub use in_queue::{InQueue, MarkResult};
pub use out_queue::OutQueue;
