// Listener registry — hierarchical fan-out of delivered messages
//
// Listeners are keyed by address. A message addressed to `a:b:c` reaches the
// listeners of `a:b:c`, then `a:b`, then `a`.

use crate::message::{Address, Message};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Handle returned when a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Something that wants to see messages for an address subtree.
#[derive(Clone)]
pub enum Listener {
    Callback(Arc<dyn Fn(&Message) + Send + Sync>),
    Channel(mpsc::UnboundedSender<Message>),
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Callback(_) => write!(f, "Listener::Callback"),
            Listener::Channel(_) => write!(f, "Listener::Channel"),
        }
    }
}

impl Listener {
    /// Hand `message` to the listener. Returns `false` once the listener can
    /// no longer receive (its channel is closed).
    pub fn deliver(&self, message: &Message) -> bool {
        match self {
            Listener::Callback(callback) => {
                if catch_unwind(AssertUnwindSafe(|| callback(message))).is_err() {
                    warn!("Listener panicked while handling message for {}", message.destination());
                }
                true
            }
            Listener::Channel(tx) => tx.send(message.clone()).is_ok(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    by_address: HashMap<Address, Vec<(ListenerId, Listener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, address: Address, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.by_address.entry(address).or_default().push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let mut emptied = None;
        let mut found = false;
        for (address, listeners) in self.by_address.iter_mut() {
            if let Some(pos) = listeners.iter().position(|(lid, _)| *lid == id) {
                listeners.remove(pos);
                found = true;
                if listeners.is_empty() {
                    emptied = Some(address.clone());
                }
                break;
            }
        }
        if let Some(address) = emptied {
            self.by_address.remove(&address);
        }
        found
    }

    /// Every listener interested in `destination`, most specific address first.
    pub fn listeners_for(&self, destination: &Address) -> Vec<(ListenerId, Listener)> {
        destination
            .ancestors()
            .filter_map(|address| self.by_address.get(&address))
            .flat_map(|listeners| listeners.iter().cloned())
            .collect()
    }

    /// Total registered listeners.
    pub fn len(&self) -> usize {
        self.by_address.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}
