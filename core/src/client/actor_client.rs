//! Actor client — drives discovery, polling and dispatch for one session.
//!
//! Lifecycle: `Uninitialized → Discovering → Polling`, with `Stopped`
//! reachable through [`ActorClient::shutdown`] or an exhausted retry cap.
//!
//! Each polling round snapshots the outgoing queue with `mark`, sends it in a
//! reflect exchange, and only calls `forward` once the exchange succeeded, so a
//! failed round resends the same messages. Inbound messages go through the
//! delivery queue and are fanned out by a single dispatch task at a time.

use super::config::{ClientConfig, RetryPolicy};
use super::registry::{Listener, ListenerId, ListenerRegistry};
use super::status::{ClientState, StatusEvent};
use crate::exchange::Communicator;
use crate::message::{Address, IntoAddress, Message};
use crate::store::{InQueue, OutQueue};
use crate::transport::{HttpTransport, Transport};
use crate::ClientError;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type ReadyCallback = Box<dyn FnOnce(Address) + Send>;

/// Queue counters, mostly useful for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Outgoing messages already confirmed by the remote side
    pub in_offset: u64,
    /// Outgoing messages waiting to be confirmed
    pub pending_outgoing: usize,
    /// Inbound messages received so far
    pub out_offset: u64,
    /// Inbound messages waiting for dispatch
    pub pending_inbound: usize,
}

struct Session {
    state: ClientState,
    self_address: Option<Address>,
    ready_callbacks: Vec<ReadyCallback>,
    /// Outgoing: written locally, waiting for the remote side
    in_queue: InQueue,
    /// Inbound: received from the remote side, waiting for dispatch
    out_queue: OutQueue,
    dispatching: bool,
}

struct Shared {
    config: ClientConfig,
    communicator: Communicator,
    session: Mutex<Session>,
    listeners: Mutex<ListenerRegistry>,
    status_tx: broadcast::Sender<StatusEvent>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to an actor client session. Clones share the same session.
#[derive(Clone)]
pub struct ActorClient {
    shared: Arc<Shared>,
}

impl ActorClient {
    /// Create a client that exchanges messages through `transport`.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let communicator = Communicator::new(config.endpoint.clone(), transport);
        let (status_tx, _) = broadcast::channel(config.status_capacity.max(1));

        Self {
            shared: Arc::new(Shared {
                config,
                communicator,
                session: Mutex::new(Session {
                    state: ClientState::Uninitialized,
                    self_address: None,
                    ready_callbacks: Vec::new(),
                    in_queue: InQueue::new(),
                    out_queue: OutQueue::new(),
                    dispatching: false,
                }),
                listeners: Mutex::new(ListenerRegistry::new()),
                status_tx,
                driver: Mutex::new(None),
            }),
        }
    }

    /// Create a client backed by the default HTTP transport.
    pub fn with_http(config: ClientConfig) -> Self {
        Self::new(config, Arc::new(HttpTransport::new()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Begin discovery. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), ClientError> {
        {
            let mut session = self.shared.session.lock();
            match session.state {
                ClientState::Uninitialized => session.state = ClientState::Discovering,
                ClientState::Stopped => return Err(ClientError::Stopped),
                _ => return Err(ClientError::AlreadyStarted),
            }
        }

        info!("Actor client starting (endpoint {})", self.shared.communicator.endpoint());
        let handle = tokio::spawn(Arc::clone(&self.shared).run());
        *self.shared.driver.lock() = Some(handle);
        Ok(())
    }

    /// Stop all loops. Pending `ready` callbacks are dropped.
    pub fn shutdown(&self) {
        {
            let mut session = self.shared.session.lock();
            if session.state == ClientState::Stopped {
                return;
            }
            session.state = ClientState::Stopped;
            session.ready_callbacks.clear();
        }

        if let Some(handle) = self.shared.driver.lock().take() {
            handle.abort();
        }
        info!("Actor client stopped");
        self.shared.emit(StatusEvent::Stopped);
    }

    pub fn state(&self) -> ClientState {
        self.shared.session.lock().state
    }

    /// The assigned address, if discovery has completed.
    pub fn self_address(&self) -> Option<Address> {
        self.shared.session.lock().self_address.clone()
    }

    /// Run `callback` with the assigned address once it is known.
    ///
    /// Callbacks registered before discovery run in reverse registration
    /// order. After discovery the callback is spawned on the current tokio
    /// runtime, or called inline when there is none. If the client stopped
    /// without an address the callback is dropped unrun.
    pub fn ready<F>(&self, callback: F)
    where
        F: FnOnce(Address) + Send + 'static,
    {
        let address = {
            let mut session = self.shared.session.lock();
            match &session.self_address {
                Some(address) => address.clone(),
                None if session.state == ClientState::Stopped => {
                    debug!("Client stopped before discovery, dropping ready callback");
                    return;
                }
                None => {
                    session.ready_callbacks.push(Box::new(callback));
                    return;
                }
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    callback(address);
                });
            }
            Err(_) => callback(address),
        }
    }

    /// Wait for the assigned address. Fails with [`ClientError::Stopped`] if
    /// the client stops, or has already stopped, without one.
    pub async fn address(&self) -> Result<Address, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.ready(move |address| {
            let _ = tx.send(address);
        });
        rx.await.map_err(|_| ClientError::Stopped)
    }

    /// Queue a message for the remote side. It goes out with the next
    /// polling round; nothing is sent before discovery completes.
    pub fn write_message(
        &self,
        source: impl IntoAddress,
        destination: impl IntoAddress,
        message_type: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), ClientError> {
        let message = Message::new(
            source.into_address()?,
            destination.into_address()?,
            message_type,
            data,
        );
        self.send(message)
    }

    /// Queue an already-built message.
    pub fn send(&self, message: Message) -> Result<(), ClientError> {
        let mut session = self.shared.session.lock();
        if session.state == ClientState::Stopped {
            return Err(ClientError::Stopped);
        }
        debug!("Queued message {} -> {}", message.source(), message.destination());
        session.in_queue.add(message);
        Ok(())
    }

    /// Call `callback` for every delivered message whose destination is
    /// `address` or lies below it.
    pub fn listen<F>(&self, address: impl IntoAddress, callback: F) -> Result<ListenerId, ClientError>
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let address = address.into_address()?;
        Ok(self
            .shared
            .listeners
            .lock()
            .register(address, Listener::Callback(Arc::new(callback))))
    }

    /// Channel flavour of [`listen`](Self::listen). The subscription is
    /// dropped once the receiver is.
    pub fn subscribe(
        &self,
        address: impl IntoAddress,
    ) -> Result<mpsc::UnboundedReceiver<Message>, ClientError> {
        let address = address.into_address()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared
            .listeners
            .lock()
            .register(address, Listener::Channel(tx));
        Ok(rx)
    }

    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.shared.listeners.lock().unregister(id)
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusEvent> {
        self.shared.status_tx.subscribe()
    }

    pub fn stats(&self) -> QueueStats {
        let session = self.shared.session.lock();
        QueueStats {
            in_offset: session.in_queue.offset(),
            pending_outgoing: session.in_queue.len(),
            out_offset: session.out_queue.offset(),
            pending_inbound: session.out_queue.len(),
        }
    }
}

// ============================================================================
// DRIVER
// ============================================================================

impl Shared {
    fn emit(&self, event: StatusEvent) {
        // No subscribers is fine
        let _ = self.status_tx.send(event);
    }

    fn is_stopped(&self) -> bool {
        self.session.lock().state == ClientState::Stopped
    }

    fn give_up(&self, phase: &str) {
        {
            let mut session = self.session.lock();
            session.state = ClientState::Stopped;
            session.ready_callbacks.clear();
        }
        warn!("Actor client giving up after repeated {} failures", phase);
        self.emit(StatusEvent::Stopped);
    }

    async fn run(self: Arc<Self>) {
        let address = match self.discover().await {
            Some(address) => address,
            None => return self.give_up("discovery"),
        };

        if !self.poll(address).await {
            self.give_up("poll");
        }
    }

    async fn discover(&self) -> Option<Address> {
        let policy = self.config.discovery_retry;
        let mut failures = 0u32;

        loop {
            self.emit(StatusEvent::DiscoveryStarted);
            match self.communicator.discover().await {
                Ok(address) => {
                    self.on_discovered(&address);
                    return Some(address);
                }
                Err(e) => {
                    warn!("Address discovery failed: {}", e);
                    self.emit(StatusEvent::DiscoveryFailed(e));
                    failures = failures.saturating_add(1);
                    if !policy.allows(failures) {
                        return None;
                    }
                    pause(policy.delay).await;
                }
            }
        }
    }

    fn on_discovered(&self, address: &Address) {
        info!("Assigned address {}", address);

        // Address and callbacks change under one lock so a concurrent `ready`
        // either lands in the drained list or sees the address.
        let callbacks = {
            let mut session = self.session.lock();
            session.self_address = Some(address.clone());
            session.state = ClientState::Polling;
            std::mem::take(&mut session.ready_callbacks)
        };

        for callback in callbacks.into_iter().rev() {
            let address = address.clone();
            if catch_unwind(AssertUnwindSafe(move || callback(address))).is_err() {
                warn!("Ready callback panicked");
            }
        }

        self.emit(StatusEvent::DiscoverySucceeded(address.clone()));
    }

    /// Poll until stopped. Returns `false` when the retry policy gives up.
    async fn poll(self: &Arc<Self>, address: Address) -> bool {
        let policy: RetryPolicy = self.config.poll_retry;
        let id = address.last_element().to_string();
        let mut failures = 0u32;

        loop {
            if self.is_stopped() {
                return true;
            }

            self.emit(StatusEvent::PollStarted);
            let (mark, out_offset) = {
                let mut session = self.session.lock();
                (session.in_queue.mark(), session.out_queue.offset())
            };

            match self
                .communicator
                .reflect(&id, out_offset, mark.offset, &mark.messages)
                .await
            {
                Ok(inbound) => {
                    failures = 0;
                    let received = inbound.len();
                    if self.accept(inbound) {
                        tokio::spawn(Arc::clone(self).dispatch());
                    }
                    if received > 0 || !mark.messages.is_empty() {
                        debug!("Poll sent {}, received {}", mark.messages.len(), received);
                    }
                    self.emit(StatusEvent::PollSucceeded { received });
                    pause(self.config.poll_interval).await;
                }
                Err(e) => {
                    warn!("Poll failed: {}", e);
                    self.emit(StatusEvent::PollFailed(e));
                    failures = failures.saturating_add(1);
                    if !policy.allows(failures) {
                        return false;
                    }
                    pause(policy.delay).await;
                }
            }
        }
    }

    /// Record a successful exchange. Returns `true` if a dispatch task should
    /// be started.
    fn accept(&self, inbound: Vec<Message>) -> bool {
        let mut session = self.session.lock();
        for message in inbound {
            session.out_queue.add(message);
        }
        session.in_queue.forward();

        if session.dispatching || session.out_queue.is_empty() {
            return false;
        }
        session.dispatching = true;
        true
    }

    async fn dispatch(self: Arc<Self>) {
        loop {
            let next = {
                let mut session = self.session.lock();
                let next = session.out_queue.remove();
                if next.is_none() {
                    // Cleared under the same lock as the empty check
                    session.dispatching = false;
                }
                next
            };

            let Some(message) = next else {
                return;
            };
            self.deliver(&message);
            tokio::task::yield_now().await;
        }
    }

    fn deliver(&self, message: &Message) {
        let targets = self.listeners.lock().listeners_for(message.destination());
        if targets.is_empty() {
            debug!("No listener for {}", message.destination());
            return;
        }

        let closed: Vec<ListenerId> = targets
            .into_iter()
            .filter(|(_, listener)| !listener.deliver(message))
            .map(|(id, _)| id)
            .collect();

        if !closed.is_empty() {
            let mut registry = self.listeners.lock();
            for id in closed {
                registry.unregister(id);
            }
        }
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

// ============================================================================
// TESTS
// ============================================================================
