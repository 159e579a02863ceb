//! Client pools: filtered subscriber groups.
//!
//! A [`ClientPool`] owns one compiled [`MatchSpec`] and a list of attached
//! [`ClientSink`]s. Like the exchange, its state lives in a private task
//! fed by channels, so attach, detach and delivery never race.
//!
//! Lifecycle: a pool becomes active when its first client attaches. When a
//! detach leaves it with no clients it unsubscribes itself from its parent,
//! shuts down its nested exchange and stops for good.
//!
//! Every pool also embeds an [`Exchange`]. Matched messages are forwarded
//! to it, and the pool's [`Publisher`] implementation delegates to it, so
//! further pools can subscribe beneath this one to refine the filter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use super::{ClientId, Exchange, Message, Publisher, Subscriber, SubscriberId};
use crate::error::HubError;
use crate::matcher::{MatchSpec, Matcher};

/// Default buffer size of a pool's inbox and control channels.
pub const DEFAULT_POOL_CAPACITY: usize = 256;

/// How a pool spreads a matched message across its clients.
///
/// Only [`DistMethod::Broadcast`] has defined behavior. The other methods
/// are accepted as configuration and currently deliver like broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DistMethod {
    /// Every client gets every matched message.
    #[default]
    Broadcast,
    /// Reserved: one random client per message.
    Random,
    /// Reserved: clients take turns.
    RoundRobin,
}

impl DistMethod {
    /// Configuration name of this method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Random => "random",
            Self::RoundRobin => "round-robin",
        }
    }
}

impl fmt::Display for DistMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistMethod {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broadcast" => Ok(Self::Broadcast),
            "random" => Ok(Self::Random),
            "round-robin" | "round_robin" => Ok(Self::RoundRobin),
            other => Err(HubError::InvalidRequest(format!(
                "unknown distribution method: {other}"
            ))),
        }
    }
}

/// A delivery target attached to a pool.
///
/// Wraps the sending half of a bounded channel; the transport owns the
/// receiving half. Delivery never waits: a full buffer drops the message
/// for this client only.
#[derive(Debug, Clone)]
pub struct ClientSink {
    id: ClientId,
    tx: mpsc::Sender<Message>,
}

impl ClientSink {
    /// Wraps an existing sender.
    #[must_use]
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self {
            id: ClientId::new(),
            tx,
        }
    }

    /// Creates a sink and the receiver the transport reads from.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Identity used to detach this sink.
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.id
    }

    fn offer(&self, message: Message) -> bool {
        self.tx.try_send(message).is_ok()
    }
}

/// Construction-time pool settings.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Deliver [`Message::ping`] to attached clients instead of the
    /// matched payload. Subscribers of the nested exchange still get the
    /// payload.
    pub ping_only: bool,
    /// Distribution across clients.
    pub dist_method: DistMethod,
    /// Buffer size of the pool's channels and nested exchange.
    pub capacity: usize,
    /// Matcher (and extension registry) used for this pool.
    pub matcher: Matcher,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            ping_only: false,
            dist_method: DistMethod::Broadcast,
            capacity: DEFAULT_POOL_CAPACITY,
            matcher: Matcher::default(),
        }
    }
}

#[derive(Debug)]
struct AttachRequest {
    client: ClientSink,
    applied: oneshot::Sender<()>,
}

#[derive(Debug)]
struct DetachRequest {
    client: ClientId,
    applied: oneshot::Sender<()>,
}

/// Handle to a running client pool.
#[derive(Debug, Clone)]
pub struct ClientPool {
    id: SubscriberId,
    spec: Arc<MatchSpec>,
    ping_only: bool,
    dist_method: DistMethod,
    attach_tx: mpsc::Sender<AttachRequest>,
    detach_tx: mpsc::Sender<DetachRequest>,
    inbox_tx: mpsc::Sender<Message>,
    exchange: Exchange,
}

impl ClientPool {
    /// Builds a broadcast pool with default options.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidSpec`] if `spec` is not a JSON object.
    pub fn new(parent: Arc<dyn Publisher>, spec: &str) -> Result<Self, HubError> {
        Self::with_options(parent, spec, PoolOptions::default())
    }

    /// Builds a pool and starts its coordination task.
    ///
    /// The pool is not subscribed anywhere yet; the caller subscribes it to
    /// `parent` (or elsewhere). `parent` is where the pool removes itself
    /// from once its last client detaches. Must be called from within a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidSpec`] if `spec` is not a JSON object. No
    /// task is started in that case.
    pub fn with_options(
        parent: Arc<dyn Publisher>,
        spec: &str,
        options: PoolOptions,
    ) -> Result<Self, HubError> {
        let spec = Arc::new(MatchSpec::parse(spec)?);
        let id = SubscriberId::new();
        if options.dist_method != DistMethod::Broadcast {
            tracing::warn!(
                pool_id = %id,
                dist_method = %options.dist_method,
                "distribution method not implemented, using broadcast"
            );
        }

        let capacity = options.capacity.max(1);
        let (attach_tx, attach_rx) = mpsc::channel(capacity);
        let (detach_tx, detach_rx) = mpsc::channel(capacity);
        let (inbox_tx, inbox_rx) = mpsc::channel(capacity);
        let exchange = Exchange::new(capacity);

        let task = PoolLoop {
            id,
            spec: Arc::clone(&spec),
            matcher: options.matcher,
            ping_only: options.ping_only,
            clients: Vec::new(),
            parent,
            exchange: exchange.clone(),
            attach_rx,
            detach_rx,
            inbox_rx,
        };
        tokio::spawn(task.run());
        tracing::debug!(pool_id = %id, ping_only = options.ping_only, "pool created");

        Ok(Self {
            id,
            spec,
            ping_only: options.ping_only,
            dist_method: options.dist_method,
            attach_tx,
            detach_tx,
            inbox_tx,
            exchange,
        })
    }

    /// Identity of this pool as a subscriber.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// The compiled specification.
    #[must_use]
    pub fn spec(&self) -> &MatchSpec {
        &self.spec
    }

    /// Whether clients receive [`Message::ping`] instead of content.
    #[must_use]
    pub fn ping_only(&self) -> bool {
        self.ping_only
    }

    /// Configured distribution method.
    #[must_use]
    pub fn dist_method(&self) -> DistMethod {
        self.dist_method
    }

    /// Returns `true` once the pool has terminated.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.attach_tx.is_closed()
    }

    /// Attaches a client sink and waits until the pool has registered it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::PoolClosed`] if the pool has already terminated.
    pub async fn attach(&self, client: ClientSink) -> Result<(), HubError> {
        let (applied, done) = oneshot::channel();
        let request = AttachRequest { client, applied };
        self.attach_tx
            .send(request)
            .await
            .map_err(|_| HubError::PoolClosed(self.id))?;
        done.await.map_err(|_| HubError::PoolClosed(self.id))
    }

    /// Detaches a client and waits until the removal has been applied.
    ///
    /// If that was the last client, this also waits for the pool to leave
    /// its parent. Returns immediately if the pool has already terminated.
    pub async fn detach(&self, client: ClientId) {
        let (applied, done) = oneshot::channel();
        let request = DetachRequest { client, applied };
        if self.detach_tx.send(request).await.is_err() {
            return;
        }
        let _ = done.await;
    }
}

impl Subscriber for ClientPool {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn receive(&self, message: Message) {
        match self.inbox_tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!(pool_id = %self.id, "pool inbox full, message dropped");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::trace!(pool_id = %self.id, "pool terminated, message dropped");
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.inbox_tx.is_closed()
    }
}

impl Publisher for ClientPool {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.exchange.subscribe(subscriber);
    }

    fn unsubscribe(&self, subscriber: SubscriberId) -> BoxFuture<'_, ()> {
        Box::pin(self.exchange.unsubscribe(subscriber))
    }

    fn publish(&self, message: Message) {
        self.exchange.publish(message);
    }
}

/// State owned by the pool's coordination task.
struct PoolLoop {
    id: SubscriberId,
    spec: Arc<MatchSpec>,
    matcher: Matcher,
    ping_only: bool,
    clients: Vec<ClientSink>,
    parent: Arc<dyn Publisher>,
    exchange: Exchange,
    attach_rx: mpsc::Receiver<AttachRequest>,
    detach_rx: mpsc::Receiver<DetachRequest>,
    inbox_rx: mpsc::Receiver<Message>,
}

impl PoolLoop {
    async fn run(mut self) {
        loop {
            tokio::select! {
                Some(request) = self.attach_rx.recv() => {
                    self.attach(request.client);
                    let _ = request.applied.send(());
                }
                Some(request) = self.detach_rx.recv() => {
                    self.detach(request.client);
                    if self.clients.is_empty() {
                        self.drain().await;
                        let _ = request.applied.send(());
                        return;
                    }
                    let _ = request.applied.send(());
                }
                Some(message) = self.inbox_rx.recv() => self.deliver(message),
                else => break,
            }
        }
        self.exchange.shutdown();
    }

    fn attach(&mut self, client: ClientSink) {
        tracing::debug!(pool_id = %self.id, client_id = %client.id(), "client attached");
        self.clients.push(client);
    }

    fn detach(&mut self, client: ClientId) {
        let before = self.clients.len();
        self.clients.retain(|c| c.id() != client);
        if self.clients.len() < before {
            tracing::debug!(pool_id = %self.id, client_id = %client, "client detached");
        }
    }

    async fn drain(&mut self) {
        tracing::debug!(pool_id = %self.id, "last client gone, pool draining");
        self.attach_rx.close();
        self.inbox_rx.close();
        self.parent.unsubscribe(self.id).await;
        self.exchange.shutdown();
        tracing::info!(pool_id = %self.id, "pool terminated");
    }

    fn deliver(&self, message: Message) {
        if !self.matcher.matches(&message, &self.spec) {
            tracing::trace!(pool_id = %self.id, "message did not match");
            return;
        }
        // Ping-only hides content from clients; nested pools still filter
        // on the full message.
        let outgoing = if self.ping_only {
            Message::ping()
        } else {
            message.clone()
        };
        for client in &self.clients {
            if !client.offer(outgoing.clone()) {
                tracing::trace!(
                    pool_id = %self.id,
                    client_id = %client.id(),
                    "client not ready, message dropped"
                );
            }
        }
        self.exchange.publish(message);
    }
}
