//! Exchange: routes every published message to its current subscribers.
//!
//! The subscriber set lives inside a private task and is only ever touched
//! there. The [`Exchange`] handle talks to that task over three bounded
//! channels (subscribe, unsubscribe, publish); the task takes one event at
//! a time, in whichever order the channels become ready.
//!
//! `subscribe` and `publish` never wait: when the intake is full the
//! request is dropped. `unsubscribe` waits until the removal is applied.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc, oneshot};

use super::{Message, Publisher, Subscriber, SubscriberId};

/// Default buffer size of each exchange intake channel.
pub const DEFAULT_EXCHANGE_CAPACITY: usize = 1024;

#[derive(Debug)]
struct RemoveRequest {
    subscriber: SubscriberId,
    applied: oneshot::Sender<()>,
}

/// Handle to a running exchange.
///
/// Clones refer to the same exchange. The coordination task stops when
/// [`Exchange::shutdown`] is called or every handle has been dropped.
#[derive(Debug, Clone)]
pub struct Exchange {
    id: SubscriberId,
    add_tx: mpsc::Sender<Arc<dyn Subscriber>>,
    remove_tx: mpsc::Sender<RemoveRequest>,
    publish_tx: mpsc::Sender<Message>,
    shutdown: Arc<Notify>,
}

impl Exchange {
    /// Spawns a new exchange whose intake channels each buffer up to
    /// `capacity` requests (at least one).
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (add_tx, add_rx) = mpsc::channel(capacity);
        let (remove_tx, remove_rx) = mpsc::channel(capacity);
        let (publish_tx, publish_rx) = mpsc::channel(capacity);
        let shutdown = Arc::new(Notify::new());
        let id = SubscriberId::new();

        let task = ExchangeLoop {
            id,
            subscribers: Vec::new(),
            add_rx,
            remove_rx,
            publish_rx,
            shutdown: Arc::clone(&shutdown),
        };
        tokio::spawn(task.run());

        Self {
            id,
            add_tx,
            remove_tx,
            publish_tx,
            shutdown,
        }
    }

    /// Identity of this exchange when it is itself used as a subscriber.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Requests that `subscriber` be added. Dropped if the intake is full.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        match self.add_tx.try_send(subscriber) {
            Ok(()) => {}
            Err(TrySendError::Full(subscriber)) => {
                tracing::debug!(
                    exchange_id = %self.id,
                    subscriber_id = %subscriber.id(),
                    "subscribe dropped: intake full"
                );
            }
            Err(TrySendError::Closed(subscriber)) => {
                tracing::debug!(
                    exchange_id = %self.id,
                    subscriber_id = %subscriber.id(),
                    "subscribe dropped: exchange stopped"
                );
            }
        }
    }

    /// Removes `subscriber` and waits until the removal has been applied.
    ///
    /// Returns immediately if the exchange has stopped.
    pub async fn unsubscribe(&self, subscriber: SubscriberId) {
        let (applied, done) = oneshot::channel();
        let request = RemoveRequest {
            subscriber,
            applied,
        };
        if self.remove_tx.send(request).await.is_err() {
            return;
        }
        let _ = done.await;
    }

    /// Hands `message` to the exchange. Dropped if the intake is full.
    pub fn publish(&self, message: Message) {
        if let Err(err) = self.publish_tx.try_send(message) {
            let reason = match err {
                TrySendError::Full(_) => "intake full",
                TrySendError::Closed(_) => "exchange stopped",
            };
            tracing::debug!(exchange_id = %self.id, reason, "publish dropped");
        }
    }

    /// Stops the coordination task. Subscribers are released and later
    /// requests are ignored.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Returns `true` once the coordination task has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.publish_tx.is_closed()
    }
}

impl Subscriber for Exchange {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn receive(&self, message: Message) {
        self.publish(message);
    }

    fn is_closed(&self) -> bool {
        Exchange::is_closed(self)
    }
}

impl Publisher for Exchange {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        Exchange::subscribe(self, subscriber);
    }

    fn unsubscribe(&self, subscriber: SubscriberId) -> BoxFuture<'_, ()> {
        Box::pin(Exchange::unsubscribe(self, subscriber))
    }

    fn publish(&self, message: Message) {
        Exchange::publish(self, message);
    }
}

/// State owned by the coordination task.
struct ExchangeLoop {
    id: SubscriberId,
    subscribers: Vec<Arc<dyn Subscriber>>,
    add_rx: mpsc::Receiver<Arc<dyn Subscriber>>,
    remove_rx: mpsc::Receiver<RemoveRequest>,
    publish_rx: mpsc::Receiver<Message>,
    shutdown: Arc<Notify>,
}

impl ExchangeLoop {
    async fn run(mut self) {
        tracing::debug!(exchange_id = %self.id, "exchange running");
        loop {
            tokio::select! {
                Some(subscriber) = self.add_rx.recv() => self.add(subscriber),
                Some(request) = self.remove_rx.recv() => self.remove(request),
                message = self.publish_rx.recv() => match message {
                    Some(message) => self.dispatch(message),
                    // Every handle is gone.
                    None => break,
                },
                () = self.shutdown.notified() => break,
            }
        }
        tracing::debug!(
            exchange_id = %self.id,
            subscribers = self.subscribers.len(),
            "exchange stopped"
        );
    }

    fn add(&mut self, subscriber: Arc<dyn Subscriber>) {
        let id = subscriber.id();
        if subscriber.is_closed() {
            tracing::debug!(
                exchange_id = %self.id,
                subscriber_id = %id,
                "closed subscriber ignored"
            );
            return;
        }
        self.subscribers.retain(|s| s.id() != id);
        self.subscribers.push(subscriber);
        tracing::debug!(exchange_id = %self.id, subscriber_id = %id, "subscriber added");
    }

    fn remove(&mut self, request: RemoveRequest) {
        // Adds queued before this request was sent must not outlive it.
        while let Ok(subscriber) = self.add_rx.try_recv() {
            self.add(subscriber);
        }
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id() != request.subscriber);
        if self.subscribers.len() < before {
            tracing::debug!(
                exchange_id = %self.id,
                subscriber_id = %request.subscriber,
                "subscriber removed"
            );
        }
        let _ = request.applied.send(());
    }

    fn dispatch(&mut self, message: Message) {
        let exchange_id = self.id;
        self.subscribers.retain(|subscriber| {
            if subscriber.is_closed() {
                tracing::debug!(
                    exchange_id = %exchange_id,
                    subscriber_id = %subscriber.id(),
                    "closed subscriber pruned"
                );
                return false;
            }
            tracing::trace!(
                exchange_id = %exchange_id,
                subscriber_id = %subscriber.id(),
                "offering message"
            );
            subscriber.receive(message.clone());
            true
        });
    }
}
