//! Test doubles shared by the domain tests.

#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;

use super::{Message, Publisher, Subscriber, SubscriberId};

const SETTLE: Duration = Duration::from_millis(100);
const DEADLINE: Duration = Duration::from_secs(5);

/// Subscriber that forwards everything it receives into a channel.
#[derive(Debug)]
pub struct RecordingSubscriber {
    id: SubscriberId,
    tx: mpsc::UnboundedSender<Message>,
}

impl RecordingSubscriber {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: SubscriberId::new(),
                tx,
            },
            rx,
        )
    }
}

impl Subscriber for RecordingSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn receive(&self, message: Message) {
        let _ = self.tx.send(message);
    }
}

/// Parent publisher that records unsubscribe calls.
#[derive(Debug, Default)]
pub struct RecordingParent {
    unsubscribed: Mutex<Vec<SubscriberId>>,
}

impl RecordingParent {
    pub fn unsubscribed(&self) -> Vec<SubscriberId> {
        self.unsubscribed
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

impl Publisher for RecordingParent {
    fn subscribe(&self, _subscriber: Arc<dyn Subscriber>) {}

    fn unsubscribe(&self, subscriber: SubscriberId) -> BoxFuture<'_, ()> {
        if let Ok(mut ids) = self.unsubscribed.lock() {
            ids.push(subscriber);
        }
        Box::pin(async {})
    }

    fn publish(&self, _message: Message) {}
}

/// Publishes `message` to `target` until `rx` yields it.
///
/// Subscription is asynchronous, so the first publishes may race ahead of
/// it; retrying is how a caller observes that a subscribe has landed.
pub async fn publish_until_received<P: Publisher + ?Sized, T: Receiver>(
    target: &P,
    message: &Message,
    rx: &mut T,
) {
    let attempt = async {
        loop {
            target.publish(message.clone());
            let next = tokio::time::timeout(Duration::from_millis(50), rx.next());
            if matches!(next.await, Ok(Some(got)) if got == *message) {
                return;
            }
        }
    };
    if tokio::time::timeout(DEADLINE, attempt).await.is_err() {
        panic!("message {message} was never delivered");
    }
}

/// Discards messages until the channel has been quiet for a short while.
pub async fn drain<T: Receiver>(rx: &mut T) {
    while let Ok(Some(_)) = tokio::time::timeout(SETTLE, rx.next()).await {}
}

/// Asserts nothing arrives within a short window.
pub async fn assert_silent<T: Receiver>(rx: &mut T) {
    if let Ok(Some(message)) = tokio::time::timeout(SETTLE, rx.next()).await {
        panic!("unexpected delivery: {message}");
    }
}

/// Common surface of bounded and unbounded message receivers.
pub trait Receiver: Send {
    fn next(&mut self) -> impl std::future::Future<Output = Option<Message>> + Send;
}

impl Receiver for mpsc::Receiver<Message> {
    fn next(&mut self) -> impl std::future::Future<Output = Option<Message>> + Send {
        self.recv()
    }
}

impl Receiver for mpsc::UnboundedReceiver<Message> {
    fn next(&mut self) -> impl std::future::Future<Output = Option<Message>> + Send {
        self.recv()
    }
}
