//! Publisher/subscriber capability contract.
//!
//! These two traits are the whole surface the transport layer needs:
//! anything that can [`Subscriber::receive`] a message can be routed to,
//! and anything that is a [`Publisher`] can have subscribers and accept
//! published messages. Exchanges and client pools implement both, which is
//! what makes arbitrarily deep filtering trees possible.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{Message, SubscriberId};

/// Something that can be handed messages.
///
/// `receive` is called synchronously from a coordination loop, so
/// implementations must never block: hand the message off or drop it.
pub trait Subscriber: Send + Sync + fmt::Debug {
    /// Stable identity used to unsubscribe.
    fn id(&self) -> SubscriberId;

    /// Offers a message to this subscriber.
    fn receive(&self, message: Message);

    /// Returns `true` once this subscriber will never accept another
    /// message. Publishers drop closed subscribers from their sets.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Something that accepts subscribers and routes published messages to
/// them.
pub trait Publisher: Send + Sync + fmt::Debug {
    /// Requests that `subscriber` be added.
    ///
    /// Best effort: the request is dropped silently when the intake is
    /// saturated.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>);

    /// Removes the subscriber with the given id.
    ///
    /// The returned future resolves once the removal has been applied, so
    /// callers can rely on no further deliveries afterwards.
    fn unsubscribe(&self, subscriber: SubscriberId) -> BoxFuture<'_, ()>;

    /// Publishes a message. Dropped silently when the intake is saturated.
    fn publish(&self, message: Message);
}
