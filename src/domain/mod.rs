//! Domain layer: messages, the publisher/subscriber contract, exchanges
//! and client pools.
//!
//! Exchanges and pools are actors. Each owns its collection inside a
//! private Tokio task and is driven only through the channels behind its
//! handle, so no locks guard broker state.

pub mod capability;
pub mod client_pool;
pub mod exchange;
pub mod ids;
pub mod message;

#[cfg(test)]
mod testing;

pub use capability::{Publisher, Subscriber};
pub use client_pool::{ClientPool, ClientSink, DistMethod, PoolOptions};
pub use exchange::Exchange;
pub use ids::{ClientId, SubscriberId};
pub use message::Message;
