//! Per-client SSE stream with disconnect cleanup.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::sse::Event;
use futures_util::Stream;
use tokio::sync::mpsc;

use super::frame;
use crate::domain::{ClientId, ClientPool, Exchange, Message};

/// Detaches a client from its pool and unsubscribes the pool from its
/// exchange when dropped.
///
/// Cleanup runs on a spawned task because `Drop` cannot await.
#[derive(Debug)]
pub struct DetachGuard {
    pool: ClientPool,
    exchange: Exchange,
    client: ClientId,
}

impl DetachGuard {
    /// Creates a guard for `client` attached to `pool`, which is
    /// subscribed to `exchange`.
    #[must_use]
    pub fn new(pool: ClientPool, exchange: Exchange, client: ClientId) -> Self {
        Self {
            pool,
            exchange,
            client,
        }
    }
}

impl Drop for DetachGuard {
    fn drop(&mut self) {
        let pool = self.pool.clone();
        let exchange = self.exchange.clone();
        let client = self.client;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                pool_id = %pool.id(),
                client_id = %client,
                "no runtime, client not detached"
            );
            return;
        };
        runtime.spawn(async move {
            pool.detach(client).await;
            exchange.unsubscribe(pool.id()).await;
            tracing::info!(
                pool_id = %pool.id(),
                client_id = %client,
                "client disconnected"
            );
        });
    }
}

/// Stream of SSE events for one client.
#[derive(Debug)]
pub struct ClientStream {
    rx: mpsc::Receiver<Message>,
    _guard: DetachGuard,
}

impl ClientStream {
    /// Wraps the client's delivery receiver. Dropping the stream drops
    /// `guard`.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<Message>, guard: DetachGuard) -> Self {
        Self { rx, _guard: guard }
    }
}

impl Stream for ClientStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
            .map(|next| next.map(to_event))
    }
}

fn to_event(message: Message) -> Result<Event, Infallible> {
    Ok(frame::message_event(&message))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;
    use crate::domain::{ClientSink, Publisher};

    #[tokio::test]
    async fn dropping_the_stream_closes_the_pool() {
        let exchange = Exchange::new(16);
        let parent: Arc<dyn Publisher> = Arc::new(exchange.clone());
        let Ok(pool) = ClientPool::new(parent, "{}") else {
            panic!("pool should build");
        };
        exchange.subscribe(Arc::new(pool.clone()));
        let (sink, rx) = ClientSink::channel(4);
        let client = sink.id();
        if pool.attach(sink).await.is_err() {
            panic!("attach failed");
        }

        let stream = ClientStream::new(rx, DetachGuard::new(pool.clone(), exchange, client));
        drop(stream);

        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while !pool.is_closed() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(closed.is_ok(), "pool should terminate after disconnect");
    }

    #[tokio::test]
    async fn yields_one_event_per_delivery() {
        let exchange = Exchange::new(16);
        let parent: Arc<dyn Publisher> = Arc::new(exchange.clone());
        let Ok(pool) = ClientPool::new(parent, "{}") else {
            panic!("pool should build");
        };
        let (tx, rx) = mpsc::channel(4);
        let mut stream = ClientStream::new(rx, DetachGuard::new(pool, exchange, ClientId::new()));

        let _ = tx.send(Message::from("{\"a\":\n1}")).await;
        drop(tx);
        let Some(Ok(_event)) = stream.next().await else {
            panic!("expected an event");
        };
        assert!(stream.next().await.is_none());
    }
}
