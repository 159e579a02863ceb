//! Server-Sent Events transport for pool clients.
//!
//! Each `GET /` subscription gets a [`ClientStream`]: it turns messages
//! delivered to the client's sink into SSE frames, and when the HTTP
//! response is dropped (the client went away) it detaches the client and
//! unsubscribes the pool.

pub mod frame;
pub mod stream;

pub use stream::{ClientStream, DetachGuard};
