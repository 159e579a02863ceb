//! # jsonhub
//!
//! Content-based publish/subscribe broker for JSON messages.
//!
//! Clients subscribe with a *match specification*: a JSON object
//! describing the structure and values a message must have. Every
//! published message is offered to each subscribed pool, which delivers it
//! to its clients only if the message satisfies the pool's specification.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP GET = subscribe over SSE, POST = publish)
//!     │
//!     ├── HTTP handlers (api/) + SSE streams (sse/)
//!     │
//!     ├── Exchange (domain/)      one task, owns its subscriber set
//!     │     └── ClientPool        one task per pool, owns its clients
//!     │           ├── Matcher (matcher/) + extension registry
//!     │           └── nested Exchange → further pools
//!     │
//!     └── Client sinks (bounded channels, drop when full)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod matcher;
pub mod sse;
