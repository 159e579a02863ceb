//! Request and response data transfer objects.

pub mod hub_dto;

pub use hub_dto::{ExtensionListResponse, HealthResponse, HubParams};
