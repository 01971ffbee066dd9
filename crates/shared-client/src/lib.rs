//! HTTP client for calling dependent services.
//!
//! A [`Client`] is built once from a [`ClientConfig`](shared_config::ClientConfig)
//! and issues single-attempt GET/POST/PUT/DELETE requests relative to its
//! base URL. Every completed exchange, whatever its status code, comes back
//! as a [`Response`]; only configuration, encoding and transport problems
//! are [`ClientError`]s.

mod client;
mod error;
mod probe;
mod response;
mod service_error;

pub use client::{Client, Params};
pub use error::{ClientError, ConfigError};
pub use probe::ReadinessProbe;
pub use response::Response;
pub use service_error::ServiceError;
