//! api
//!
//! Appliance API access: request descriptors, the [`Transport`] trait and
//! its implementations.
//!
//! - [`traits`] - `Transport`, `ApiRequest`, `TransportError`
//! - [`endpoints`] - pure request builders per resource kind
//! - [`http`] - reqwest transport
//! - [`mock`] - in-memory appliance for tests

pub mod endpoints;
pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpTransport;
pub use traits::{ApiRequest, Method, Transport, TransportError};
