// Outbound clients for external services.

pub mod backend;

pub use backend::{BackendClientError, BackendReachability, HttpBackend};
