//! Remote gateway: HTTP transport and typed TestRail operations.

pub mod client;
pub mod transport;

pub use client::{PAGE_LIMIT, TestRailClient, map_status};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport, TransportError};
