//! HTTP transport to the exchange and the audit sinks it writes through.

pub mod audit;
pub mod transport;

pub use audit::{MemoryAuditSink, TracingAuditSink};
pub use transport::TransportClient;
