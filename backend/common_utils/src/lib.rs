//! Shared utilities for the exchange gateway crates.

pub mod consts;
pub mod pii;
pub mod request;

pub use request::Method;
