use std::time::Duration;

/// Default bound on every outbound exchange call. Callers with slower legs
/// (uploads, payment initiation) extend it per call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Subtracted from a token's TTL to guard against clock skew and in-flight
/// latency near the expiry boundary.
pub const SESSION_SAFETY_BUFFER: Duration = Duration::from_secs(60);

/// Replacement for masked secret values in audit payloads.
pub const MASK: &str = "***";
/// Replacement for PAN-shaped identifiers in audit payloads.
pub const PAN_MASK: &str = "***PAN***";

/// Width of the zero-padded per-member-per-day order sequence.
pub const REFERENCE_SEQUENCE_DIGITS: usize = 6;
