//! Core data carriers shared across the gateway.

use common_utils::request::Method;
use masking::Secret;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A symmetric ciphertext at rest: `<ciphertext_b64>:<tag_b64>` plus the
/// initialization vector stored alongside, separately, in base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    pub ciphertext: String,
    pub iv: String,
}

/// One platform user's exchange account, created at onboarding. The password
/// and pass-key only ever exist in plaintext inside the crypto boundary's
/// immediate caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerCredential {
    pub user_id: String,
    pub exchange_user_id: String,
    pub member_id: String,
    pub arn: String,
    pub euin: Option<String>,
    pub password: EncryptedSecret,
    pub pass_key: EncryptedSecret,
    pub active: bool,
}

/// Decrypted view handed to the login flow. Secrets stay wrapped so an
/// accidental `Debug` print cannot leak them.
#[derive(Clone)]
pub struct DecryptedCredential {
    pub exchange_user_id: String,
    pub member_id: String,
    pub arn: String,
    pub euin: Option<String>,
    pub password: Secret<String>,
    pub pass_key: Secret<String>,
}

/// Immutable audit entry written after every outbound call, success or not.
/// Payloads arrive here already sanitized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCallRecord {
    pub owner_id: String,
    pub api_name: String,
    pub endpoint: String,
    pub method: Method,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    /// `None` when the call failed below HTTP (DNS, refusal, timeout).
    pub status_code: Option<u16>,
    pub latency_ms: u64,
    pub error_message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// What the transport hands back. Non-2xx statuses are data, not errors;
/// `parsed` is best-effort and only populated on the JSON path.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    pub parsed: Option<serde_json::Value>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
