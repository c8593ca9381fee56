//! Session types and their static profiles.
//!
//! The exchange hands out a distinct session token per service family, each
//! with its own login endpoint, SOAP action and lifetime. The profile is a
//! property of the type, resolved through one exhaustive `match` so adding a
//! session type without wiring its profile is a compile error.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Closed enumeration of exchange authentication families.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    /// Order placement, modification and cancellation.
    OrderEntry,
    /// KYC / FATCA / CKYC uploads and mandate registration.
    AdditionalServices,
    /// Document upload sessions; the exchange treats these as per-request.
    FileUpload,
    /// Order status polling; also per-request.
    StatusCheck,
}

/// Static wire parameters for one session type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProfile {
    pub login_endpoint: &'static str,
    pub login_action: &'static str,
    /// Local name of the XML element carrying the `code|token` result.
    pub result_tag: &'static str,
    /// `Duration::ZERO` marks a per-request token that is never cached.
    pub ttl: Duration,
}

const ORDER_ENTRY_ENDPOINT: &str = "/MFOrderEntry/MFOrder.svc";
const UPLOAD_SERVICE_ENDPOINT: &str = "/MFUploadService/MFUploadService.svc";
const FILE_UPLOAD_ENDPOINT: &str = "/StarMFFileUploadService/StarMFFileUploadService.svc";

impl SessionType {
    pub fn profile(self) -> SessionProfile {
        match self {
            Self::OrderEntry => SessionProfile {
                login_endpoint: ORDER_ENTRY_ENDPOINT,
                login_action: "http://bsestarmf.in/MFOrderEntry/getPassword",
                result_tag: "getPasswordResult",
                ttl: Duration::from_secs(60 * 60),
            },
            Self::AdditionalServices => SessionProfile {
                login_endpoint: UPLOAD_SERVICE_ENDPOINT,
                login_action: "http://bsestarmf.in/MFUploadService/getPassword",
                result_tag: "getPasswordResult",
                ttl: Duration::from_secs(5 * 60),
            },
            Self::FileUpload => SessionProfile {
                login_endpoint: FILE_UPLOAD_ENDPOINT,
                login_action: "http://bsestarmf.in/StarMFFileUploadService/getPassword",
                result_tag: "getPasswordResult",
                ttl: Duration::ZERO,
            },
            Self::StatusCheck => SessionProfile {
                login_endpoint: UPLOAD_SERVICE_ENDPOINT,
                login_action: "http://bsestarmf.in/MFUploadService/getPassword",
                result_tag: "getPasswordResult",
                ttl: Duration::ZERO,
            },
        }
    }

    pub fn is_cacheable(self) -> bool {
        !self.profile().ttl.is_zero()
    }
}

/// Cache and single-flight key: one token per (user, session type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: String,
    pub session_type: SessionType,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_type: SessionType) -> Self {
        Self {
            user_id: user_id.into(),
            session_type,
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.user_id, self.session_type)
    }
}

/// One cached token with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTokenEntry {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl SessionTokenEntry {
    /// Presence in the cache is not enough; expiry is re-checked on read.
    pub fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_request_types_have_zero_ttl() {
        assert!(!SessionType::FileUpload.is_cacheable());
        assert!(!SessionType::StatusCheck.is_cacheable());
        assert!(SessionType::OrderEntry.is_cacheable());
        assert!(SessionType::AdditionalServices.is_cacheable());
    }

    #[test]
    fn order_entry_outlives_additional_services() {
        let order = SessionType::OrderEntry.profile().ttl;
        let additional = SessionType::AdditionalServices.profile().ttl;
        assert!(order > additional);
    }

    #[test]
    fn expired_entry_is_not_live() {
        let now = OffsetDateTime::now_utc();
        let entry = SessionTokenEntry {
            token: "abc".into(),
            expires_at: now - time::Duration::seconds(1),
        };
        assert!(!entry.is_live(now));
        assert!(entry.is_live(now - time::Duration::seconds(2)));
    }

    #[test]
    fn session_key_display_matches_dedup_format() {
        let key = SessionKey::new("advisor-7", SessionType::OrderEntry);
        assert_eq!(key.to_string(), "advisor-7:ORDER_ENTRY");
    }
}
