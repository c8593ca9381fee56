//! Domain model for the exchange integration gateway: session types and
//! their static profiles, partner credentials, audit records, the vendor
//! response-code translator and the gateway error taxonomy.

pub mod errors;
pub mod response_codes;
pub mod session;
pub mod types;

pub use errors::{
    lift, ApiClientError, AuditError, CryptoError, CustomResult, ErrorCategory, ExchangeError,
    StoreError,
};
pub use response_codes::{parse_pipe_response, parse_response, throw_if_error, ApiResult};
pub use session::{SessionKey, SessionProfile, SessionTokenEntry, SessionType};
pub use types::{
    ApiCallRecord, DecryptedCredential, EncryptedSecret, HttpResponse, PartnerCredential,
};
