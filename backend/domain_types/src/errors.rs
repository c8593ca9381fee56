use strum::Display;
use thiserror::Error;

/// Alias used across the workspace for `error_stack` results.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Buckets the exchange's numeric response codes into the categories the
/// business layer dispatches on. Anything unmapped lands in `Internal` so an
/// unknown code can never read as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Registration,
    Order,
    Mandate,
    Payment,
    UpstreamSystem,
    Internal,
}

impl ErrorCategory {
    /// Range membership per the exchange's published code list.
    pub fn from_code(code: &str) -> Self {
        match code.trim().parse::<u16>() {
            Ok(101..=105) => Self::Authentication,
            Ok(106..=107) | Ok(127..=130) => Self::Registration,
            Ok(108..=119) => Self::Order,
            Ok(120..=122) => Self::Mandate,
            Ok(123..=126) => Self::Payment,
            Ok(201..=202) => Self::UpstreamSystem,
            _ => Self::Internal,
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            Self::Authentication => 401,
            Self::Registration | Self::Order | Self::Mandate | Self::Payment => 400,
            Self::UpstreamSystem => 503,
            Self::Internal => 500,
        }
    }
}

/// Transport-level failures. Only these raise out of the HTTP client; a
/// non-2xx exchange response is returned as data, never as an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiClientError {
    #[error("request timed out")]
    RequestTimedOut,
    #[error("failed to send request: {0}")]
    RequestNotSent(String),
    #[error("invalid endpoint url: {0}")]
    UrlEncodingFailed(String),
    #[error("failed to serialize request body")]
    BodySerializationFailed,
    #[error("failed to construct request headers")]
    HeaderMapConstructionFailed,
    #[error("failed to read response body")]
    ResponseDecodingFailed,
}

impl ApiClientError {
    /// Callers may retry a timeout; every other transport failure needs
    /// operator attention first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestTimedOut)
    }
}

/// Failures at the credential encryption boundary. Integrity failures are
/// fatal for that credential and must never be retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CryptoError {
    #[error("an encryption key is required for production operation")]
    KeyRequired,
    #[error("encryption key must be exactly 32 bytes")]
    InvalidKeyLength,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("ciphertext or iv is malformed")]
    MalformedCiphertext,
    #[error("authentication tag verification failed")]
    IntegrityCheckFailed,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuditError {
    #[error("failed to persist api call record: {0}")]
    WriteFailed(String),
}

/// The gateway error taxonomy. `Clone` is load-bearing: a failed session
/// refresh is fanned out to every awaiter of the in-flight entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExchangeError {
    #[error("exchange rejected the request ({category}, code {code}): {message}")]
    Vendor {
        category: ErrorCategory,
        code: String,
        message: String,
    },
    #[error("exchange credentials not configured for this user")]
    CredentialsNotConfigured,
    #[error("exchange credentials are inactive")]
    CredentialsInactive,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unparseable exchange response: {0}")]
    ResponseParseFailed(String),
    #[error("session refresh failed: {0}")]
    SessionRefreshFailed(String),
    #[error(transparent)]
    Transport(#[from] ApiClientError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Re-homes a collaborator failure under [`ExchangeError`] while keeping the
/// underlying report attached for context.
pub fn lift<T, E>(result: CustomResult<T, E>) -> CustomResult<T, ExchangeError>
where
    E: error_stack::Context + Clone,
    ExchangeError: From<E>,
{
    result.map_err(|report| {
        let context = ExchangeError::from(report.current_context().clone());
        report.change_context(context)
    })
}

impl ExchangeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_retryable())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Vendor { category, .. } => *category,
            Self::InvalidRequest(_) => ErrorCategory::Order,
            Self::Transport(_) | Self::SessionRefreshFailed(_) => ErrorCategory::UpstreamSystem,
            _ => ErrorCategory::Internal,
        }
    }
}
