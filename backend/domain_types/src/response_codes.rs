//! Translates the exchange's response codes into a structured result.
//!
//! The exchange signals success with the literal code `"100"` on both
//! protocols. REST responses carry the code in a JSON field; SOAP responses
//! carry a pipe-delimited `code|message|data...` string. The code-to-message
//! fallback table is static configuration data embedded at build time, not
//! logic.

use std::collections::HashMap;

use error_stack::report;
use once_cell::sync::Lazy;

use crate::errors::{CustomResult, ErrorCategory, ExchangeError};

/// Vendor success sentinel, identical for SOAP and REST responses.
pub const SUCCESS_CODE: &str = "100";

static CODE_MESSAGES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("response_codes.json"))
        .expect("embedded response code table is valid json")
});

/// Structured outcome of one exchange call. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResult {
    pub success: bool,
    pub code: String,
    pub message: String,
    /// Auxiliary pipe segments after the message (order numbers etc.).
    pub data: Vec<String>,
}

/// Fallback human text for a vendor code, if the code is known.
pub fn vendor_message(code: &str) -> Option<&'static str> {
    CODE_MESSAGES.get(code).map(String::as_str)
}

/// REST path: the vendor code arrives as its own field, the message is
/// optional and falls back to the static table.
pub fn parse_response(code: &str, message: Option<&str>) -> ApiResult {
    let code = code.trim().to_string();
    let message = message
        .map(str::to_string)
        .or_else(|| vendor_message(&code).map(str::to_string))
        .unwrap_or_else(|| format!("Unmapped exchange response code {code}"));
    ApiResult {
        success: code == SUCCESS_CODE,
        code,
        message,
        data: Vec::new(),
    }
}

/// SOAP path: `code|message|data...`. The first segment is the code, the
/// second the message, everything after is auxiliary data. A missing code
/// never reads as success.
pub fn parse_pipe_response(raw: &str) -> ApiResult {
    let mut segments = raw.trim().split('|');
    let code = segments.next().unwrap_or_default().trim().to_string();
    let message = match segments.next() {
        Some(msg) if !msg.trim().is_empty() => msg.trim().to_string(),
        _ => vendor_message(&code)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unmapped exchange response code {code}")),
    };
    let data = segments.map(|s| s.trim().to_string()).collect();
    ApiResult {
        success: code == SUCCESS_CODE,
        code,
        message,
        data,
    }
}

/// Raises a categorized error for a non-success result, selecting the
/// category by code-range membership.
pub fn throw_if_error(result: &ApiResult) -> CustomResult<(), ExchangeError> {
    if result.success {
        return Ok(());
    }
    Err(report!(ExchangeError::Vendor {
        category: ErrorCategory::from_code(&result.code),
        code: result.code.clone(),
        message: result.message.clone(),
    }))
}
