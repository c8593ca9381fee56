//! Sanitization of audit payloads before they reach the call log.
//!
//! Two shapes pass through here: raw SOAP envelopes (strings) and parsed
//! JSON bodies. Both must come out with credential fields and PAN-like
//! identifiers masked. The PAN pattern is the Indian tax id shape: five
//! letters, four digits, one letter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::consts::{MASK, PAN_MASK};

static PAN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").expect("valid PAN pattern"));

static SECRET_TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<((?:\w+:)?(?:Password|PassKey|EncryptedPassword))>[^<]*</(?:\w+:)?(?:Password|PassKey|EncryptedPassword)>",
    )
    .expect("valid secret tag pattern")
});

const SENSITIVE_KEYS: &[&str] = &["password", "passkey", "pass_key", "token", "pan", "encryptedpassword"];

/// Masks secret-bearing XML elements and PAN-shaped substrings in a raw
/// string payload.
pub fn sanitize_text(raw: &str) -> String {
    let masked_tags = SECRET_TAG_PATTERN.replace_all(raw, |caps: &regex::Captures<'_>| {
        format!("<{tag}>{MASK}</{tag}>", tag = &caps[1])
    });
    PAN_PATTERN.replace_all(&masked_tags, PAN_MASK).into_owned()
}

/// Masks sensitive keys and PAN-shaped string values in a structured
/// payload, recursing through nested objects and arrays.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String(MASK.to_string()))
                    } else {
                        (key.clone(), sanitize_json(inner))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_json).collect()),
        Value::String(text) => Value::String(sanitize_text(text)),
        other => other.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&lowered.as_str())
}
