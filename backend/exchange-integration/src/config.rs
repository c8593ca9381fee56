//! Gateway configuration: layered file + environment sources, deserialized
//! into one struct with sandbox-safe defaults.

use domain_types::{CryptoError, CustomResult};
use error_stack::{report, ResultExt};
use masking::Secret;
use serde::Deserialize;
use thiserror::Error;

use crate::crypto::CredentialCipher;

pub const SANDBOX_BASE_URL: &str = "https://bsestarmfdemo.bseindia.com";
pub const PRODUCTION_BASE_URL: &str = "https://bsestarmf.in";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid gateway configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_environment")]
    pub environment: Environment,
    /// Namespace prefixes accepted on response envelope roots. Deployments
    /// facing a gateway that rewrites prefixes extend this list here rather
    /// than patching the parser.
    #[serde(default = "default_envelope_prefixes")]
    pub envelope_prefixes: Vec<String>,
    /// Base64-encoded 256-bit credential key. Mandatory in production.
    #[serde(default)]
    pub encryption_key: Option<Secret<String>>,
    /// Serve canned responses instead of calling the exchange.
    #[serde(default)]
    pub mock_mode: bool,
}

fn default_base_url() -> String {
    SANDBOX_BASE_URL.to_string()
}

fn default_environment() -> Environment {
    Environment::Sandbox
}

fn default_envelope_prefixes() -> Vec<String> {
    vec!["soap".to_string(), "s".to_string()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            environment: default_environment(),
            envelope_prefixes: default_envelope_prefixes(),
            encryption_key: None,
            mock_mode: false,
        }
    }
}

impl GatewayConfig {
    /// Loads `config/gateway.toml` if present, then environment variables
    /// prefixed `EXCHANGE_GATEWAY__`.
    pub fn load() -> CustomResult<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/gateway").required(false))
            .add_source(
                config::Environment::with_prefix("EXCHANGE_GATEWAY")
                    .try_parsing(true)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("envelope_prefixes"),
            )
            .build()
            .map_err(|err| report!(ConfigError::Invalid(err.to_string())))?;
        let config: Self = config
            .try_deserialize()
            .map_err(|err| report!(ConfigError::Invalid(err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CustomResult<(), ConfigError> {
        if self.envelope_prefixes.is_empty() {
            return Err(report!(ConfigError::Invalid(
                "envelope_prefixes must name at least one prefix".to_string()
            )));
        }
        if self.base_url.is_empty() {
            return Err(report!(ConfigError::Invalid(
                "base_url must not be empty".to_string()
            )));
        }
        Ok(())
    }

    /// Resolves the credential cipher. Production requires a configured key;
    /// the sandbox may fall back to an ephemeral one, with a warning, since
    /// everything encrypted under it dies with the process.
    pub fn credential_cipher(&self) -> CustomResult<CredentialCipher, CryptoError> {
        match &self.encryption_key {
            Some(key) => CredentialCipher::from_key(key)
                .attach_printable("configured encryption key is unusable"),
            None if self.environment == Environment::Production => {
                Err(report!(CryptoError::KeyRequired))
            }
            None => {
                tracing::warn!(
                    "no encryption key configured; using an ephemeral sandbox key, \
                     stored credentials will not survive a restart"
                );
                Ok(CredentialCipher::ephemeral())
            }
        }
    }
}
