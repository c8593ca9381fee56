use std::time::Duration;

use async_trait::async_trait;
use common_utils::request::Method;
use domain_types::{ApiCallRecord, ApiClientError, AuditError, CustomResult, HttpResponse};

/// One outbound SOAP call. The envelope arrives fully built; the transport
/// adds nothing but headers and the timeout.
#[derive(Debug)]
pub struct SoapCall<'a> {
    pub endpoint: &'a str,
    pub soap_action: &'a str,
    pub envelope: &'a str,
    pub owner_id: &'a str,
    pub api_name: &'a str,
    pub timeout: Duration,
}

/// One outbound JSON call against the exchange's REST surface.
#[derive(Debug)]
pub struct JsonCall<'a> {
    pub endpoint: &'a str,
    pub method: Method,
    pub body: Option<&'a serde_json::Value>,
    pub owner_id: &'a str,
    pub api_name: &'a str,
    pub headers: &'a [(String, String)],
    pub timeout: Duration,
}

#[async_trait]
pub trait SoapTransport: Send + Sync {
    async fn soap_request(
        &self,
        call: SoapCall<'_>,
    ) -> CustomResult<HttpResponse, ApiClientError>;
}

#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn json_request(
        &self,
        call: JsonCall<'_>,
    ) -> CustomResult<HttpResponse, ApiClientError>;
}

/// Append-only audit log. Records arrive sanitized; write failures are the
/// transport's problem to swallow, never the caller's.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: ApiCallRecord) -> Result<(), AuditError>;
}
