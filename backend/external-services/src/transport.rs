//! The exchange HTTP client.
//!
//! Both request paths share the same contract: enforce the caller's timeout,
//! surface a timeout as its own retryable error, hand back non-2xx statuses
//! as data for the response translator, and write a sanitized audit record
//! for every call including the ones that never reached HTTP.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use common_utils::{pii, request::Method};
use domain_types::{ApiCallRecord, ApiClientError, CustomResult, HttpResponse};
use error_stack::{report, Report, ResultExt};
use interfaces::{AuditSink, JsonCall, JsonTransport, SoapCall, SoapTransport};
use once_cell::sync::OnceCell;
use reqwest::Client;
use time::OffsetDateTime;

static SHARED_CLIENT: OnceCell<Client> = OnceCell::new();

fn shared_client() -> CustomResult<Client, ApiClientError> {
    Ok(SHARED_CLIENT
        .get_or_try_init(|| {
            Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .change_context(ApiClientError::RequestNotSent(
                    "failed to construct http client".to_string(),
                ))
        })?
        .clone())
}

fn classify_send_error(error: reqwest::Error) -> Report<ApiClientError> {
    if error.is_timeout() {
        report!(ApiClientError::RequestTimedOut)
    } else {
        report!(ApiClientError::RequestNotSent(error.to_string()))
    }
}

/// The request timeout also covers reading the body, so a deadline that
/// fires mid-read must still surface as a timeout, not a decode failure.
fn classify_read_error(error: reqwest::Error) -> Report<ApiClientError> {
    if error.is_timeout() {
        report!(ApiClientError::RequestTimedOut)
    } else {
        report!(ApiClientError::ResponseDecodingFailed)
    }
}

/// Transport client bound to one exchange deployment (base URL).
pub struct TransportClient {
    base_url: String,
    audit: Arc<dyn AuditSink>,
}

impl TransportClient {
    pub fn new(base_url: impl Into<String>, audit: Arc<dyn AuditSink>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, audit }
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Audit failures never propagate; the call itself already succeeded or
    /// failed on its own terms.
    async fn write_audit(&self, record: ApiCallRecord) {
        if let Err(err) = self.audit.record(record).await {
            tracing::warn!(error = %err, "failed to record exchange api call");
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn audit_call(
        &self,
        owner_id: &str,
        api_name: &str,
        endpoint: &str,
        method: Method,
        request_body: Option<String>,
        response_body: Option<String>,
        status_code: Option<u16>,
        started: Instant,
        error_message: Option<String>,
    ) {
        self.write_audit(ApiCallRecord {
            owner_id: owner_id.to_string(),
            api_name: api_name.to_string(),
            endpoint: endpoint.to_string(),
            method,
            request_body,
            response_body,
            status_code,
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            error_message,
            recorded_at: OffsetDateTime::now_utc(),
        })
        .await;
    }
}

#[async_trait]
impl SoapTransport for TransportClient {
    async fn soap_request(
        &self,
        call: SoapCall<'_>,
    ) -> CustomResult<HttpResponse, ApiClientError> {
        let url = self.url_for(call.endpoint);
        let started = Instant::now();

        let outcome: CustomResult<HttpResponse, ApiClientError> = async {
            let client = shared_client()?;
            let response = client
                .post(&url)
                .header("Content-Type", "application/soap+xml; charset=utf-8")
                .header("SOAPAction", call.soap_action)
                .body(call.envelope.to_string())
                .timeout(call.timeout)
                .send()
                .await
                .map_err(classify_send_error)?;
            let status_code = response.status().as_u16();
            let body = response.text().await.map_err(classify_read_error)?;
            Ok(HttpResponse {
                status_code,
                body,
                parsed: None,
            })
        }
        .await;

        match outcome {
            Ok(response) => {
                self.audit_call(
                    call.owner_id,
                    call.api_name,
                    &url,
                    Method::Post,
                    Some(pii::sanitize_text(call.envelope)),
                    Some(pii::sanitize_text(&response.body)),
                    Some(response.status_code),
                    started,
                    None,
                )
                .await;
                Ok(response)
            }
            Err(err) => {
                self.audit_call(
                    call.owner_id,
                    call.api_name,
                    &url,
                    Method::Post,
                    Some(pii::sanitize_text(call.envelope)),
                    None,
                    None,
                    started,
                    Some(err.to_string()),
                )
                .await;
                Err(err)
            }
        }
    }
}

#[async_trait]
impl JsonTransport for TransportClient {
    async fn json_request(
        &self,
        call: JsonCall<'_>,
    ) -> CustomResult<HttpResponse, ApiClientError> {
        let url = self.url_for(call.endpoint);
        let started = Instant::now();
        let sanitized_request = call
            .body
            .map(|body| pii::sanitize_json(body).to_string());

        let outcome: CustomResult<HttpResponse, ApiClientError> = async {
            let client = shared_client()?;
            let mut builder = match call.method {
                Method::Get => client.get(&url),
                Method::Post => client.post(&url),
            };
            builder = builder.header("Content-Type", "application/json");
            for (name, value) in call.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let (Method::Post, Some(body)) = (call.method, call.body) {
                builder = builder.json(body);
            }
            let response = builder
                .timeout(call.timeout)
                .send()
                .await
                .map_err(classify_send_error)?;
            let status_code = response.status().as_u16();
            let body = response.text().await.map_err(classify_read_error)?;
            // Best-effort only: an unparseable body degrades to raw text.
            let parsed = serde_json::from_str(&body).ok();
            Ok(HttpResponse {
                status_code,
                body,
                parsed,
            })
        }
        .await;

        match outcome {
            Ok(response) => {
                let sanitized_response = response
                    .parsed
                    .as_ref()
                    .map(|parsed| pii::sanitize_json(parsed).to_string())
                    .unwrap_or_else(|| pii::sanitize_text(&response.body));
                self.audit_call(
                    call.owner_id,
                    call.api_name,
                    &url,
                    call.method,
                    sanitized_request,
                    Some(sanitized_response),
                    Some(response.status_code),
                    started,
                    None,
                )
                .await;
                Ok(response)
            }
            Err(err) => {
                self.audit_call(
                    call.owner_id,
                    call.api_name,
                    &url,
                    call.method,
                    sanitized_request,
                    None,
                    None,
                    started,
                    Some(err.to_string()),
                )
                .await;
                Err(err)
            }
        }
    }
}
