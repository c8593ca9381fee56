//! Audit sinks. The real deployment persists records through the platform's
//! store; these two cover local operation and tests.

use std::sync::Mutex;

use async_trait::async_trait;
use domain_types::{ApiCallRecord, AuditError};
use interfaces::AuditSink;

/// Emits each record as a structured tracing event.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: ApiCallRecord) -> Result<(), AuditError> {
        tracing::info!(
            owner_id = %record.owner_id,
            api_name = %record.api_name,
            endpoint = %record.endpoint,
            method = %record.method,
            status_code = ?record.status_code,
            latency_ms = record.latency_ms,
            error_message = ?record.error_message,
            "exchange api call"
        );
        Ok(())
    }
}

/// Collects records in memory; used by tests to assert on the audit trail.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<ApiCallRecord>>,
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: ApiCallRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::WriteFailed("audit sink poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}

impl MemoryAuditSink {
    pub fn records(&self) -> Vec<ApiCallRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use common_utils::request::Method;
    use time::OffsetDateTime;

    use super::*;

    fn sample_record() -> ApiCallRecord {
        ApiCallRecord {
            owner_id: "advisor-1".into(),
            api_name: "getPassword".into(),
            endpoint: "/MFOrderEntry/MFOrder.svc".into(),
            method: Method::Post,
            request_body: Some("<Password>***</Password>".into()),
            response_body: None,
            status_code: Some(200),
            latency_ms: 12,
            error_message: None,
            recorded_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn memory_sink_retains_records_in_order() {
        let sink = MemoryAuditSink::default();
        sink.record(sample_record()).await.unwrap();
        let mut second = sample_record();
        second.api_name = "orderEntry".into();
        sink.record(second).await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].api_name, "getPassword");
        assert_eq!(records[1].api_name, "orderEntry");
    }
}
