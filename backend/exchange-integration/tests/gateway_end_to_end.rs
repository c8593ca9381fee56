//! End-to-end: the real HTTP transport against a local listener, asserting
//! the full login flow and the sanitized audit trail it leaves behind.

use std::sync::Arc;

use common_utils::request::Method;
use domain_types::{PartnerCredential, SessionType};
use exchange_integration::{
    CredentialCipher, MemoryCredentialStore, MemorySessionStore, SessionManager,
};
use external_services::{MemoryAuditSink, TransportClient};
use interfaces::{AuditSink, CredentialStore, JsonCall, JsonTransport, SessionStore, SoapTransport};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

const LOGIN_RESPONSE_BODY: &str = r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope"><soap:Body><getPasswordResponse xmlns="http://bsestarmf.in/"><getPasswordResult>100|SESSION-TOKEN-42</getPasswordResult></getPasswordResponse></soap:Body></soap:Envelope>"#;

/// Serves exactly one HTTP request, capturing it and replying with `body`.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            request.extend_from_slice(&chunk[..n]);
            if n == 0 || request_is_complete(&request) {
                break;
            }
        }
        let response = format!(
            "{status_line}\r\nContent-Type: application/soap+xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len(),
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });
    (base_url, handle)
}

fn request_is_complete(raw: &[u8]) -> bool {
    let Some(header_end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&raw[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    raw.len() >= header_end + 4 + content_length
}

async fn manager_against(base_url: &str, audit: Arc<MemoryAuditSink>) -> SessionManager {
    let cipher = Arc::new(CredentialCipher::ephemeral());
    let credentials = Arc::new(MemoryCredentialStore::default());
    credentials
        .upsert(PartnerCredential {
            user_id: "advisor-1".into(),
            exchange_user_id: "1010101".into(),
            member_id: "10123".into(),
            arn: "ARN-12345".into(),
            euin: None,
            password: cipher.encrypt("real-password").unwrap(),
            pass_key: cipher.encrypt("real-pass-key").unwrap(),
            active: true,
        })
        .await
        .unwrap();

    let transport = Arc::new(TransportClient::new(base_url, audit));
    SessionManager::new(
        credentials,
        Arc::new(MemorySessionStore::default()) as Arc<dyn SessionStore>,
        transport as Arc<dyn SoapTransport>,
        cipher,
        vec!["soap".to_string(), "s".to_string()],
    )
}

#[tokio::test]
async fn login_round_trip_yields_token_and_sanitized_audit() {
    let (base_url, server) = serve_once("HTTP/1.1 200 OK", LOGIN_RESPONSE_BODY).await;
    let audit = Arc::new(MemoryAuditSink::default());
    let manager = manager_against(&base_url, Arc::clone(&audit)).await;

    let token = manager
        .get_token("advisor-1", SessionType::OrderEntry)
        .await
        .unwrap();
    assert_eq!(token, "SESSION-TOKEN-42");

    // The wire request carried the real secrets and the right action.
    let request = server.await.unwrap();
    assert!(request.contains("POST /MFOrderEntry/MFOrder.svc"));
    assert!(request.contains("http://bsestarmf.in/MFOrderEntry/getPassword"));
    assert!(request.contains("<ns:Password>real-password</ns:Password>"));

    // The audit record did not.
    let records = audit.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.api_name, "getPassword");
    assert_eq!(record.status_code, Some(200));
    let request_body = record.request_body.as_deref().unwrap();
    assert!(!request_body.contains("real-password"));
    assert!(!request_body.contains("real-pass-key"));
    assert!(request_body.contains("<ns:Password>***</ns:Password>"));
}

#[tokio::test]
async fn vendor_rejection_is_translated_even_on_http_200() {
    let (base_url, _server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><getPasswordResponse><getPasswordResult>101|Invalid password</getPasswordResult></getPasswordResponse></s:Body></s:Envelope>"#,
    )
    .await;
    let audit = Arc::new(MemoryAuditSink::default());
    let manager = manager_against(&base_url, audit).await;

    let err = manager
        .get_token("advisor-1", SessionType::OrderEntry)
        .await
        .unwrap_err();
    assert!(matches!(
        err.current_context(),
        domain_types::ExchangeError::Vendor { code, .. } if code == "101"
    ));
}

#[tokio::test]
async fn non_xml_error_page_is_a_parse_failure_not_a_panic() {
    let (base_url, _server) =
        serve_once("HTTP/1.1 503 Service Unavailable", "upstream maintenance").await;
    let audit = Arc::new(MemoryAuditSink::default());
    let manager = manager_against(&base_url, Arc::clone(&audit)).await;

    let err = manager
        .get_token("advisor-1", SessionType::OrderEntry)
        .await
        .unwrap_err();
    assert!(matches!(
        err.current_context(),
        domain_types::ExchangeError::ResponseParseFailed(_)
    ));

    // The failed call is still audited, with its HTTP status.
    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status_code, Some(503));
}

#[tokio::test]
async fn timeout_during_body_read_is_still_a_retryable_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    // Headers promise more body than ever arrives; the connection then stalls
    // until well past the caller's deadline.
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut chunk = [0u8; 4096];
        let _ = socket.read(&mut chunk).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 4096\r\nContent-Type: application/soap+xml\r\n\r\n<soap:",
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    });

    let audit = Arc::new(MemoryAuditSink::default());
    let transport = TransportClient::new(&base_url, Arc::clone(&audit) as Arc<dyn AuditSink>);
    let err = transport
        .soap_request(interfaces::SoapCall {
            endpoint: "/MFOrderEntry/MFOrder.svc",
            soap_action: "http://bsestarmf.in/MFOrderEntry/getPassword",
            envelope: "<soap:Envelope/>",
            owner_id: "advisor-1",
            api_name: "getPassword",
            timeout: std::time::Duration::from_millis(200),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.current_context(),
        &domain_types::ApiClientError::RequestTimedOut
    );
    assert!(err.current_context().is_retryable());

    // Audited as a below-HTTP failure: no status, an error message.
    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status_code, None);
    assert!(records[0].error_message.is_some());
}

#[tokio::test]
async fn json_path_parses_bodies_and_masks_audit_payloads() {
    let (base_url, _server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"Status":"100","Token":"abc123","Remarks":"pan ABCDE1234F on file"}"#,
    )
    .await;
    let audit = Arc::new(MemoryAuditSink::default());
    let transport = TransportClient::new(&base_url, Arc::clone(&audit) as Arc<dyn AuditSink>);

    let body = serde_json::json!({ "UserId": "1010101", "Password": "real-password" });
    let response = transport
        .json_request(JsonCall {
            endpoint: "/StarMFWebService/api",
            method: Method::Post,
            body: Some(&body),
            owner_id: "advisor-1",
            api_name: "statusQuery",
            headers: &[],
            timeout: std::time::Duration::from_secs(30),
        })
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    let parsed = response.parsed.expect("json body should parse");
    assert_eq!(parsed["Status"], "100");

    let records = audit.records();
    assert_eq!(records.len(), 1);
    let request_body = records[0].request_body.as_deref().unwrap();
    assert!(!request_body.contains("real-password"));
    let response_body = records[0].response_body.as_deref().unwrap();
    assert!(response_body.contains("***PAN***"));
    assert!(!response_body.contains("abc123"));
}
