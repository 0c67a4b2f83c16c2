//! 감사 서비스 전송 계층
//!
//! [`AuditTransport`]는 페이로드를 엔드포인트로 보내고 원시 응답 JSON을 돌려받는
//! 경계입니다. 클라이언트는 재시도하지 않으며, 재시도 정책은 전송 구현이 가집니다.
//!
//! [`HttpTransport`]는 npm CLI와 호환되는 헤더로 POST 요청을 보냅니다.
//!
//! | 상태 | 결과 |
//! |---|---|
//! | 200 | 본문을 JSON으로 디코딩 (실패 시 `ResponseRejected`) |
//! | 503 | `max_retries`까지 선형 지연 후 재시도, 이후 `TransportFailure` |
//! | 400 | `ResponseRejected` (잘못된 페이로드) |
//! | 그 외 / 연결 실패 | `TransportFailure` |

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::BulkAuditConfig;
use crate::error::BulkAuditError;

/// 감사 요청 전송 경계
pub trait AuditTransport: Send + Sync {
    /// 페이로드를 `endpoint`로 보내고 응답 JSON을 반환합니다.
    fn submit(&self, endpoint: &str, payload: &Value) -> Result<Value, BulkAuditError>;
}

/// reqwest blocking 기반 HTTP 전송
pub struct HttpTransport {
    client: Client,
    user_agent: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpTransport {
    /// 설정에서 HTTP 전송을 생성합니다.
    ///
    /// # Errors
    ///
    /// HTTP 클라이언트 생성 실패 시 `BulkAuditError::Config`
    pub fn new(config: &BulkAuditConfig) -> Result<Self, BulkAuditError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BulkAuditError::Config {
                field: "http_client".to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    fn transport_failure(endpoint: &str, reason: impl Into<String>) -> BulkAuditError {
        BulkAuditError::TransportFailure {
            endpoint: endpoint.to_owned(),
            reason: reason.into(),
        }
    }
}

impl AuditTransport for HttpTransport {
    fn submit(&self, endpoint: &str, payload: &Value) -> Result<Value, BulkAuditError> {
        let session = npm_session();
        let mut attempt: u32 = 0;

        loop {
            debug!(endpoint, attempt, "posting bulk audit payload");

            let response = self
                .client
                .post(endpoint)
                .header(USER_AGENT, &self.user_agent)
                .header("npm-in-ci", "false")
                .header("npm-scope", "")
                .header("npm-session", &session)
                .json(payload)
                .send()
                .map_err(|e| Self::transport_failure(endpoint, e.to_string()))?;

            match response.status() {
                StatusCode::OK => {
                    return response.json::<Value>().map_err(|e| {
                        BulkAuditError::ResponseRejected(format!("undecodable response body: {e}"))
                    });
                }
                StatusCode::SERVICE_UNAVAILABLE if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay * attempt;
                    warn!(
                        endpoint,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "audit service unavailable, retrying"
                    );
                    std::thread::sleep(delay);
                }
                StatusCode::SERVICE_UNAVAILABLE => {
                    return Err(Self::transport_failure(
                        endpoint,
                        format!("service unavailable after {attempt} retries"),
                    ));
                }
                StatusCode::BAD_REQUEST => {
                    return Err(BulkAuditError::ResponseRejected(
                        "invalid payload submitted".to_owned(),
                    ));
                }
                status => {
                    return Err(Self::transport_failure(
                        endpoint,
                        format!("unexpected status {status}"),
                    ));
                }
            }
        }
    }
}

/// `npm-session` 헤더 값 (16자리 16진수)
fn npm_session() -> String {
    Uuid::new_v4().simple().to_string().chars().take(16).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use serde_json::json;

    const OK_EMPTY: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}";
    const UNAVAILABLE: &str =
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const BAD_REQUEST: &str =
        "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const SERVER_ERROR: &str =
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const GARBAGE: &str =
        "HTTP/1.1 200 OK\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot json!";

    fn read_request(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
            request.push_str(&lower);
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        request.push_str(&String::from_utf8(body).unwrap());
        request
    }

    /// 연결마다 준비된 응답 하나를 돌려주는 테스트 서버
    fn serve(responses: Vec<&'static str>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                requests.push(read_request(&stream));
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            requests
        });
        (format!("http://{addr}/-/npm/v1/security/advisories/bulk"), handle)
    }

    fn transport(max_retries: u32) -> HttpTransport {
        let config = BulkAuditConfig {
            max_retries,
            retry_delay_ms: 0,
            timeout_secs: 5,
            ..Default::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn npm_session_is_16_hex_chars() {
        let session = npm_session();
        assert_eq!(session.len(), 16);
        assert!(session.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(session, npm_session());
    }

    #[test]
    fn ok_response_is_decoded_and_headers_sent() {
        let (url, server) = serve(vec![OK_EMPTY]);
        let payload = json!({ "ms": ["2.0.0"] });

        let response = transport(0).submit(&url, &payload).unwrap();
        assert_eq!(response, json!({}));

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.starts_with("post /-/npm/v1/security/advisories/bulk"));
        assert!(request.contains("npm-in-ci: false"));
        assert!(request.contains("npm-scope:"));
        assert!(request.contains("npm-session: "));
        assert!(request.contains("content-type: application/json"));
        assert!(request.contains("user-agent: npm/"));
        assert!(request.ends_with(r#"{"ms":["2.0.0"]}"#));
    }

    #[test]
    fn service_unavailable_is_retried() {
        let (url, server) = serve(vec![UNAVAILABLE, UNAVAILABLE, OK_EMPTY]);

        let response = transport(2).submit(&url, &json!({})).unwrap();
        assert_eq!(response, json!({}));
        assert_eq!(server.join().unwrap().len(), 3);
    }

    #[test]
    fn service_unavailable_exhausts_retries() {
        let (url, server) = serve(vec![UNAVAILABLE, UNAVAILABLE]);

        let err = transport(1).submit(&url, &json!({})).unwrap_err();
        assert!(matches!(err, BulkAuditError::TransportFailure { .. }));
        assert!(err.is_retryable());
        server.join().unwrap();
    }

    #[test]
    fn bad_request_is_rejected() {
        let (url, server) = serve(vec![BAD_REQUEST]);

        let err = transport(3).submit(&url, &json!({})).unwrap_err();
        assert!(matches!(err, BulkAuditError::ResponseRejected(_)));
        assert_eq!(server.join().unwrap().len(), 1);
    }

    #[test]
    fn other_status_is_transport_failure() {
        let (url, server) = serve(vec![SERVER_ERROR]);

        let err = transport(3).submit(&url, &json!({})).unwrap_err();
        assert!(err.to_string().contains("500"));
        server.join().unwrap();
    }

    #[test]
    fn undecodable_body_is_rejected() {
        let (url, server) = serve(vec![GARBAGE]);

        let err = transport(0).submit(&url, &json!({})).unwrap_err();
        assert!(matches!(err, BulkAuditError::ResponseRejected(_)));
        server.join().unwrap();
    }

    #[test]
    fn connection_refused_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport(0)
            .submit(&format!("http://{addr}/bulk"), &json!({}))
            .unwrap_err();
        assert!(matches!(err, BulkAuditError::TransportFailure { .. }));
    }
}
