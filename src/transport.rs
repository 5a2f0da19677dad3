//! The outbound call for one turn.
//!
//! A turn posts `{ "message": .., "session_id": .. }` as JSON and receives
//! the agent's reply as a plain byte stream. [`HttpTransport`] does this
//! with reqwest; tests substitute their own [`Transport`].

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default request timeout. A hung reply stalls the turn until this expires.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// The streamed body of one reply.
pub type ReplyBody = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Request body for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The trimmed user message.
    pub message: String,
    /// Opaque session token that lets the backend keep context.
    pub session_id: String,
}

impl ChatRequest {
    /// Creates a request.
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
        }
    }
}

/// Issues the request for one turn and hands back the reply body unbuffered.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and waits for response headers.
    ///
    /// # Errors
    ///
    /// Fails on connection errors, timeouts, and non-success statuses.
    async fn send(&self, request: &ChatRequest) -> Result<ReplyBody>;
}

/// reqwest-backed transport for the `/chat` endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    endpoint: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport posting to `endpoint`.
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Returns the endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/plain"));
        headers
    }

    /// Converts a non-success response into an [`Error::Api`].
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };
        Error::api(status_code, error_message(&body))
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ReplyBody> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(Self::default_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let body = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(format!("Reply timed out: {}", e), None)
                } else {
                    Error::streaming(format!("Error in HTTP stream: {}", e), Some(Box::new(e)))
                }
            })
        });
        Ok(Box::pin(body))
    }
}

/// Extracts the backend's `{"error": ".."}` message, falling back to the raw body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_expected_json() {
        let request = ChatRequest::new("hello", "abc-123");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"message":"hello","session_id":"abc-123"}"#);
    }

    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(
            error_message(r#"{"error": "No message or session_id provided."}"#),
            "No message or session_id provided."
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"detail": "x"}"#), r#"{"detail": "x"}"#);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let endpoint = Url::parse("http://127.0.0.1:9/chat").unwrap();
        let transport = HttpTransport::new(endpoint, Some(Duration::from_secs(5))).unwrap();
        let result = transport.send(&ChatRequest::new("hi", "s")).await;
        let err = result.err().unwrap();
        assert!(err.is_transport(), "{err}");
    }
}
