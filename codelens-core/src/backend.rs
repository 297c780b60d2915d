//! Client side of the analysis service.
//!
//! The service contract is two calls:
//!
//! 1. `POST {base}/analyze` with `{ "code": ... }` answers
//!    `{ "status": "sent", "analysis_id": ... }` on success. Any other status,
//!    a non-2xx response, or a missing id is a submission failure.
//! 2. A WebSocket at `{base}/a/{analysis_id}` (scheme swapped to `ws`/`wss`)
//!    pushes zero or one JSON message holding the full result, then closes.
//!
//! [`AnalysisBackend`] and [`ResultChannel`] are the seam the session controller
//! is generic over; [`HttpBackend`] is the production implementation.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::AnalysisError;

/// Source of analysis exchanges.
pub trait AnalysisBackend: Send + Sync + 'static {
    type Channel: ResultChannel;

    /// Sends `code` for analysis and returns the service's `analysis_id`.
    fn submit(&self, code: &str) -> impl Future<Output = Result<String, AnalysisError>> + Send;

    /// Opens the result channel for `analysis_id`.
    fn connect(
        &self,
        analysis_id: &str,
    ) -> impl Future<Output = Result<Self::Channel, AnalysisError>> + Send;
}

/// A long-lived channel that delivers at most one terminal message.
pub trait ResultChannel: Send + 'static {
    /// Waits for the next text payload. `Ok(None)` means the peer closed first.
    fn next_message(&mut self)
        -> impl Future<Output = Result<Option<String>, AnalysisError>> + Send;

    /// Closes the channel. Best effort; errors are swallowed.
    fn close(self) -> impl Future<Output = ()> + Send;
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct SubmitResponse {
    status: Option<String>,
    analysis_id: Option<String>,
    detail: Option<String>,
    error: Option<String>,
}

/// Interprets the body of a submit response.
///
/// `status_code` is the HTTP status; anything outside 2xx fails with whatever
/// detail the body carries.
pub fn parse_submit_response(status_code: u16, body: &str) -> Result<String, AnalysisError> {
    let parsed: Result<SubmitResponse, _> = serde_json::from_str(body);

    if !(200..300).contains(&status_code) {
        let detail = parsed
            .ok()
            .and_then(|r| r.detail.or(r.error))
            .unwrap_or_else(|| truncate(body.trim(), 200));
        return Err(AnalysisError::Http {
            status: status_code,
            detail,
        });
    }

    let response = parsed.map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
    match response.status.as_deref() {
        Some("sent") => {}
        other => {
            let detail = response
                .detail
                .or(response.error)
                .unwrap_or_else(|| format!("status {}", other.unwrap_or("missing")));
            return Err(AnalysisError::Rejected(detail));
        }
    }

    match response.analysis_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(AnalysisError::MalformedResponse(
            "missing analysis_id".to_owned(),
        )),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_owned(),
    }
}

/// Swaps an `http(s)` base URL to the matching WebSocket scheme.
pub fn websocket_base(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        trimmed.to_owned()
    }
}

/// reqwest + tokio-tungstenite implementation of [`AnalysisBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Builds a backend for the service at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("codelens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn submit_url(&self) -> String {
        format!("{}/analyze", self.base_url)
    }

    pub fn channel_url(&self, analysis_id: &str) -> String {
        format!("{}/a/{}", websocket_base(&self.base_url), analysis_id)
    }
}

impl AnalysisBackend for HttpBackend {
    type Channel = WsChannel;

    async fn submit(&self, code: &str) -> Result<String, AnalysisError> {
        let url = self.submit_url();
        tracing::debug!(%url, bytes = code.len(), "submitting code for analysis");

        let response = self
            .client
            .post(&url)
            .json(&SubmitRequest { code })
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let id = parse_submit_response(status, &body)?;
        tracing::info!(analysis_id = %id, "analysis accepted");
        Ok(id)
    }

    async fn connect(&self, analysis_id: &str) -> Result<WsChannel, AnalysisError> {
        let url = self.channel_url(analysis_id);
        tracing::debug!(%url, "opening result channel");
        let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| AnalysisError::Channel(e.to_string()))?;
        Ok(WsChannel { stream })
    }
}

/// Result channel over a WebSocket.
pub struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ResultChannel for WsChannel {
    async fn next_message(&mut self) -> Result<Option<String>, AnalysisError> {
        while let Some(frame) = self.stream.next().await {
            match frame.map_err(|e| AnalysisError::Channel(e.to_string()))? {
                Message::Text(text) => return Ok(Some(text.to_string())),
                Message::Binary(data) => {
                    return Ok(Some(String::from_utf8_lossy(&data).into_owned()))
                }
                Message::Close(_) => return Ok(None),
                // Ping/pong are answered by tungstenite itself.
                _ => continue,
            }
        }
        Ok(None)
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "result channel close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sent_status_yields_the_id() {
        let id = parse_submit_response(200, r#"{"status":"sent","analysis_id":"abc123"}"#).unwrap();
        assert_eq!(id, "abc123");
    }

    #[test]
    fn other_status_is_rejected_with_detail() {
        let err = parse_submit_response(200, r#"{"status":"error","detail":"rate limited"}"#)
            .unwrap_err();
        assert_eq!(err, AnalysisError::Rejected("rate limited".into()));
    }

    #[test]
    fn other_status_without_detail_names_the_status() {
        let err = parse_submit_response(200, r#"{"status":"queued"}"#).unwrap_err();
        assert_eq!(err, AnalysisError::Rejected("status queued".into()));
    }

    #[test]
    fn non_success_http_status_fails_even_when_body_says_sent() {
        let err = parse_submit_response(503, r#"{"status":"sent","analysis_id":"x"}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Http { status: 503, .. }));
    }

    #[test]
    fn http_error_uses_the_body_error_field() {
        let err = parse_submit_response(400, r#"{"error":"Code is required"}"#).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Http {
                status: 400,
                detail: "Code is required".into()
            }
        );
    }

    #[test]
    fn missing_or_blank_id_is_malformed() {
        assert!(matches!(
            parse_submit_response(200, r#"{"status":"sent"}"#),
            Err(AnalysisError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_submit_response(200, r#"{"status":"sent","analysis_id":"  "}"#),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert!(matches!(
            parse_submit_response(200, "<html>gateway</html>"),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn websocket_urls_swap_scheme() {
        let backend = HttpBackend::new("https://api.example.com/").unwrap();
        assert_eq!(backend.submit_url(), "https://api.example.com/analyze");
        assert_eq!(backend.channel_url("abc"), "wss://api.example.com/a/abc");
        assert_eq!(websocket_base("http://localhost:8000"), "ws://localhost:8000");
    }
}
