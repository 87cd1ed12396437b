//! HTTP client for the agent backend.
//!
//! Two endpoints: `/api/message` for a single exchange and
//! `/api/reset_session` to drop the server-side conversation memory.
//! Both are best-effort single attempts with no retries or timeouts.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::ChatMessage;

/// Placeholder reply shown whenever a message exchange fails.
pub const FETCH_ERROR: &str = "Error fetching message!";

#[derive(Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
    enable_browsing: bool,
}

#[derive(Deserialize)]
struct MessageResponse {
    response: String,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one user message and returns the agent's reply.
    ///
    /// Transport failures, non-2xx statuses, and undecodable bodies all
    /// collapse into a fixed placeholder agent message. The chat keeps
    /// going; the underlying error only reaches the log.
    pub async fn send_message(&self, text: &str, enable_browsing: bool) -> ChatMessage {
        match self.fetch_reply(text, enable_browsing).await {
            Ok(reply) => ChatMessage::agent(reply),
            Err(err) => {
                tracing::warn!(error = %err, "message request failed");
                ChatMessage::agent(FETCH_ERROR)
            }
        }
    }

    async fn fetch_reply(&self, text: &str, enable_browsing: bool) -> Result<String> {
        let url = format!("{}/api/message", self.base_url);

        let request = MessageRequest {
            message: text,
            enable_browsing,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "message request failed with status: {}",
                response.status()
            ));
        }

        let message_response: MessageResponse = response.json().await?;
        Ok(message_response.response)
    }

    /// Asks the backend to forget the session. Best-effort: a failure is
    /// logged and otherwise ignored, and the caller clears local history
    /// regardless.
    pub async fn reset_session(&self) {
        let url = format!("{}/api/reset_session", self.base_url);

        match self.client.post(&url).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(status = %response.status(), "session reset rejected");
            }
            Err(err) => {
                tracing::warn!(error = %err, "session reset request failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ChatRole;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP responder: accepts a single connection, reads the
    /// request, and writes back the given status line and body.
    async fn spawn_responder(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{addr}")
    }

    #[test]
    fn request_body_carries_browsing_flag() {
        let enabled = serde_json::to_string(&MessageRequest {
            message: "hello",
            enable_browsing: true,
        })
        .unwrap();
        assert_eq!(enabled, r#"{"message":"hello","enable_browsing":true}"#);

        let disabled = serde_json::to_string(&MessageRequest {
            message: "hello",
            enable_browsing: false,
        })
        .unwrap();
        assert_eq!(disabled, r#"{"message":"hello","enable_browsing":false}"#);
    }

    #[tokio::test]
    async fn successful_send_returns_agent_reply() {
        let base = spawn_responder("HTTP/1.1 200 OK", r#"{"response":"4"}"#).await;
        let client = ApiClient::new(&base);

        let reply = client.send_message("What is 2+2?", false).await;
        assert_eq!(reply.role, ChatRole::Agent);
        assert_eq!(reply.content, "4");
    }

    #[tokio::test]
    async fn non_200_yields_placeholder() {
        let base = spawn_responder(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"error":"boom"}"#,
        )
        .await;
        let client = ApiClient::new(&base);

        let reply = client.send_message("hello", false).await;
        assert_eq!(reply.content, FETCH_ERROR);
    }

    #[tokio::test]
    async fn malformed_body_yields_placeholder() {
        let base = spawn_responder("HTTP/1.1 200 OK", "not json at all").await;
        let client = ApiClient::new(&base);

        let reply = client.send_message("hello", true).await;
        assert_eq!(reply.content, FETCH_ERROR);
    }

    #[tokio::test]
    async fn unreachable_backend_yields_placeholder() {
        // Nothing listens here; the connection is refused immediately.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&format!("http://{addr}"));
        let reply = client.send_message("hello", false).await;
        assert_eq!(reply.role, ChatRole::Agent);
        assert_eq!(reply.content, FETCH_ERROR);
    }

    #[tokio::test]
    async fn reset_session_swallows_failures() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        // Must not panic or return an error.
        ApiClient::new(&format!("http://{addr}")).reset_session().await;
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
