//! api::http
//!
//! HTTP transport over reqwest.
//!
//! # Design
//!
//! Every request carries the bearer token (when one is known) and a JSON
//! body. Responses are decoded as JSON; an empty 2xx body decodes to
//! `{"success": true}`. Status codes map onto [`TransportError`]:
//!
//! | Status | Error |
//! |--------|-------|
//! | 401, 403 | `AuthFailed` |
//! | 404 | `NotFound` |
//! | other non-2xx | `Api` with the appliance's `msg` |
//!
//! A 2xx body of `{"success": false, "msg": ...}` is also an `Api` error.
//! Nothing is retried and no request timeout is set.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use super::traits::{ApiRequest, Method, Transport, TransportError};

/// Transport talking to a real appliance.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for `base_url`, e.g. `https://morpheus.example.com`.
    ///
    /// `insecure` disables TLS certificate verification.
    pub fn new(base_url: &str, token: Option<String>, insecure: bool) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("morpheus-cli/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn handle_response(&self, response: Response) -> Result<Value, TransportError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(json!({"success": true}));
            }
            let value: Value = serde_json::from_str(&text)
                .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
            if value.get("success") == Some(&Value::Bool(false)) {
                return Err(TransportError::Api {
                    status: status.as_u16(),
                    message: error_message(&value, status),
                });
            }
            Ok(value)
        } else {
            let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
            let message = match &body {
                Value::Null if !text.trim().is_empty() => text.trim().to_string(),
                other => error_message(other, status),
            };
            Err(match status {
                StatusCode::UNAUTHORIZED => TransportError::AuthFailed(message),
                StatusCode::FORBIDDEN => {
                    TransportError::AuthFailed(format!("permission denied: {}", message))
                }
                StatusCode::NOT_FOUND => TransportError::NotFound(message),
                _ => TransportError::Api {
                    status: status.as_u16(),
                    message,
                },
            })
        }
    }
}

fn error_message(body: &Value, status: StatusCode) -> String {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        })
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, path = %request.path, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!(status = response.status().as_u16(), "received response");
        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let transport =
            HttpTransport::new("https://m.example.com/", Some("secret-token".into()), false).unwrap();
        let debug = format!("{:?}", transport);
        assert!(!debug.contains("secret-token"));
        assert_eq!(transport.base_url(), "https://m.example.com");
    }

    #[test]
    fn error_message_prefers_msg() {
        let body = json!({"msg": "name is required", "message": "other"});
        assert_eq!(error_message(&body, StatusCode::BAD_REQUEST), "name is required");
        assert_eq!(error_message(&Value::Null, StatusCode::BAD_REQUEST), "Bad Request");
    }
}
