//! api::traits
//!
//! Transport trait and the request descriptor every call is expressed as.
//!
//! # Design
//!
//! The engine never talks HTTP directly. Each call is first built as an
//! [`ApiRequest`] value; that value is what a dry run prints, and what a
//! [`Transport`] executes otherwise. A `Transport` owns authentication and
//! the wire; it does not retry.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from transport operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// The appliance rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested record or endpoint does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response.
    #[error("{status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the appliance
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not the JSON we expected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Whether the method changes server state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A fully described API call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Look up a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_mutation(&self) -> bool {
        self.method.is_mutation()
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if !self.query.is_empty() {
            let query: Vec<String> = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "?{}", query.join("&"))?;
        }
        Ok(())
    }
}

/// Executes API requests against an appliance.
///
/// Implementations must be `Send + Sync`. Errors are returned, never
/// retried.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs (e.g. "http", "mock").
    fn name(&self) -> &'static str;

    /// Execute a request and return the decoded JSON response body.
    ///
    /// A successful response with an empty body decodes to
    /// `{"success": true}`.
    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError>;
}
