//! The request/response seam every API component is built on.
//!
//! Components never open connections themselves; they take an
//! `Arc<dyn Transport>` at construction so tests can substitute a stub.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, TransportError};

/// Longest error body echoed back in a [`TransportError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// A request relative to the controller's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute path, e.g. `/dna/intent/api/v1/task/{id}`.
    pub path: String,
    pub query: Vec<(String, String)>,
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
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Add query parameters from a serializable struct. Unset (`None`) fields
    /// are skipped and sequences become repeated keys. Keys come out sorted.
    pub fn with_query<T: Serialize>(mut self, params: &T) -> Result<Self, ClientError> {
        self.query.extend(query_pairs(params)?);
        Ok(self)
    }

    /// Attach a JSON body.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Raw response as produced by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A JSON response with the matching content type.
    pub fn json_body(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
            .with_header("content-type", "application/json")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into [`TransportError::Status`].
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(TransportError::Status {
            status: self.status,
            message: error_message(&self.body),
        })
    }
}

/// Anything that can carry an [`ApiRequest`] to the controller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Error envelope: `{"response": {"errorCode": ..., "message": ..., "detail": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    response: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_code: Option<String>,
    message: Option<String>,
    detail: Option<String>,
}

fn error_message(body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        let ErrorBody {
            error_code,
            message,
            detail,
        } = envelope.response;
        let text = match (message, detail) {
            (Some(m), Some(d)) => format!("{m}: {d}"),
            (Some(m), None) => m,
            (None, Some(d)) => d,
            (None, None) => String::new(),
        };
        return match error_code {
            Some(code) if !text.is_empty() => format!("[{code}] {text}"),
            Some(code) => format!("[{code}]"),
            None => text,
        };
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}

fn query_pairs<T: Serialize>(params: &T) -> Result<Vec<(String, String)>, ClientError> {
    let value =
        serde_json::to_value(params).map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

    let Value::Object(map) = value else {
        return Err(TransportError::InvalidRequest("query parameters must be a struct".into()).into());
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), scalar(&key, item)?));
                }
            }
            other => pairs.push((key.clone(), scalar(&key, other)?)),
        }
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs)
}

fn scalar(key: &str, value: Value) -> Result<String, ClientError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(TransportError::InvalidRequest(format!(
            "query parameter '{key}' is not a scalar"
        ))
        .into()),
    }
}
