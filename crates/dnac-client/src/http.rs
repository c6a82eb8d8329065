//! reqwest-backed [`Transport`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// HTTP transport for the controller's REST API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header '{name}': {e}")))?;
            let mut value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header '{name}': {e}")))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, url = %url, "HTTP request");

        let mut builder = self.inner.request(request.method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        debug!(url = %url, status, bytes = body.len(), "HTTP response");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let transport = HttpTransport::new(&ClientConfig::new("https://10.0.0.1/")).unwrap();
        assert_eq!(transport.base_url(), "https://10.0.0.1");
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let config = ClientConfig::default().with_header("bad header", "x");
        assert!(matches!(
            HttpTransport::new(&config),
            Err(TransportError::InvalidRequest(_))
        ));
    }
}
