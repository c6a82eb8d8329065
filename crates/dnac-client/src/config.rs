//! Client configuration.

use std::time::Duration;

use tracing::warn;

/// Header the controller expects a session token in.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller base URL, e.g. `https://10.0.0.1`.
    pub base_url: String,

    /// Timeout applied to each individual HTTP request.
    pub request_timeout: Duration,

    /// Skip TLS certificate verification (lab controllers with self-signed certs).
    pub accept_invalid_certs: bool,

    /// Headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sandboxdnac.cisco.com".to_string(),
            request_timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `DNAC_BASE_URL`, `DNAC_TIMEOUT_SECS`,
    /// `DNAC_INSECURE` and `DNAC_AUTH_TOKEN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("DNAC_BASE_URL") {
            config.base_url = url;
        }

        if let Some(secs) = lookup("DNAC_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => config.request_timeout = Duration::from_secs(secs),
                Err(e) => warn!(value = %secs, error = %e, "Ignoring invalid DNAC_TIMEOUT_SECS"),
            }
        }

        if let Some(flag) = lookup("DNAC_INSECURE") {
            config.accept_invalid_certs = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        if let Some(token) = lookup("DNAC_AUTH_TOKEN") {
            config = config.with_auth_token(token);
        }

        config
    }

    /// Builder method to set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder method to skip certificate verification.
    pub fn with_insecure(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    /// Builder method to add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Builder method to send an already-issued session token.
    pub fn with_auth_token(self, token: impl Into<String>) -> Self {
        self.with_header(AUTH_TOKEN_HEADER, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.accept_invalid_certs);
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("DNAC_BASE_URL", "https://10.1.1.1"),
            ("DNAC_TIMEOUT_SECS", "5"),
            ("DNAC_INSECURE", "true"),
            ("DNAC_AUTH_TOKEN", "tok"),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.base_url, "https://10.1.1.1");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.accept_invalid_certs);
        assert_eq!(
            config.headers,
            vec![("X-Auth-Token".to_string(), "tok".to_string())]
        );
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let config = ClientConfig::from_lookup(|k| {
            (k == "DNAC_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
