// Shared transport configuration for building reqwest::Client instances.
//
// Timeout, user agent and the optional API key header live here so the
// search client never assembles its own builder.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const USER_AGENT: &str = concat!("civicmap/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Sent as `X-API-KEY` on every request when present.
    pub api_key: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        if let Some(ref key) = self.api_key {
            let mut value = HeaderValue::from_str(key.expose_secret())
                .map_err(|e| Error::ClientSetup(format!("invalid API key header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert("X-API-KEY", value);
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ClientSetup(format!("failed to build HTTP client: {e}")))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_api_key() {
        let cfg = TransportConfig::default();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.build_client().is_ok());
    }

    #[test]
    fn rejects_api_key_with_newline() {
        let cfg = TransportConfig::default().with_api_key(SecretString::from("bad\nkey".to_string()));
        assert!(matches!(cfg.build_client(), Err(Error::ClientSetup(_))));
    }
}
