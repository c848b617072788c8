// Shared transport configuration for building reqwest::Client instances.
//
// TLS mode, timeout, and the store's auth headers live here so the
// client module only deals with URLs and response envelopes.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const USER_AGENT: &str = concat!("linewatch/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode (api-level mirror of core's config).
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-hosted stores with self-signed certs).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Default headers for the store: `apikey` plus a bearer token carrying the same key.
pub(crate) fn api_key_headers(api_key: &SecretString) -> Result<HeaderMap, Error> {
    let key = api_key.expose_secret();

    let mut apikey = HeaderValue::from_str(key)
        .map_err(|_| Error::InvalidHeader("api key contains non-visible characters".into()))?;
    apikey.set_sensitive(true);

    let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
        .map_err(|_| Error::InvalidHeader("api key contains non-visible characters".into()))?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("apikey"), apikey);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_key_headers_are_sensitive() {
        let headers = api_key_headers(&SecretString::from("anon-key".to_string())).unwrap();
        let apikey = headers.get("apikey").unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert!(apikey.is_sensitive());
        assert_eq!(auth.to_str().unwrap(), "Bearer anon-key");
    }

    #[test]
    fn api_key_with_newline_is_rejected() {
        let result = api_key_headers(&SecretString::from("bad\nkey".to_string()));
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }
}
