use thiserror::Error;

/// Top-level error type for the `linewatch-api` crate.
///
/// Covers every failure mode of talking to the store: HTTP transport,
/// client construction, PostgREST error responses, and body decoding.
/// `linewatch-core` maps these into the dashboard's error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The API key cannot be sent as an HTTP header value.
    #[error("Invalid API key header: {0}")]
    InvalidHeader(String),

    // ── Store ───────────────────────────────────────────────────────
    /// Structured error from PostgREST (`{ code, message, details, hint }`).
    #[error("Store error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Extract the PostgREST error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
