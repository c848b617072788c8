// ── Core error types ──
//
// User-facing errors from linewatch-core. Consumers never see HTTP
// status codes or JSON parse failures directly: the
// `From<linewatch_api::Error>` impl folds transport errors into the
// small taxonomy the dashboard reasons about.
//
// `Clone + PartialEq` so the most recent error can sit in view state.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Data errors ──────────────────────────────────────────────────
    /// The store has no record for the requested machine.
    #[error("Machine not found: {identifier}")]
    NotFound { identifier: String },

    /// The store could not be reached or answered with a failure.
    #[error("Data store unavailable: {message}")]
    Unavailable { message: String },

    /// The store answered, but the record does not fit the model.
    #[error("Invalid record: {message}")]
    Invalid { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<linewatch_api::Error> for CoreError {
    fn from(err: linewatch_api::Error) -> Self {
        if err.is_not_found() {
            return CoreError::NotFound {
                identifier: err
                    .api_error_code()
                    .map_or_else(|| "resource".into(), |code| format!("resource ({code})")),
            };
        }

        match err {
            linewatch_api::Error::Deserialization { message, .. } => {
                CoreError::Invalid { message }
            }
            linewatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid store URL: {e}"),
            },
            linewatch_api::Error::Tls(message) | linewatch_api::Error::InvalidHeader(message) => {
                CoreError::Config { message }
            }
            other => CoreError::Unavailable {
                message: other.to_string(),
            },
        }
    }
}
