// ── Core error types ──
//
// Provisioning errors from lmprov-core. A `CoreError` is fatal to the
// repetition row that raised it; the runner logs it at the row boundary
// and moves on. The `From<lmprov_api::Error>` impl translates transport
// failures into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    /// A required expression did not resolve, a locator was malformed,
    /// or a field could not be mapped.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// More than one remote group matched an identity filter.
    #[error("Ambiguous {kind} group '{name}': {count} remote matches")]
    Ambiguous {
        kind: String,
        name: String,
        count: usize,
    },

    #[error("Not supported: {operation}")]
    Unsupported { operation: String },

    // ── Evaluation errors ────────────────────────────────────────────
    #[error("Could not evaluate '{expression}': {reason}")]
    Evaluation { expression: String, reason: String },

    // ── Remote errors (wrapped, not exposed raw) ─────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
        /// The portal's numeric error code.
        code: Option<i64>,
    },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Cannot reach portal: {reason}")]
    Connection { reason: String },

    // ── Control flow ─────────────────────────────────────────────────
    #[error("Cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lmprov_api::Error> for CoreError {
    fn from(err: lmprov_api::Error) -> Self {
        match err {
            lmprov_api::Error::Authentication { message } => CoreError::Authentication { message },
            lmprov_api::Error::Signing(message) => CoreError::Authentication {
                message: format!("could not sign request: {message}"),
            },
            lmprov_api::Error::Transport(ref e) => {
                if e.is_timeout() || e.is_connect() {
                    CoreError::Connection {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                        code: None,
                    }
                }
            }
            lmprov_api::Error::InvalidUrl(e) => CoreError::Configuration {
                message: format!("Invalid portal URL: {e}"),
            },
            lmprov_api::Error::Tls(reason) => CoreError::Connection {
                reason: format!("TLS error: {reason}"),
            },
            lmprov_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                status: Some(status),
                code,
            },
            lmprov_api::Error::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
                code: None,
            },
        }
    }
}
