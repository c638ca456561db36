//! Error types for the GlusterD2 REST bindings.

use thiserror::Error;

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-fixable input problem; never retried.
    InvalidInput,
    /// A volume or peer the call depends on does not exist.
    NotFound,
    /// Network failure, timeout, unexpected status or undecodable body.
    Transport,
}

/// Errors returned by the bindings.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed argument or unresolved reference.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Named volume is absent from the cluster.
    #[error("volume {name} not found")]
    VolumeNotFound {
        /// Volume name that was looked up.
        name: String,
    },

    /// No peer advertises the given host.
    #[error("no peer with address {host}")]
    PeerNotFound {
        /// Host that was looked up.
        host: String,
    },

    /// The daemon answered with a status other than the one the operation expects.
    #[error("{method} {path}: expected HTTP {expected}, got {status}: {body}")]
    UnexpectedStatus {
        /// HTTP method of the request.
        method: String,
        /// Request path, including the `/v1` prefix.
        path: String,
        /// Status the operation expects.
        expected: u16,
        /// Status the daemon returned.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Connection failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not decode into the expected shape.
    #[error("malformed response from {path}: {source}")]
    Decode {
        /// Request path whose body failed to decode.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    /// Shorthand for [`ApiError::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidInput(msg.into())
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidInput(_) => ErrorKind::InvalidInput,
            ApiError::VolumeNotFound { .. } | ApiError::PeerNotFound { .. } => ErrorKind::NotFound,
            ApiError::UnexpectedStatus { .. }
            | ApiError::Http(_)
            | ApiError::Decode { .. }
            | ApiError::Token(_) => ErrorKind::Transport,
        }
    }

    /// True for connection failures that hit the request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Http(e) if e.is_timeout())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ApiError>;
