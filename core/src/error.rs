//! Error types for request modification and form decoding.
//!
//! # Design
//! Every failure in this crate is a caller-side contract violation: a payload
//! that is not a form, a malformed percent-escape, an unknown method token or
//! an endpoint that cannot be rebuilt. None of them are retried; they surface
//! to the immediate caller through `?`.

/// Errors returned by the `modify` and `query` functions.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Form parameters were merged into a payload whose content type is not
    /// `application/x-www-form-urlencoded`.
    #[error("cannot merge form parameters into a payload of type {content_type}")]
    UnsupportedPayload { content_type: String },

    /// A percent-escape was malformed or did not decode to UTF-8.
    #[error("cannot decode {input:?}: {reason}")]
    Decoding { input: String, reason: String },

    /// The method token is not one of the supported HTTP verbs.
    #[error("unknown HTTP method {0:?}")]
    UnknownMethod(String),

    #[error("invalid endpoint: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    #[error("invalid endpoint: {0}")]
    InvalidUriParts(#[from] http::uri::InvalidUriParts),
}

pub type Result<T> = std::result::Result<T, RequestError>;

impl RequestError {
    pub(crate) fn decoding(input: &str, reason: impl Into<String>) -> Self {
        RequestError::Decoding {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
