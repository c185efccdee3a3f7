//! Error types for cloudevent-codec.

use thiserror::Error;

/// Main error type for all codec and service operations.
#[derive(Debug, Error)]
pub enum CloudEventError {
    /// A binary-mode header value is not valid JSON for its field.
    #[error("malformed value in header {header}: {source}")]
    HeaderDecode {
        /// Lower-cased name of the offending header.
        header: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The body is not valid JSON although the content type says it is.
    #[error("malformed JSON body: {0}")]
    BodyDecode(#[source] serde_json::Error),

    /// The extensions container cannot take binary-mode extension headers.
    #[error("unsupported extensions container, only string or value maps accept binary headers")]
    UnsupportedExtensionContainer,

    /// A required attribute is empty.
    #[error("{0} is a required field")]
    MissingRequiredField(&'static str),

    /// No transform knows the event's category.
    #[error("unknown CloudEvent event type: {0}")]
    UnknownEventCategory(String),

    /// A value or key cannot be carried in an HTTP header.
    #[error("cannot encode header {header}: {reason}")]
    HeaderEncode {
        /// Header name being written.
        header: String,
        /// What went wrong.
        reason: String,
    },

    /// Structured serialization failed.
    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// The word table could not be loaded.
    #[error("vocabulary load error: {0}")]
    Vocabulary(#[source] serde_json::Error),

    /// I/O error while reading a source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The callback target is not a usable absolute URL.
    #[error("invalid callback URL: {0}")]
    InvalidCallbackUrl(String),

    /// Outbound delivery failed (transport error or status >= 300).
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl CloudEventError {
    pub(crate) fn header_decode(header: &str, source: serde_json::Error) -> Self {
        Self::HeaderDecode {
            header: header.to_string(),
            source,
        }
    }

    pub(crate) fn header_encode(header: &str, reason: impl ToString) -> Self {
        Self::HeaderEncode {
            header: header.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias using CloudEventError.
pub type Result<T> = std::result::Result<T, CloudEventError>;
