//! Request and reply types for the event service.
//!
//! These are plain HTTP-shaped values so the service stays independent of
//! any particular server framework.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::codec::WireMessage;

/// An inbound HTTP request carrying one event.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl InboundRequest {
    /// Create a request from headers and body.
    pub fn new(headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Header value as text, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl From<WireMessage> for InboundRequest {
    fn from(message: WireMessage) -> Self {
        Self {
            headers: message.headers,
            body: message.body,
        }
    }
}

/// The HTTP reply produced for one request.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl Reply {
    /// 200 carrying an encoded event.
    pub fn event(message: WireMessage) -> Self {
        Self {
            status: StatusCode::OK,
            headers: message.headers,
            body: message.body,
        }
    }

    /// 200 with an empty body.
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Plain-text error reply.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self {
            status,
            headers,
            body: Bytes::from(message.into()),
        }
    }

    /// Whether the status is 2xx.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
