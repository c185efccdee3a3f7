//! Event service builder and request handling.
//!
//! The [`ServiceBuilder`] provides a fluent API for configuring the codec,
//! transforms and reply mode. The [`EventService`] answers one request at a
//! time, statelessly:
//! 1. Detect the mode and decode the event
//! 2. Dispatch it to the matching transform
//! 3. Relate it to the inbound event (`relatedid` = old id, fresh id)
//! 4. Encode it in the inbound mode and reply, or hand it to the callback queue
//!
//! # Example
//!
//! ```
//! use cloudevent_codec::handler::InboundRequest;
//! use cloudevent_codec::vocabulary::Vocabulary;
//! use cloudevent_codec::{EventService, ReplyMode};
//! use http::HeaderMap;
//!
//! # tokio_test_main();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test_main() {
//! let words = Vocabulary::from_json(r#"{"noun": ["frog"]}"#).unwrap();
//! let service = EventService::builder()
//!     .transform("word.found", words)
//!     .reply_mode(ReplyMode::Sync)
//!     .build()
//!     .unwrap();
//!
//! let body = r#"{"type":"word.found.noun","specversion":"0.1","source":"s","id":"42"}"#;
//! let reply = service.handle(InboundRequest::new(HeaderMap::new(), body)).await;
//!
//! assert!(reply.is_success());
//! assert!(reply.text().contains(r#""relatedid":"42""#));
//! # }
//! ```

use std::sync::Arc;

use http::{HeaderName, StatusCode};

use crate::codec::{Codec, WireMessage};
use crate::delivery::{
    parse_callback_url, CallbackTransport, DeliveryQueue, DEFAULT_MAX_CONCURRENT_DELIVERIES,
};
use crate::error::{CloudEventError, Result};
use crate::event::EventRecord;
use crate::handler::{InboundRequest, Reply, Transform, TransformRegistry};

/// Default callback target when the request names none.
pub const DEFAULT_CALLBACK_URL: &str = "https://srcdog.com/madlibs/event";

/// Default request header that overrides the callback target.
pub const DEFAULT_CALLBACK_HEADER: &str = "x-callback-url";

/// Environment variable whose presence selects synchronous replies.
pub const SYNC_MODE_ENV: &str = "SYNC_MODE";

/// Environment variable overriding the default callback URL.
pub const CALLBACK_URL_ENV: &str = "CALLBACK_URL";

/// How the transformed event reaches its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// Encoded event is the HTTP response body.
    Sync,
    /// Encoded event is POSTed to a callback URL; the response is empty.
    #[default]
    Callback,
}

/// Builder for configuring and creating an [`EventService`].
pub struct ServiceBuilder {
    codec: Codec,
    registry: TransformRegistry,
    reply_mode: ReplyMode,
    callback_url: String,
    callback_header: String,
    max_concurrent_deliveries: usize,
    transport: Option<Arc<dyn CallbackTransport>>,
}

impl ServiceBuilder {
    /// Create a new service builder.
    pub fn new() -> Self {
        Self {
            codec: Codec::default(),
            registry: TransformRegistry::new(),
            reply_mode: ReplyMode::default(),
            callback_url: DEFAULT_CALLBACK_URL.to_string(),
            callback_header: DEFAULT_CALLBACK_HEADER.to_string(),
            max_concurrent_deliveries: DEFAULT_MAX_CONCURRENT_DELIVERIES,
            transport: None,
        }
    }

    /// Builder seeded from the process environment.
    ///
    /// `SYNC_MODE` (any value) selects [`ReplyMode::Sync`]; a non-empty
    /// `CALLBACK_URL` replaces the default callback target.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builder seeded from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new();
        if lookup(SYNC_MODE_ENV).is_some() {
            builder.reply_mode = ReplyMode::Sync;
        }
        if let Some(url) = lookup(CALLBACK_URL_ENV).filter(|u| !u.trim().is_empty()) {
            builder.callback_url = url;
        }
        builder
    }

    /// Set the codec.
    ///
    /// Default: `Codec::default()`
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Register a transform for an event-type prefix.
    pub fn transform<T: Transform>(mut self, prefix: &str, transform: T) -> Self {
        self.registry.register(prefix, transform);
        self
    }

    /// Register a closure transform for an event-type prefix.
    pub fn transform_fn<F>(mut self, prefix: &str, transform: F) -> Self
    where
        F: Fn(&mut EventRecord) -> Result<()> + Send + Sync + 'static,
    {
        self.registry.register_fn(prefix, transform);
        self
    }

    /// Set the reply mode.
    ///
    /// Default: `ReplyMode::Callback`
    pub fn reply_mode(mut self, mode: ReplyMode) -> Self {
        self.reply_mode = mode;
        self
    }

    /// Set the callback target used when the request names none.
    ///
    /// Default: `https://srcdog.com/madlibs/event`
    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = url.into();
        self
    }

    /// Set the request header that overrides the callback target.
    ///
    /// Default: `x-callback-url`
    pub fn callback_header(mut self, name: impl Into<String>) -> Self {
        self.callback_header = name.into();
        self
    }

    /// Set the maximum number of deliveries in flight.
    ///
    /// When this limit is reached, new deliveries are dropped with a warning.
    /// Default: 64
    pub fn max_concurrent_deliveries(mut self, limit: usize) -> Self {
        self.max_concurrent_deliveries = limit;
        self
    }

    /// Set the transport used for callback deliveries.
    pub fn transport(mut self, transport: Arc<dyn CallbackTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the service.
    ///
    /// Callback mode needs a transport and a valid default callback URL.
    pub fn build(self) -> Result<EventService> {
        let callback_header = HeaderName::from_bytes(self.callback_header.as_bytes())
            .map_err(|e| CloudEventError::header_encode(&self.callback_header, e))?;

        let deliveries = match self.reply_mode {
            ReplyMode::Sync => None,
            ReplyMode::Callback => {
                parse_callback_url(&self.callback_url)?;
                let transport = self.transport.ok_or_else(|| {
                    CloudEventError::Delivery("callback mode needs a transport".to_string())
                })?;
                Some(DeliveryQueue::new(transport, self.max_concurrent_deliveries))
            }
        };

        Ok(EventService {
            codec: self.codec,
            registry: Arc::new(self.registry),
            reply_mode: self.reply_mode,
            callback_url: self.callback_url,
            callback_header,
            deliveries,
        })
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode, transform and answer CloudEvents.
///
/// Cheap to clone. Every request works on its own [`EventRecord`]; clones
/// share only the read-only registry and the delivery queue.
#[derive(Clone)]
pub struct EventService {
    codec: Codec,
    registry: Arc<TransformRegistry>,
    reply_mode: ReplyMode,
    callback_url: String,
    callback_header: HeaderName,
    deliveries: Option<DeliveryQueue>,
}

impl EventService {
    /// Create a new service builder.
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    /// The codec in use.
    #[inline]
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// The reply mode in use.
    #[inline]
    pub fn reply_mode(&self) -> ReplyMode {
        self.reply_mode
    }

    /// Callback target used when the request names none.
    #[inline]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Handle one request.
    ///
    /// Any decode, transform or encode failure becomes a 500 carrying the
    /// error text. Callback delivery problems never change the reply.
    /// Must be called inside a tokio runtime.
    pub async fn handle(&self, request: InboundRequest) -> Reply {
        match self.process(&request) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Unable to handle event: {}", e);
                Reply::error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }

    fn process(&self, request: &InboundRequest) -> Result<Reply> {
        let mut event: EventRecord = EventRecord::default();
        let mode = self
            .codec
            .decode_into(&request.headers, &request.body, &mut event)?;
        tracing::debug!("Decoded {:?} event {} ({})", mode, event.id, event.event_type);

        self.registry.dispatch(&mut event)?;
        event.relate();
        let message = self.codec.encode(&mut event, mode)?;

        match &self.deliveries {
            None => Ok(Reply::event(message)),
            Some(queue) => {
                let target = self.callback_target(request);
                self.deliver(queue, target, message);
                Ok(Reply::empty())
            }
        }
    }

    /// Callback target for `request`: the override header, else the default.
    pub fn callback_target<'a>(&'a self, request: &'a InboundRequest) -> &'a str {
        request
            .header(self.callback_header.as_str())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.callback_url)
    }

    fn deliver(&self, queue: &DeliveryQueue, target: &str, message: WireMessage) {
        match queue.submit(target, message) {
            Ok(Some(_)) => tracing::info!("Delivering event to {}", target),
            // Already logged by the queue
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping callback: {}", e),
        }
    }
}

impl std::fmt::Debug for EventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventService")
            .field("codec", &self.codec)
            .field("reply_mode", &self.reply_mode)
            .field("callback_url", &self.callback_url)
            .field("callback_header", &self.callback_header)
            .field("transforms", &self.registry.len())
            .finish()
    }
}
