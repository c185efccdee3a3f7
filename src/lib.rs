//! # cloudevent-codec
//!
//! CloudEvents over HTTP: decode inbound requests into an in-memory event,
//! encode outbound events, and run a small transform-and-reply service on
//! top.
//!
//! ## Architecture
//!
//! - **Structured mode**: the whole event is one JSON document in the body
//! - **Binary mode**: attributes travel as `ce-*` headers whose values are
//!   JSON scalars, the body carries only the payload
//!
//! The mode of an inbound request is decided by the presence of the
//! spec-version header alone. Replies are encoded in the inbound mode.
//!
//! ## Example
//!
//! ```
//! use cloudevent_codec::{Codec, EventRecord, Mode};
//! use http::{HeaderMap, HeaderValue};
//!
//! let codec = Codec::new();
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("ce-specversion", HeaderValue::from_static("\"0.1\""));
//! headers.insert("ce-type", HeaderValue::from_static("\"word.found.verb\""));
//! headers.insert("ce-id", HeaderValue::from_static("\"7\""));
//!
//! assert_eq!(codec.detect(&headers), Mode::Binary);
//! let event: EventRecord = codec.decode(&headers, b"").unwrap();
//! assert_eq!(event.event_type, "word.found.verb");
//! assert!(event.time.is_some());
//! ```

pub mod codec;
pub mod delivery;
pub mod error;
pub mod event;
pub mod handler;
pub mod protocol;
pub mod vocabulary;

mod service;

pub use codec::{Codec, CodecBuilder, Mode, WireMessage};
pub use error::{CloudEventError, Result};
pub use event::{EventRecord, Extensions};
pub use protocol::SchemaGeneration;
pub use service::{
    EventService, ReplyMode, ServiceBuilder, CALLBACK_URL_ENV, DEFAULT_CALLBACK_HEADER,
    DEFAULT_CALLBACK_URL, SYNC_MODE_ENV,
};
