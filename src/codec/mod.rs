//! Codec module - CloudEvents over HTTP in structured and binary mode.
//!
//! This module provides the pieces and the facade that composes them:
//!
//! - [`ModeDetector`] - structured vs binary, from the spec-version header
//! - [`BinaryDecoder`] - attributes from `ce-*` headers, payload from the body
//! - [`StructuredDecoder`] - the whole event from one JSON document
//! - [`DefaultsPolicy`] - fallbacks for required-but-absent attributes
//! - [`Codec`] - decode/encode pair used by handlers
//!
//! # Design
//!
//! The codec holds configuration only. Every decode or encode works on the
//! caller's own [`EventRecord`], so one `Codec` can serve any number of
//! concurrent requests.
//!
//! # Example
//!
//! ```
//! use cloudevent_codec::codec::{Codec, Mode};
//! use cloudevent_codec::EventRecord;
//! use http::HeaderMap;
//! use serde_json::json;
//!
//! let codec = Codec::new();
//! let body = br#"{"type":"word.found.noun","specversion":"0.1","source":"s","id":"42"}"#;
//!
//! let mut event: EventRecord = codec.decode(&HeaderMap::new(), body).unwrap();
//! event.data = Some(json!({"word": "frog"}));
//! event.event_type = "word.picked.noun".to_string();
//! event.relate();
//!
//! let message = codec.encode(&mut event, Mode::Structured).unwrap();
//! let text = std::str::from_utf8(&message.body).unwrap();
//! assert!(text.contains(r#""relatedid":"42""#));
//! ```

mod binary;
mod defaults;
mod detect;
mod structured;

pub use binary::BinaryDecoder;
pub use defaults::{DefaultsPolicy, DEFAULT_SOURCE, DEFAULT_SPEC_VERSION};
pub use detect::{Mode, ModeDetector};
pub use structured::StructuredDecoder;

use std::io::Write;

use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::event::EventRecord;
use crate::protocol::SchemaGeneration;

/// Encoded event: headers plus body, ready for an HTTP request or response.
#[derive(Debug, Clone, Default)]
pub struct WireMessage {
    /// Headers to send.
    pub headers: HeaderMap,
    /// Body bytes to send.
    pub body: Bytes,
}

/// Decode/encode facade.
///
/// Stateless between calls: `Detecting -> Decoded` happens inside one
/// [`decode`](Codec::decode) call and nothing is kept afterwards.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    generation: SchemaGeneration,
    accept_legacy: bool,
    emit_extension_headers: bool,
    validate_on_decode: bool,
    defaults: DefaultsPolicy,
}

impl Codec {
    /// Codec with default settings (V02 naming, no legacy acceptance).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new codec builder.
    pub fn builder() -> CodecBuilder {
        CodecBuilder::new()
    }

    /// Schema generation used for encoding.
    #[inline]
    pub fn generation(&self) -> SchemaGeneration {
        self.generation
    }

    /// Defaults applied before every encode.
    #[inline]
    pub fn defaults(&self) -> &DefaultsPolicy {
        &self.defaults
    }

    /// Mode detector matching this codec's configuration.
    #[inline]
    pub fn detector(&self) -> ModeDetector {
        ModeDetector::new(self.generation, self.accept_legacy)
    }

    /// Decide the mode of an inbound request.
    pub fn detect(&self, headers: &HeaderMap) -> Mode {
        self.detector().detect(headers)
    }

    /// Decode an inbound request into a fresh event.
    pub fn decode<D: DeserializeOwned>(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<EventRecord<D>> {
        let mut event = EventRecord::default();
        self.decode_into(headers, body, &mut event)?;
        Ok(event)
    }

    /// Decode an inbound request into `target`, returning the detected mode.
    ///
    /// Binary mode layers headers over `target` and honors a pre-seeded
    /// extensions container. Structured mode replaces `target` entirely.
    /// On error `target` is left unchanged.
    pub fn decode_into<D: DeserializeOwned>(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        target: &mut EventRecord<D>,
    ) -> Result<Mode> {
        match self.detector().binary_generation(headers) {
            Some(generation) => {
                BinaryDecoder::new(generation).decode_into(headers, body, target)?;
                Ok(Mode::Binary)
            }
            None => {
                let decoded =
                    StructuredDecoder::new(self.generation, self.accept_legacy).decode(body)?;
                if self.validate_on_decode {
                    decoded.validate()?;
                }
                *target = decoded;
                Ok(Mode::Structured)
            }
        }
    }

    /// Check that every required attribute of `event` is set.
    pub fn validate<D>(&self, event: &EventRecord<D>) -> Result<()> {
        event.validate()
    }

    /// Apply the defaults policy, then encode `event` in `mode`.
    pub fn encode<D: Serialize>(
        &self,
        event: &mut EventRecord<D>,
        mode: Mode,
    ) -> Result<WireMessage> {
        self.defaults.apply(event);
        match mode {
            Mode::Structured => structured::encode(event, self.generation),
            Mode::Binary => binary::encode(
                event,
                self.generation.headers(),
                self.emit_extension_headers,
            ),
        }
    }

    /// Encode `event` in `mode`, writing the body to `writer`.
    ///
    /// Returns the headers to send alongside the written body.
    pub fn encode_to<D: Serialize, W: Write>(
        &self,
        event: &mut EventRecord<D>,
        mode: Mode,
        writer: &mut W,
    ) -> Result<HeaderMap> {
        let message = self.encode(event, mode)?;
        writer.write_all(&message.body)?;
        Ok(message.headers)
    }
}

/// Builder for configuring a [`Codec`].
#[derive(Debug, Clone, Default)]
pub struct CodecBuilder {
    codec: Codec,
}

impl CodecBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema generation to speak.
    ///
    /// Default: `SchemaGeneration::V02`
    pub fn generation(mut self, generation: SchemaGeneration) -> Self {
        self.codec.generation = generation;
        self
    }

    /// Also accept V01 documents and headers when decoding.
    ///
    /// Only meaningful for a V02 codec. Encoding is unaffected.
    /// Default: false
    pub fn accept_legacy(mut self, accept: bool) -> Self {
        self.codec.accept_legacy = accept;
        self
    }

    /// Write extensions as `ce-x-*` headers in binary mode.
    ///
    /// Default: false (binary mode drops extensions)
    pub fn emit_extension_headers(mut self, emit: bool) -> Self {
        self.codec.emit_extension_headers = emit;
        self
    }

    /// Validate required attributes after every structured decode.
    ///
    /// Default: false
    pub fn validate_on_decode(mut self, validate: bool) -> Self {
        self.codec.validate_on_decode = validate;
        self
    }

    /// Replace the defaults policy.
    pub fn defaults(mut self, defaults: DefaultsPolicy) -> Self {
        self.codec.defaults = defaults;
        self
    }

    /// Build the codec.
    pub fn build(self) -> Codec {
        self.codec
    }
}
