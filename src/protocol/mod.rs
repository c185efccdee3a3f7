//! Protocol module - HTTP transport binding naming and media types.
//!
//! This module holds the wire contract shared by the decoders and encoders:
//! - `ce-*` header names for each schema generation
//! - structured-mode JSON key mapping between generations
//! - media type classification for payloads

mod media;
mod wire_format;

pub use media::{is_json, media_type, CONTENT_TYPE_CLOUDEVENTS_JSON, CONTENT_TYPE_JSON};
pub use wire_format::{
    extension_header, extension_key, HeaderNames, SchemaGeneration, CE_HEADER_PREFIX,
    CONTENT_TYPE_HEADER, EXTENSION_HEADER_PREFIX, LEGACY_JSON_KEYS, LEGACY_MARKER_KEY,
    V01_HEADERS, V02_HEADERS,
};
