//! Structured mode: the whole event as one JSON document.
//!
//! V02 documents map straight onto [`EventRecord`]'s serde names. V01
//! documents are rewritten key by key (see `LEGACY_JSON_KEYS`) before and
//! after serde, so both generations share one data model.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::WireMessage;
use crate::error::{CloudEventError, Result};
use crate::event::EventRecord;
use crate::protocol::{
    SchemaGeneration, CONTENT_TYPE_CLOUDEVENTS_JSON, LEGACY_JSON_KEYS, LEGACY_MARKER_KEY,
};

/// Parses a structured-mode body into an [`EventRecord`].
///
/// No per-field leniency: a malformed document fails the decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StructuredDecoder {
    generation: SchemaGeneration,
    accept_legacy: bool,
}

impl StructuredDecoder {
    /// Decoder for one generation; `accept_legacy` lets a V02 decoder also
    /// take V01 documents (recognized by their `cloudEventsVersion` key).
    pub fn new(generation: SchemaGeneration, accept_legacy: bool) -> Self {
        Self {
            generation,
            accept_legacy,
        }
    }

    /// Decode a full document.
    ///
    /// `data` is materialized directly into `D`.
    ///
    /// # Example
    ///
    /// ```
    /// use cloudevent_codec::codec::StructuredDecoder;
    /// use cloudevent_codec::EventRecord;
    ///
    /// let body = br#"{"type":"word.found.noun","specversion":"0.1","source":"s","id":"42"}"#;
    /// let event: EventRecord = StructuredDecoder::default().decode(body).unwrap();
    /// assert_eq!(event.id, "42");
    /// assert!(event.data.is_none());
    /// ```
    pub fn decode<D: DeserializeOwned>(&self, body: &[u8]) -> Result<EventRecord<D>> {
        if self.generation == SchemaGeneration::V02 && !self.accept_legacy {
            return serde_json::from_slice(body).map_err(CloudEventError::BodyDecode);
        }

        let mut document: Value =
            serde_json::from_slice(body).map_err(CloudEventError::BodyDecode)?;
        let legacy = match self.generation {
            SchemaGeneration::V01 => {
                // V02 names carry no meaning in a V01 document
                if let Value::Object(object) = &mut document {
                    for (v02, _) in LEGACY_JSON_KEYS {
                        object.remove(v02);
                    }
                }
                true
            }
            SchemaGeneration::V02 => is_legacy(&document),
        };
        let document = if legacy {
            rename_keys(document, |(v02, v01)| (v01, v02))
        } else {
            document
        };
        serde_json::from_value(document).map_err(CloudEventError::BodyDecode)
    }
}

/// Encode `event` as one JSON document in the given generation.
pub(crate) fn encode<D: Serialize>(
    event: &EventRecord<D>,
    generation: SchemaGeneration,
) -> Result<WireMessage> {
    let body = match generation {
        SchemaGeneration::V02 => serde_json::to_vec(event).map_err(CloudEventError::Encode)?,
        SchemaGeneration::V01 => {
            let document = serde_json::to_value(event).map_err(CloudEventError::Encode)?;
            let document = rename_keys(document, |pair| pair);
            serde_json::to_vec(&document).map_err(CloudEventError::Encode)?
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(CONTENT_TYPE_CLOUDEVENTS_JSON),
    );
    Ok(WireMessage {
        headers,
        body: Bytes::from(body),
    })
}

fn is_legacy(document: &Value) -> bool {
    document
        .as_object()
        .map(|object| object.contains_key(LEGACY_MARKER_KEY))
        .unwrap_or(false)
}

/// Rename top-level keys; `direction` picks `(from, to)` out of each
/// `(V02, V01)` pair. Non-objects pass through for serde to reject.
fn rename_keys(
    document: Value,
    direction: impl Fn((&'static str, &'static str)) -> (&'static str, &'static str),
) -> Value {
    let Value::Object(mut object) = document else {
        return document;
    };

    let mut renamed = Map::with_capacity(object.len());
    for pair in LEGACY_JSON_KEYS {
        let (from, to) = direction(pair);
        if let Some(value) = object.remove(from) {
            renamed.insert(to.to_string(), value);
        }
    }
    renamed.extend(object);
    Value::Object(renamed)
}
