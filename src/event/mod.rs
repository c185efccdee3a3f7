//! Event module - the in-memory CloudEvent.
//!
//! [`EventRecord`] is the canonical representation every decoder produces and
//! every encoder consumes. Its serde mapping is the V02 structured schema
//! (`type`, `specversion`, `id`, ...); the V01 names are handled by the codec.
//!
//! # Example
//!
//! ```
//! use cloudevent_codec::EventRecord;
//!
//! let mut event: EventRecord = EventRecord::new("word.found.noun", "/sink");
//! let inbound_id = event.id.clone();
//!
//! event.relate();
//! assert_eq!(event.related_id, inbound_id);
//! assert_ne!(event.id, inbound_id);
//! assert_eq!(event.category(), Some("noun"));
//! ```

mod extensions;

pub use extensions::Extensions;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CloudEventError, Result};

/// One CloudEvent.
///
/// `D` is the payload shape. The default `Value` accepts anything; a typed
/// `D` makes both decoders materialize `data` straight into that type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord<D = Value> {
    /// Dot-delimited category, e.g. `word.found.noun`. REQUIRED.
    #[serde(rename = "type", default)]
    pub event_type: String,

    /// Producer-defined version of the event type.
    #[serde(
        rename = "eventTypeVersion",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub event_type_version: String,

    /// CloudEvents spec version. REQUIRED.
    #[serde(rename = "specversion", default)]
    pub spec_version: String,

    /// URI identifying the producer. REQUIRED.
    #[serde(default)]
    pub source: String,

    /// Deduplication key. REQUIRED.
    #[serde(default)]
    pub id: String,

    /// When the occurrence happened (RFC 3339 on the wire).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    /// Schema the payload adheres to.
    #[serde(rename = "schemaurl", default, skip_serializing_if = "String::is_empty")]
    pub schema_url: String,

    /// Media type of `data`.
    #[serde(rename = "contenttype", default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,

    /// The payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,

    /// Vendor or custom attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,

    /// Id of the event that caused this one.
    #[serde(rename = "relatedid", default, skip_serializing_if = "String::is_empty")]
    pub related_id: String,
}

impl<D> Default for EventRecord<D> {
    fn default() -> Self {
        Self {
            event_type: String::new(),
            event_type_version: String::new(),
            spec_version: String::new(),
            source: String::new(),
            id: String::new(),
            time: None,
            schema_url: String::new(),
            content_type: String::new(),
            data: None,
            extensions: None,
            related_id: String::new(),
        }
    }
}

impl<D> EventRecord<D> {
    /// Create an event with a fresh id, stamped with the current time.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            id: new_event_id(),
            time: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Set the payload.
    pub fn with_data(mut self, data: D) -> Self {
        self.data = Some(data);
        self
    }

    /// Pre-seed the extensions container shape.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Turn this event into a response to itself.
    ///
    /// The current id becomes `related_id` and a fresh id is minted.
    pub fn relate(&mut self) {
        self.related_id = std::mem::replace(&mut self.id, new_event_id());
    }

    /// Third dot-segment of the event type (`word.found.noun` -> `noun`).
    pub fn category(&self) -> Option<&str> {
        self.event_type
            .split('.')
            .nth(2)
            .filter(|segment| !segment.is_empty())
    }

    /// Check that every required attribute is set.
    ///
    /// Fields are checked in order: event type, spec version, source, id.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("type", &self.event_type),
            ("specversion", &self.spec_version),
            ("source", &self.source),
            ("id", &self.id),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(CloudEventError::MissingRequiredField(name));
            }
        }
        Ok(())
    }
}

/// Mint a new event id (UUID v4).
pub fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}
