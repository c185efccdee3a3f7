//! Wire naming for the HTTP transport binding.
//!
//! Binary mode carries each attribute in its own `ce-*` header:
//! ```text
//! ┌──────────────────┬─────────────────────────┬──────────────────────┐
//! │ Attribute        │ V02 header              │ V01 header           │
//! ├──────────────────┼─────────────────────────┼──────────────────────┤
//! │ eventType        │ ce-type                 │ ce-eventtype         │
//! │ specVersion      │ ce-specversion          │ ce-cloudeventsversion│
//! │ id               │ ce-id                   │ ce-eventid           │
//! │ time             │ ce-time                 │ ce-eventtime         │
//! │ source           │ ce-source               │ ce-source            │
//! │ schemaURL        │ ce-schemaurl            │ ce-schemaurl         │
//! │ eventTypeVersion │ ce-eventtypeversion     │ ce-eventtypeversion  │
//! │ relatedID        │ ce-relatedid            │ ce-relatedid         │
//! │ extensions       │ ce-x-<name>             │ ce-x-<name>          │
//! └──────────────────┴─────────────────────────┴──────────────────────┘
//! ```
//!
//! Header values are JSON scalars, so a plain string travels quoted
//! (`ce-type: "word.found.noun"`). Names are compared lower-cased.

/// Prefix shared by every CloudEvents header.
pub const CE_HEADER_PREFIX: &str = "ce-";

/// Prefix for extension headers (`ce-x-<name>`).
pub const EXTENSION_HEADER_PREFIX: &str = "ce-x-";

/// Header carrying the payload media type in binary mode.
pub const CONTENT_TYPE_HEADER: &str = "content-type";

/// CloudEvents schema generation used on the wire.
///
/// The two drafts name the same attributes differently. A codec speaks
/// exactly one of them unless legacy acceptance is switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaGeneration {
    /// `eventType` / `cloudEventsVersion` / `eventID` naming.
    V01,
    /// `type` / `specversion` / `id` naming.
    #[default]
    V02,
}

impl SchemaGeneration {
    /// Binary-mode header names for this generation.
    #[inline]
    pub fn headers(self) -> &'static HeaderNames {
        match self {
            SchemaGeneration::V01 => &V01_HEADERS,
            SchemaGeneration::V02 => &V02_HEADERS,
        }
    }
}

/// Binary-mode header names of one schema generation (all lower-case).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderNames {
    /// Event type header.
    pub event_type: &'static str,
    /// Event type version header.
    pub event_type_version: &'static str,
    /// Spec version header; its presence selects binary mode.
    pub spec_version: &'static str,
    /// Source header.
    pub source: &'static str,
    /// Event id header.
    pub id: &'static str,
    /// Event time header.
    pub time: &'static str,
    /// Schema URL header.
    pub schema_url: &'static str,
    /// Related id header.
    pub related_id: &'static str,
}

/// Header names of the `type`/`specversion`/`id` generation.
pub static V02_HEADERS: HeaderNames = HeaderNames {
    event_type: "ce-type",
    event_type_version: "ce-eventtypeversion",
    spec_version: "ce-specversion",
    source: "ce-source",
    id: "ce-id",
    time: "ce-time",
    schema_url: "ce-schemaurl",
    related_id: "ce-relatedid",
};

/// Header names of the `eventType`/`cloudEventsVersion`/`eventID` generation.
pub static V01_HEADERS: HeaderNames = HeaderNames {
    event_type: "ce-eventtype",
    event_type_version: "ce-eventtypeversion",
    spec_version: "ce-cloudeventsversion",
    source: "ce-source",
    id: "ce-eventid",
    time: "ce-eventtime",
    schema_url: "ce-schemaurl",
    related_id: "ce-relatedid",
};

/// Structured-mode JSON keys that differ between generations, as
/// `(V02 key, V01 key)` pairs. Keys not listed are shared.
pub const LEGACY_JSON_KEYS: [(&str, &str); 7] = [
    ("type", "eventType"),
    ("specversion", "cloudEventsVersion"),
    ("id", "eventID"),
    ("time", "eventTime"),
    ("schemaurl", "schemaURL"),
    ("contenttype", "contentType"),
    ("relatedid", "relatedID"),
];

/// JSON key whose presence marks a V01 structured document.
pub const LEGACY_MARKER_KEY: &str = "cloudEventsVersion";

/// Extract the extension key from a lower-cased header name.
///
/// Returns `None` for non-extension headers and for a bare `ce-x-`.
///
/// # Example
///
/// ```
/// use cloudevent_codec::protocol::extension_key;
///
/// assert_eq!(extension_key("ce-x-foo"), Some("foo"));
/// assert_eq!(extension_key("ce-type"), None);
/// ```
#[inline]
pub fn extension_key(header: &str) -> Option<&str> {
    header
        .strip_prefix(EXTENSION_HEADER_PREFIX)
        .filter(|key| !key.is_empty())
}

/// Build the extension header name for a key.
#[inline]
pub fn extension_header(key: &str) -> String {
    format!("{}{}", EXTENSION_HEADER_PREFIX, key.to_ascii_lowercase())
}
