//! Fallbacks for required-but-absent attributes, applied before encoding.

use crate::event::EventRecord;
use crate::protocol::CONTENT_TYPE_JSON;

/// Spec version written when an outbound event carries none.
pub const DEFAULT_SPEC_VERSION: &str = "0.1";

/// Source written when an outbound event carries none.
pub const DEFAULT_SOURCE: &str = "http://srcdog.com/cedemo";

/// Fills empty `specVersion`, `source` and `contentType` with fixed values.
///
/// Never overwrites a non-empty field, so applying it twice is the same as
/// applying it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsPolicy {
    /// Fallback spec version.
    pub spec_version: String,
    /// Fallback producer URI.
    pub source: String,
    /// Fallback payload media type.
    pub content_type: String,
}

impl Default for DefaultsPolicy {
    fn default() -> Self {
        Self {
            spec_version: DEFAULT_SPEC_VERSION.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            content_type: CONTENT_TYPE_JSON.to_string(),
        }
    }
}

impl DefaultsPolicy {
    /// Fill the empty fields of `event`.
    pub fn apply<D>(&self, event: &mut EventRecord<D>) {
        fill(&mut event.spec_version, &self.spec_version);
        fill(&mut event.source, &self.source);
        fill(&mut event.content_type, &self.content_type);
    }
}

fn fill(field: &mut String, fallback: &str) {
    if field.is_empty() {
        field.push_str(fallback);
    }
}
