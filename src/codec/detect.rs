//! Structured vs binary mode detection.

use http::HeaderMap;

use crate::protocol::SchemaGeneration;

/// Wire representation of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Whole event as one JSON document.
    Structured,
    /// Attributes in `ce-*` headers, payload as the raw body.
    Binary,
}

/// Classifies inbound requests by their spec-version header.
///
/// Only the spec-version header is consulted; any other `ce-*` header alone
/// leaves the request in structured mode. The body is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeDetector {
    generation: SchemaGeneration,
    accept_legacy: bool,
}

impl ModeDetector {
    /// Detector for one generation; `accept_legacy` also honors the V01 header.
    pub fn new(generation: SchemaGeneration, accept_legacy: bool) -> Self {
        Self {
            generation,
            accept_legacy,
        }
    }

    /// Decide the mode of a request.
    pub fn detect(&self, headers: &HeaderMap) -> Mode {
        match self.binary_generation(headers) {
            Some(_) => Mode::Binary,
            None => Mode::Structured,
        }
    }

    /// Generation whose spec-version header marks `headers` as binary mode.
    ///
    /// The configured generation wins when both headers are present.
    pub(crate) fn binary_generation(&self, headers: &HeaderMap) -> Option<SchemaGeneration> {
        if has_value(headers, self.generation.headers().spec_version) {
            return Some(self.generation);
        }
        if self.accept_legacy
            && self.generation != SchemaGeneration::V01
            && has_value(headers, SchemaGeneration::V01.headers().spec_version)
        {
            return Some(SchemaGeneration::V01);
        }
        None
    }
}

fn has_value(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .map(|value| !value.as_bytes().trim_ascii().is_empty())
        .unwrap_or(false)
}
