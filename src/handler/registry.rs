//! Transform registry for dispatching events by type prefix.
//!
//! The registry maps event-type prefixes to transforms. Dispatch picks the
//! longest registered prefix that matches on a segment boundary, so
//! `word.found` matches `word.found.noun` but not `word.foundry.noun`.
//!
//! # Example
//!
//! ```
//! use cloudevent_codec::handler::TransformRegistry;
//! use cloudevent_codec::EventRecord;
//! use serde_json::json;
//!
//! let mut registry = TransformRegistry::new();
//! registry.register_fn("word.found", |event: &mut EventRecord| {
//!     event.data = Some(json!({"seen": true}));
//!     Ok(())
//! });
//!
//! let mut event: EventRecord = EventRecord::new("word.found.noun", "/sink");
//! registry.dispatch(&mut event).unwrap();
//! assert_eq!(event.data, Some(json!({"seen": true})));
//! ```

use std::sync::Arc;

use crate::error::{CloudEventError, Result};
use crate::event::EventRecord;

/// A rewrite applied to a decoded event before it is answered.
pub trait Transform: Send + Sync + 'static {
    /// Rewrite `event` in place.
    fn apply(&self, event: &mut EventRecord) -> Result<()>;
}

impl<T: Transform + ?Sized> Transform for Arc<T> {
    fn apply(&self, event: &mut EventRecord) -> Result<()> {
        (**self).apply(event)
    }
}

/// Wrapper turning a closure into a [`Transform`].
pub struct FnTransform<F>
where
    F: Fn(&mut EventRecord) -> Result<()> + Send + Sync + 'static,
{
    transform: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&mut EventRecord) -> Result<()> + Send + Sync + 'static,
{
    /// Create a new closure transform.
    pub fn new(transform: F) -> Self {
        Self { transform }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&mut EventRecord) -> Result<()> + Send + Sync + 'static,
{
    fn apply(&self, event: &mut EventRecord) -> Result<()> {
        (self.transform)(event)
    }
}

/// Entry for a registered prefix.
struct TransformEntry {
    prefix: String,
    transform: Box<dyn Transform>,
}

/// Registry mapping event-type prefixes to transforms.
///
/// Read-only once built; share it behind an `Arc`.
#[derive(Default)]
pub struct TransformRegistry {
    entries: Vec<TransformEntry>,
}

impl TransformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform for a prefix.
    ///
    /// Registering the same prefix again replaces the earlier transform.
    /// The empty prefix matches every event.
    pub fn register<T: Transform>(&mut self, prefix: &str, transform: T) {
        let transform: Box<dyn Transform> = Box::new(transform);
        match self.entries.iter_mut().find(|e| e.prefix == prefix) {
            Some(entry) => entry.transform = transform,
            None => self.entries.push(TransformEntry {
                prefix: prefix.to_string(),
                transform,
            }),
        }
    }

    /// Register a closure for a prefix.
    pub fn register_fn<F>(&mut self, prefix: &str, transform: F)
    where
        F: Fn(&mut EventRecord) -> Result<()> + Send + Sync + 'static,
    {
        self.register(prefix, FnTransform::new(transform));
    }

    /// Number of registered prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered prefixes, in registration order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.prefix.as_str())
    }

    /// Transform that would handle `event_type`, with its prefix.
    pub fn resolve(&self, event_type: &str) -> Option<(&str, &dyn Transform)> {
        self.entries
            .iter()
            .filter(|e| prefix_matches(&e.prefix, event_type))
            .max_by_key(|e| e.prefix.len())
            .map(|e| (e.prefix.as_str(), e.transform.as_ref()))
    }

    /// Apply the best-matching transform to `event`.
    pub fn dispatch(&self, event: &mut EventRecord) -> Result<()> {
        let (prefix, transform) = self
            .resolve(&event.event_type)
            .ok_or_else(|| CloudEventError::UnknownEventCategory(event.event_type.clone()))?;

        tracing::debug!("Dispatching {} via prefix {:?}", event.event_type, prefix);
        transform.apply(event)
    }
}

fn prefix_matches(prefix: &str, event_type: &str) -> bool {
    match event_type.strip_prefix(prefix) {
        Some(rest) => {
            prefix.is_empty() || prefix.ends_with('.') || rest.is_empty() || rest.starts_with('.')
        }
        None => false,
    }
}
