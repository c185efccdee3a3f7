//! Handler module - event transforms and dispatch.
//!
//! Provides:
//! - [`Transform`] - rewrites a decoded event in place
//! - [`TransformRegistry`] - maps event-type prefixes to transforms
//! - [`InboundRequest`] / [`Reply`] - the HTTP-shaped service boundary
//!
//! # Example
//!
//! ```
//! use cloudevent_codec::handler::{Transform, TransformRegistry};
//! use cloudevent_codec::{EventRecord, Result};
//!
//! struct Shout;
//!
//! impl Transform for Shout {
//!     fn apply(&self, event: &mut EventRecord) -> Result<()> {
//!         event.event_type = event.event_type.to_uppercase();
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = TransformRegistry::new();
//! registry.register("word", Shout);
//! ```

mod context;
mod registry;

pub use context::{InboundRequest, Reply};
pub use registry::{FnTransform, Transform, TransformRegistry};
