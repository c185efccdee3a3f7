//! Word vocabulary - picks a random word for an event's category.
//!
//! The table is a JSON object of category to words:
//!
//! ```json
//! {"noun": ["frog", "kettle"], "verb": ["jump"]}
//! ```
//!
//! It is loaded once and then only read, so clones share one table.
//!
//! # Example
//!
//! ```
//! use cloudevent_codec::handler::Transform;
//! use cloudevent_codec::vocabulary::Vocabulary;
//! use cloudevent_codec::EventRecord;
//!
//! let words = Vocabulary::from_json(r#"{"noun": ["frog"]}"#).unwrap();
//! let mut event: EventRecord = EventRecord::new("word.found.noun", "/sink");
//!
//! words.apply(&mut event).unwrap();
//! assert_eq!(event.event_type, "word.picked.noun");
//! assert_eq!(event.data, Some(serde_json::json!({"word": "frog"})));
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde_json::json;

use crate::error::{CloudEventError, Result};
use crate::event::EventRecord;
use crate::handler::Transform;

/// Event-type prefix the vocabulary is normally registered under.
pub const WORD_FOUND_PREFIX: &str = "word.found";

/// Event-type prefix of the events it produces.
pub const WORD_PICKED_PREFIX: &str = "word.picked";

/// Category to candidate words, shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: Arc<HashMap<String, Vec<String>>>,
}

impl Vocabulary {
    /// Build from an in-memory table.
    pub fn new(words: HashMap<String, Vec<String>>) -> Self {
        Self {
            words: Arc::new(words),
        }
    }

    /// Load a table from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let words = serde_json::from_reader(reader).map_err(CloudEventError::Vocabulary)?;
        Ok(Self::new(words))
    }

    /// Load a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a table from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_reader(json.as_bytes())
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the table has no categories.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words known for a category.
    pub fn words(&self, category: &str) -> Option<&[String]> {
        self.words.get(category).map(Vec::as_slice)
    }

    /// A random word from `category`, if it has any.
    pub fn pick(&self, category: &str) -> Option<&str> {
        let candidates = self.words(category)?;
        if candidates.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..candidates.len());
        Some(candidates[index].as_str())
    }
}

impl Transform for Vocabulary {
    fn apply(&self, event: &mut EventRecord) -> Result<()> {
        let unknown = || CloudEventError::UnknownEventCategory(event.event_type.clone());
        let category = event.category().ok_or_else(unknown)?.to_string();
        let word = self.pick(&category).ok_or_else(unknown)?.to_string();

        tracing::debug!("Picked {:?} for category {}", word, category);
        event.data = Some(json!({ "word": word }));
        event.event_type = format!("{}.{}", WORD_PICKED_PREFIX, category);
        event.time = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{"noun": ["frog", "kettle", "moon"], "verb": ["jump"], "adverb": []}"#;

    #[test]
    fn test_load_from_json() {
        let words = Vocabulary::from_json(TABLE).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words.words("verb"), Some(&["jump".to_string()][..]));
        assert!(words.words("adjective").is_none());
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Vocabulary::from_json("[1, 2]"),
            Err(CloudEventError::Vocabulary(_))
        ));
        assert!(matches!(
            Vocabulary::from_json("{\"noun\": "),
            Err(CloudEventError::Vocabulary(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Vocabulary::from_path("/nonexistent/words.json"),
            Err(CloudEventError::Io(_))
        ));
    }

    #[test]
    fn test_pick_stays_in_category() {
        let words = Vocabulary::from_json(TABLE).unwrap();
        for _ in 0..50 {
            let word = words.pick("noun").unwrap();
            assert!(["frog", "kettle", "moon"].contains(&word));
        }
        assert_eq!(words.pick("adverb"), None);
        assert_eq!(words.pick("missing"), None);
    }

    #[test]
    fn test_apply_rewrites_event() {
        let words = Vocabulary::from_json(TABLE).unwrap();
        let mut event: EventRecord = EventRecord::new("word.found.verb", "/sink");
        event.time = None;
        let id = event.id.clone();

        words.apply(&mut event).unwrap();
        assert_eq!(event.event_type, "word.picked.verb");
        assert_eq!(event.data, Some(json!({"word": "jump"})));
        assert!(event.time.is_some());
        // Ids are the caller's business
        assert_eq!(event.id, id);
    }

    #[test]
    fn test_apply_unknown_category() {
        let words = Vocabulary::from_json(TABLE).unwrap();

        for event_type in ["word.found.adjective", "word.found.adverb", "word.found", "word"] {
            let mut event: EventRecord = EventRecord::new(event_type, "/sink");
            match words.apply(&mut event) {
                Err(CloudEventError::UnknownEventCategory(t)) => assert_eq!(t, event_type),
                other => panic!("expected UnknownEventCategory, got {:?}", other),
            }
            assert_eq!(event.event_type, event_type);
        }
    }

    #[test]
    fn test_clones_share_table() {
        let words = Vocabulary::from_json(TABLE).unwrap();
        let copy = words.clone();
        assert!(Arc::ptr_eq(&words.words, &copy.words));
    }
}
