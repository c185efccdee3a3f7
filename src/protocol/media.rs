//! Media type helpers for payload handling.

/// Payload media type assumed when nothing else is known.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Media type of a structured-mode CloudEvent body.
pub const CONTENT_TYPE_CLOUDEVENTS_JSON: &str = "application/cloudevents+json";

/// Reduce a `Content-Type` value to its lower-cased media type.
///
/// Parameters such as `charset` are dropped.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a media type carries JSON (`application/json` or `*+json`).
#[inline]
pub fn is_json(media_type: &str) -> bool {
    media_type == CONTENT_TYPE_JSON || media_type.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_strips_parameters() {
        assert_eq!(media_type("application/json; charset=UTF-8"), "application/json");
        assert_eq!(media_type("  Text/Plain "), "text/plain");
        assert_eq!(media_type(""), "");
    }

    #[test]
    fn test_is_json() {
        assert!(is_json("application/json"));
        assert!(is_json("application/cloudevents+json"));
        assert!(is_json("application/vnd.api+json"));
        assert!(!is_json("text/plain"));
        assert!(!is_json("application/json-seq"));
        assert!(!is_json(""));
    }
}
