//! Binary mode: attributes in `ce-*` headers, payload as the raw body.
//!
//! Decoding is staged. Every header and the body are parsed first and the
//! target is only written once all of them succeeded, so a failed decode
//! leaves the target as it was.
//!
//! The body is JSON when the content type says so (or is absent); an empty
//! JSON body means no payload. Any other body is opaque and becomes a
//! string, empty or not. Opaque bytes that are not valid UTF-8 are
//! converted lossily: each invalid sequence turns into U+FFFD.
//!
//! # Example
//!
//! ```
//! use cloudevent_codec::codec::BinaryDecoder;
//! use cloudevent_codec::protocol::SchemaGeneration;
//! use cloudevent_codec::EventRecord;
//! use http::{HeaderMap, HeaderValue};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("ce-specversion", HeaderValue::from_static("\"0.1\""));
//! headers.insert("ce-type", HeaderValue::from_static("\"word.found.verb\""));
//! headers.insert("ce-id", HeaderValue::from_static("\"7\""));
//!
//! let mut event: EventRecord = EventRecord::default();
//! BinaryDecoder::new(SchemaGeneration::V02)
//!     .decode_into(&headers, b"", &mut event)
//!     .unwrap();
//! assert_eq!(event.event_type, "word.found.verb");
//! assert!(event.time.is_some());
//! ```

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::WireMessage;
use crate::error::{CloudEventError, Result};
use crate::event::{EventRecord, Extensions};
use crate::protocol::{
    extension_header, extension_key, is_json, media_type, HeaderNames, SchemaGeneration,
    CONTENT_TYPE_JSON,
};

/// Reads binary-mode headers and body into an [`EventRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryDecoder {
    generation: SchemaGeneration,
}

impl BinaryDecoder {
    /// Decoder for the headers of one schema generation.
    pub fn new(generation: SchemaGeneration) -> Self {
        Self { generation }
    }

    /// Decode `headers` and `body` on top of `target`.
    ///
    /// Present headers always override what `target` already holds. `time`
    /// falls back to the current time when its header is absent or malformed.
    pub fn decode_into<D: DeserializeOwned>(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        target: &mut EventRecord<D>,
    ) -> Result<()> {
        let names = self.generation.headers();

        // Stage everything fallible before touching the target
        let event_type = read_string(headers, names.event_type)?;
        let event_type_version = read_string(headers, names.event_type_version)?;
        let spec_version = read_string(headers, names.spec_version)?;
        let source = read_string(headers, names.source)?;
        let id = read_string(headers, names.id)?;
        let schema_url = read_string(headers, names.schema_url)?;
        let related_id = read_string(headers, names.related_id)?;
        let time = read_time(headers, names.time);
        let extensions = stage_extensions(headers, target.extensions.as_ref())?;

        let content_type = headers
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        let media = media_type(content_type.as_deref().unwrap_or(CONTENT_TYPE_JSON));
        let data = decode_body::<D>(&media, body)?;

        // Commit
        assign(&mut target.event_type, event_type);
        assign(&mut target.event_type_version, event_type_version);
        assign(&mut target.spec_version, spec_version);
        assign(&mut target.source, source);
        assign(&mut target.id, id);
        assign(&mut target.schema_url, schema_url);
        assign(&mut target.related_id, related_id);
        assign(&mut target.content_type, content_type);
        target.time = Some(time);
        target.data = data;
        extensions.commit(&mut target.extensions);

        Ok(())
    }
}

/// Encode `event` as binary-mode headers plus a payload-only body.
///
/// Extensions become `ce-x-*` headers only when `emit_extensions` is set.
pub(crate) fn encode<D: Serialize>(
    event: &EventRecord<D>,
    names: &HeaderNames,
    emit_extensions: bool,
) -> Result<WireMessage> {
    let mut headers = HeaderMap::new();

    if !event.content_type.is_empty() {
        let value = HeaderValue::from_str(&event.content_type)
            .map_err(|e| CloudEventError::header_encode(CONTENT_TYPE.as_str(), e))?;
        headers.insert(CONTENT_TYPE, value);
    }

    put_string(&mut headers, names.event_type, &event.event_type)?;
    put_string(&mut headers, names.spec_version, &event.spec_version)?;
    put_string(&mut headers, names.source, &event.source)?;
    put_string(&mut headers, names.id, &event.id)?;
    if let Some(time) = event.time {
        let stamp = time.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        put_string(&mut headers, names.time, &stamp)?;
    }
    for (name, value) in [
        (names.event_type_version, &event.event_type_version),
        (names.schema_url, &event.schema_url),
        (names.related_id, &event.related_id),
    ] {
        if !value.is_empty() {
            put_string(&mut headers, name, value)?;
        }
    }

    if emit_extensions {
        if let Some(extensions) = &event.extensions {
            for (key, value) in extensions.entries() {
                put_json(&mut headers, &extension_header(key), &value)?;
            }
        }
    }

    let body = encode_body(event)?;
    Ok(WireMessage { headers, body })
}

/// Extension values staged for commit, shaped like the target container.
enum StagedExtensions {
    None,
    Strings(Vec<(String, String)>),
    Values(Vec<(String, Value)>),
}

impl StagedExtensions {
    fn commit(self, container: &mut Option<Extensions>) {
        match self {
            StagedExtensions::None => {}
            StagedExtensions::Strings(entries) => {
                if let Some(Extensions::Strings(map)) = container {
                    map.extend(entries);
                }
            }
            StagedExtensions::Values(entries) => match container {
                Some(Extensions::Values(map)) => map.extend(entries),
                _ => *container = Some(Extensions::Values(entries.into_iter().collect())),
            },
        }
    }
}

fn stage_extensions(
    headers: &HeaderMap,
    container: Option<&Extensions>,
) -> Result<StagedExtensions> {
    let mut found = headers
        .keys()
        .filter_map(|name| extension_key(name.as_str()).map(|key| (name, key)))
        .peekable();
    if found.peek().is_none() {
        return Ok(StagedExtensions::None);
    }

    match container {
        Some(Extensions::Strings(_)) => found
            .map(|(name, key)| decode_header::<String>(headers, name).map(|v| (key.to_string(), v)))
            .collect::<Result<Vec<_>>>()
            .map(StagedExtensions::Strings),
        // Nothing seen yet defaults to the value map
        None | Some(Extensions::Values(_)) => found
            .map(|(name, key)| decode_header::<Value>(headers, name).map(|v| (key.to_string(), v)))
            .collect::<Result<Vec<_>>>()
            .map(StagedExtensions::Values),
        Some(Extensions::Other(_)) => Err(CloudEventError::UnsupportedExtensionContainer),
    }
}

fn decode_header<T: DeserializeOwned>(headers: &HeaderMap, name: &HeaderName) -> Result<T> {
    let raw = headers.get(name).map(HeaderValue::as_bytes).unwrap_or_default();
    serde_json::from_slice(raw).map_err(|e| CloudEventError::header_decode(name.as_str(), e))
}

fn read_string(headers: &HeaderMap, name: &str) -> Result<Option<String>> {
    match headers.get(name) {
        Some(value) => serde_json::from_slice(value.as_bytes())
            .map(Some)
            .map_err(|e| CloudEventError::header_decode(name, e)),
        None => Ok(None),
    }
}

/// Lenient: a malformed or missing time never fails the decode.
fn read_time(headers: &HeaderMap, name: &str) -> DateTime<Utc> {
    let parsed = headers.get(name).and_then(|value| {
        let raw = value.as_bytes();
        let text = serde_json::from_slice::<String>(raw)
            .ok()
            .or_else(|| std::str::from_utf8(raw).ok().map(str::to_string))?;
        DateTime::parse_from_rfc3339(text.trim()).ok()
    });

    match parsed {
        Some(time) => time.with_timezone(&Utc),
        None => {
            tracing::debug!("{} missing or malformed, using current time", name);
            Utc::now()
        }
    }
}

fn decode_body<D: DeserializeOwned>(media: &str, body: &[u8]) -> Result<Option<D>> {
    if is_json(media) {
        if body.trim_ascii().is_empty() {
            return Ok(None);
        }
        serde_json::from_slice::<Option<D>>(body).map_err(CloudEventError::BodyDecode)
    } else {
        // Opaque bodies are kept as-is, even when empty
        let text = String::from_utf8_lossy(body).into_owned();
        serde_json::from_value::<D>(Value::String(text))
            .map(Some)
            .map_err(CloudEventError::BodyDecode)
    }
}

fn encode_body<D: Serialize>(event: &EventRecord<D>) -> Result<Bytes> {
    let Some(data) = &event.data else {
        return Ok(Bytes::new());
    };

    if is_json(&media_type(&event.content_type)) {
        return serde_json::to_vec(data)
            .map(Bytes::from)
            .map_err(CloudEventError::Encode);
    }

    match serde_json::to_value(data).map_err(CloudEventError::Encode)? {
        Value::String(text) => Ok(Bytes::from(text)),
        other => serde_json::to_vec(&other)
            .map(Bytes::from)
            .map_err(CloudEventError::Encode),
    }
}

fn assign(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn put_string(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    put_json(headers, name, &Value::String(value.to_string()))
}

fn put_json(headers: &mut HeaderMap, name: &str, value: &Value) -> Result<()> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| CloudEventError::header_encode(name, e))?;
    let encoded = serde_json::to_string(value).map_err(CloudEventError::Encode)?;
    let header_value =
        HeaderValue::from_str(&encoded).map_err(|e| CloudEventError::header_encode(name, e))?;
    headers.insert(header_name, header_value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::Deserialize;
    use serde_json::json;

    fn binary_headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert("ce-specversion", HeaderValue::from_static("\"0.1\""));
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn decode(headers: &HeaderMap, body: &[u8]) -> Result<EventRecord> {
        let mut event = EventRecord::default();
        BinaryDecoder::default().decode_into(headers, body, &mut event)?;
        Ok(event)
    }

    #[test]
    fn test_decodes_attribute_headers() {
        let headers = binary_headers(&[
            ("ce-type", "\"word.found.verb\""),
            ("ce-id", "\"7\""),
            ("ce-source", "\"/sink\""),
            ("ce-schemaurl", "\"http://www.json.org\""),
            ("ce-eventtypeversion", "\"1.0\""),
            ("ce-relatedid", "\"6\""),
            ("ce-time", "\"2018-04-01T12:30:00Z\""),
        ]);
        let event = decode(&headers, b"").unwrap();

        assert_eq!(event.event_type, "word.found.verb");
        assert_eq!(event.spec_version, "0.1");
        assert_eq!(event.id, "7");
        assert_eq!(event.source, "/sink");
        assert_eq!(event.schema_url, "http://www.json.org");
        assert_eq!(event.event_type_version, "1.0");
        assert_eq!(event.related_id, "6");
        assert_eq!(
            event.time,
            Some(Utc.with_ymd_and_hms(2018, 4, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(event.data, None);
    }

    #[test]
    fn test_missing_time_is_now() {
        let before = Utc::now();
        let event = decode(&binary_headers(&[("ce-type", "\"word.found.verb\"")]), b"").unwrap();
        let after = Utc::now();

        let time = event.time.expect("time is always set in binary mode");
        assert!(time >= before && time <= after);
    }

    #[test]
    fn test_malformed_time_is_now() {
        for bad in ["\"yesterday\"", "not json at all", "42", "\"\""] {
            let mut headers = binary_headers(&[]);
            headers.insert("ce-time", HeaderValue::from_static(bad));

            let before = Utc::now();
            let event = decode(&headers, b"").unwrap();
            let time = event.time.unwrap();
            assert!(time >= before && time <= Utc::now(), "input {:?}", bad);
        }
    }

    #[test]
    fn test_unquoted_time_is_accepted() {
        let headers = binary_headers(&[("ce-time", "2018-04-01T12:30:00+02:00")]);
        let event = decode(&headers, b"").unwrap();
        assert_eq!(
            event.time,
            Some(Utc.with_ymd_and_hms(2018, 4, 1, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_malformed_header_is_fatal() {
        let headers = binary_headers(&[("ce-type", "word.found.verb")]);
        match decode(&headers, b"") {
            Err(CloudEventError::HeaderDecode { header, .. }) => assert_eq!(header, "ce-type"),
            other => panic!("expected HeaderDecode, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_decode_leaves_target_untouched() {
        let headers = binary_headers(&[("ce-type", "\"ok\""), ("ce-id", "{broken")]);
        let mut event: EventRecord = EventRecord::default();
        event.event_type = "before".to_string();

        let result = BinaryDecoder::default().decode_into(&headers, b"", &mut event);
        assert!(result.is_err());
        assert_eq!(event.event_type, "before");
        assert!(event.time.is_none());
    }

    #[test]
    fn test_headers_override_existing_fields() {
        let headers = binary_headers(&[("ce-type", "\"from.header\"")]);
        let mut event: EventRecord = EventRecord::default();
        event.event_type = "from.body".to_string();
        event.source = "kept".to_string();

        BinaryDecoder::default()
            .decode_into(&headers, b"", &mut event)
            .unwrap();
        assert_eq!(event.event_type, "from.header");
        assert_eq!(event.source, "kept");
    }

    #[test]
    fn test_extensions_default_to_value_map() {
        let headers = binary_headers(&[("ce-x-foo", "\"bar\""), ("ce-x-count", "3")]);
        let event = decode(&headers, b"").unwrap();

        match event.extensions {
            Some(Extensions::Values(map)) => {
                assert_eq!(map["foo"], json!("bar"));
                assert_eq!(map["count"], json!(3));
            }
            other => panic!("expected value map, got {:?}", other),
        }
    }

    #[test]
    fn test_extensions_into_preseeded_string_map() {
        let headers = binary_headers(&[("ce-x-foo", "\"bar\"")]);
        let mut event: EventRecord = EventRecord::default().with_extensions(Extensions::strings());

        BinaryDecoder::default()
            .decode_into(&headers, b"", &mut event)
            .unwrap();
        match event.extensions {
            Some(Extensions::Strings(map)) => assert_eq!(map["foo"], "bar"),
            other => panic!("expected string map, got {:?}", other),
        }
    }

    #[test]
    fn test_string_map_rejects_non_string_extension() {
        let headers = binary_headers(&[("ce-x-count", "3")]);
        let mut event: EventRecord = EventRecord::default().with_extensions(Extensions::strings());

        let err = BinaryDecoder::default()
            .decode_into(&headers, b"", &mut event)
            .unwrap_err();
        assert!(matches!(err, CloudEventError::HeaderDecode { ref header, .. } if header == "ce-x-count"));
    }

    #[test]
    fn test_other_container_is_unsupported() {
        let headers = binary_headers(&[("ce-x-foo", "\"bar\"")]);
        let mut event: EventRecord =
            EventRecord::default().with_extensions(Extensions::Other(json!("opaque")));

        let err = BinaryDecoder::default()
            .decode_into(&headers, b"", &mut event)
            .unwrap_err();
        assert!(matches!(err, CloudEventError::UnsupportedExtensionContainer));
    }

    #[test]
    fn test_other_container_without_extension_headers_is_fine() {
        let mut event: EventRecord =
            EventRecord::default().with_extensions(Extensions::Other(json!("opaque")));
        BinaryDecoder::default()
            .decode_into(&binary_headers(&[]), b"", &mut event)
            .unwrap();
        assert_eq!(event.extensions, Some(Extensions::Other(json!("opaque"))));
    }

    #[test]
    fn test_json_body_and_content_type() {
        let headers = binary_headers(&[("content-type", "application/json; charset=utf-8")]);
        let event = decode(&headers, br#"{"word":"frog"}"#).unwrap();
        assert_eq!(event.data, Some(json!({"word": "frog"})));
        assert_eq!(event.content_type, "application/json; charset=utf-8");
    }

    #[test]
    fn test_plus_json_body_is_decoded() {
        let headers = binary_headers(&[("content-type", "application/vnd.words+json")]);
        let event = decode(&headers, b"[1,2]").unwrap();
        assert_eq!(event.data, Some(json!([1, 2])));
    }

    #[test]
    fn test_opaque_body_is_string() {
        let headers = binary_headers(&[("content-type", "text/plain")]);
        let event = decode(&headers, b"{not json}").unwrap();
        assert_eq!(event.data, Some(json!("{not json}")));
        assert_eq!(event.content_type, "text/plain");
    }

    #[test]
    fn test_empty_opaque_body_is_kept() {
        let bodies: [&[u8]; 3] = [b"", b"   ", b"\n"];
        for body in bodies {
            let headers = binary_headers(&[("content-type", "text/plain")]);
            let event = decode(&headers, body).unwrap();
            let expected = std::str::from_utf8(body).unwrap();
            assert_eq!(event.data, Some(json!(expected)), "body {:?}", body);
        }
    }

    #[test]
    fn test_empty_json_body_is_no_data() {
        let headers = binary_headers(&[("content-type", "application/json")]);
        assert_eq!(decode(&headers, b"").unwrap().data, None);
        assert_eq!(decode(&headers, b"  \n").unwrap().data, None);
        assert_eq!(decode(&headers, b"null").unwrap().data, None);
    }

    #[test]
    fn test_non_utf8_opaque_body_is_lossy() {
        let headers = binary_headers(&[("content-type", "application/octet-stream")]);
        let event = decode(&headers, &[0xff, 0xfe, 0x41]).unwrap();
        assert_eq!(event.data, Some(json!("\u{fffd}\u{fffd}A")));
    }

    #[test]
    fn test_missing_content_type_decodes_json() {
        let event = decode(&binary_headers(&[]), br#"{"a":1}"#).unwrap();
        assert_eq!(event.data, Some(json!({"a": 1})));
        assert!(event.content_type.is_empty());
    }

    #[test]
    fn test_malformed_json_body_is_fatal() {
        let headers = binary_headers(&[("content-type", "application/json")]);
        assert!(matches!(
            decode(&headers, b"{oops"),
            Err(CloudEventError::BodyDecode(_))
        ));
    }

    #[test]
    fn test_typed_body() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Word {
            word: String,
        }

        let headers = binary_headers(&[("content-type", "application/json")]);
        let mut event: EventRecord<Word> = EventRecord::default();
        BinaryDecoder::default()
            .decode_into(&headers, br#"{"word":"frog"}"#, &mut event)
            .unwrap();
        assert_eq!(event.data, Some(Word { word: "frog".to_string() }));
    }

    #[test]
    fn test_v01_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("ce-cloudeventsversion", HeaderValue::from_static("\"0.1\""));
        headers.insert("ce-eventtype", HeaderValue::from_static("\"com.event.fortytwo\""));
        headers.insert("ce-eventid", HeaderValue::from_static("\"42\""));

        let mut event: EventRecord = EventRecord::default();
        BinaryDecoder::new(SchemaGeneration::V01)
            .decode_into(&headers, b"", &mut event)
            .unwrap();
        assert_eq!(event.event_type, "com.event.fortytwo");
        assert_eq!(event.id, "42");
        assert_eq!(event.spec_version, "0.1");
    }

    #[test]
    fn test_encode_writes_quoted_headers() {
        let mut event: EventRecord = EventRecord::default();
        event.event_type = "word.picked.noun".to_string();
        event.spec_version = "0.1".to_string();
        event.source = "/sink".to_string();
        event.id = "1".to_string();
        event.related_id = "42".to_string();
        event.content_type = "application/json".to_string();
        event.data = Some(json!({"word": "frog"}));

        let message = encode(&event, &crate::protocol::V02_HEADERS, false).unwrap();
        assert_eq!(message.headers["ce-type"], "\"word.picked.noun\"");
        assert_eq!(message.headers["ce-relatedid"], "\"42\"");
        assert_eq!(message.headers["content-type"], "application/json");
        assert!(message.headers.get("ce-time").is_none());
        assert!(message.headers.get("ce-schemaurl").is_none());
        assert_eq!(&message.body[..], br#"{"word":"frog"}"#);
    }

    #[test]
    fn test_encode_skips_extensions_unless_enabled() {
        let mut event: EventRecord = EventRecord::default().with_extensions(Extensions::values());
        if let Some(Extensions::Values(map)) = &mut event.extensions {
            map.insert("foo".to_string(), json!("bar"));
        }

        let plain = encode(&event, &crate::protocol::V02_HEADERS, false).unwrap();
        assert!(plain.headers.get("ce-x-foo").is_none());

        let with_ext = encode(&event, &crate::protocol::V02_HEADERS, true).unwrap();
        assert_eq!(with_ext.headers["ce-x-foo"], "\"bar\"");
    }

    #[test]
    fn test_encode_opaque_string_body_is_raw() {
        let mut event: EventRecord = EventRecord::default();
        event.content_type = "text/plain".to_string();
        event.data = Some(json!("hello world"));

        let message = encode(&event, &crate::protocol::V02_HEADERS, false).unwrap();
        assert_eq!(&message.body[..], b"hello world");
    }

    #[test]
    fn test_encode_rejects_bad_extension_key() {
        let mut event: EventRecord = EventRecord::default().with_extensions(Extensions::values());
        if let Some(Extensions::Values(map)) = &mut event.extensions {
            map.insert("has space".to_string(), json!(1));
        }
        let err = encode(&event, &crate::protocol::V02_HEADERS, true).unwrap_err();
        assert!(matches!(err, CloudEventError::HeaderEncode { .. }));
    }
}
