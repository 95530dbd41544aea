//! Classification-driven decoding of response bodies.
//!
//! The transport hands back the full body as [`Bytes`], so decoding
//! always works on a cheap duplicate of the buffer; classifying and
//! reading never consume the only readable copy.

use bytes::Bytes;

use crate::classify::BodyKind;
use crate::error::FetchError;

/// A decoded response body, tagged by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(serde_json::Value),
    Text(String),
    Binary(Bytes),
}

impl ParsedBody {
    /// Deserialize a JSON body into a concrete type. Non-JSON bodies and
    /// mismatched shapes are `Runtime` faults.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, FetchError> {
        match self {
            Self::Json(value) => Ok(serde_json::from_value(value.clone())?),
            Self::Text(_) | Self::Binary(_) => {
                Err(FetchError::runtime("response body is not JSON"))
            }
        }
    }
}

/// Decode a captured body according to its classification.
///
/// Malformed JSON is a `Runtime` fault; the caller decides whether to
/// fall back. Multipart bodies are returned as raw text without boundary
/// parsing. `Unknown` falls back to the raw byte buffer.
pub fn read_body(kind: BodyKind, bytes: &Bytes) -> Result<ParsedBody, FetchError> {
    match kind {
        BodyKind::Json => Ok(ParsedBody::Json(serde_json::from_slice(bytes)?)),
        BodyKind::Text | BodyKind::Multipart => {
            Ok(ParsedBody::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
        BodyKind::Binary | BodyKind::Unknown => Ok(ParsedBody::Binary(bytes.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_round_trips() {
        let bytes = Bytes::from_static(br#"{"ok":true,"n":3}"#);
        let parsed = read_body(BodyKind::Json, &bytes).unwrap();
        assert_eq!(
            parsed,
            ParsedBody::Json(serde_json::json!({"ok": true, "n": 3}))
        );
    }

    #[test]
    fn malformed_json_is_a_runtime_fault() {
        let bytes = Bytes::from_static(b"{not json");
        let err = read_body(BodyKind::Json, &bytes).unwrap_err();
        assert!(matches!(err, FetchError::Runtime { .. }));
    }

    #[test]
    fn text_decodes_lossily() {
        let bytes = Bytes::from(vec![b'h', b'i', 0xff]);
        let parsed = read_body(BodyKind::Text, &bytes).unwrap();
        assert_eq!(parsed, ParsedBody::Text("hi\u{fffd}".to_string()));
    }

    #[test]
    fn multipart_is_raw_text() {
        let bytes = Bytes::from_static(b"--b\r\ncontent\r\n--b--");
        let parsed = read_body(BodyKind::Multipart, &bytes).unwrap();
        assert!(matches!(parsed, ParsedBody::Text(t) if t.starts_with("--b")));
    }

    #[test]
    fn binary_and_unknown_duplicate_without_consuming() {
        let bytes = Bytes::from_static(&[0, 159, 146, 150]);
        let a = read_body(BodyKind::Binary, &bytes).unwrap();
        let b = read_body(BodyKind::Unknown, &bytes).unwrap();
        assert_eq!(a, ParsedBody::Binary(bytes.clone()));
        assert_eq!(b, ParsedBody::Binary(bytes.clone()));
        // The source buffer is still intact after both reads.
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn decode_into_typed_struct() {
        #[derive(serde::Deserialize)]
        struct Flag {
            ok: bool,
        }
        let parsed = ParsedBody::Json(serde_json::json!({"ok": true}));
        let flag: Flag = parsed.decode().unwrap();
        assert!(flag.ok);

        let text = ParsedBody::Text("ok".into());
        assert!(text.decode::<Flag>().is_err());
    }
}
