//! Outgoing payload encoding.
//!
//! Form values are a closed tagged union decided where the caller builds
//! the request, so the encoder never probes types at runtime: a payload
//! either carries binary leaves (multipart path) or it does not (JSON or
//! urlencoded path).

use bytes::Bytes;

use crate::error::FetchError;

pub(crate) const CONTENT_TYPE_JSON: &str = "application/json";
pub(crate) const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
const FALLBACK_MIME: &str = "application/octet-stream";

/// A request body as supplied by the caller.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Raw text, sent as-is.
    Text(String),
    /// A structured value, serialized by the encoder.
    Json(serde_json::Value),
    /// Form-like key/value entries, possibly carrying files.
    Form(FormPayload),
}

/// Ordered form entries. Order is preserved through every encoding path.
pub type FormPayload = Vec<(String, FormValue)>;

/// One form value. The union is closed: every leaf kind is known here,
/// and [`contains_binary`] decides the encoding path once.
#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File(FilePart),
    FileList(Vec<FilePart>),
    Nested(Vec<(String, FormValue)>),
}

/// A binary file handle destined for a multipart part.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    /// Explicit MIME type; guessed from the file name when absent.
    pub mime: Option<String>,
    pub data: Bytes,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            data: data.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Effective MIME type: explicit value, extension guess, or
    /// octet-stream.
    pub fn mime_type(&self) -> String {
        if let Some(m) = &self.mime {
            return m.clone();
        }
        mime_guess::from_path(&self.file_name)
            .first_raw()
            .map(|s| s.to_string())
            .unwrap_or_else(|| FALLBACK_MIME.to_string())
    }
}

/// An encoded body, ready for the transport. Multipart stays plain data
/// so each retry attempt can rebuild a fresh form from it.
#[derive(Debug, Clone)]
pub enum EncodedBody {
    Empty,
    Text(String),
    Multipart(Vec<(String, PartValue)>),
}

/// One flattened multipart entry.
#[derive(Debug, Clone)]
pub enum PartValue {
    Text(String),
    File(FilePart),
}

/// Whether any leaf of the payload is a file or a non-empty file list.
/// Empty containers and all-text trees are not binary.
pub fn contains_binary(payload: &FormPayload) -> bool {
    payload.iter().any(|(_, value)| value_has_binary(value))
}

fn value_has_binary(value: &FormValue) -> bool {
    match value {
        FormValue::Text(_) => false,
        FormValue::File(_) => true,
        FormValue::FileList(files) => !files.is_empty(),
        FormValue::Nested(entries) => entries.iter().any(|(_, v)| value_has_binary(v)),
    }
}

/// Encode a request body, returning the wire form plus the content type
/// it implies (`None` when the transport or the caller owns the header,
/// which is always the case for multipart: the boundary belongs to the
/// transport).
///
/// Structured values with `auto_json` off are still serialized (a value
/// must become bytes somehow) but announce no content type; binary-free
/// forms take the urlencoded path instead.
pub fn encode_body(
    body: Option<RequestBody>,
    auto_json: bool,
) -> Result<(EncodedBody, Option<&'static str>), FetchError> {
    match body {
        None => Ok((EncodedBody::Empty, None)),
        Some(RequestBody::Text(text)) => Ok((EncodedBody::Text(text), None)),
        Some(RequestBody::Json(value)) => {
            let text = serde_json::to_string(&value)?;
            let content_type = auto_json.then_some(CONTENT_TYPE_JSON);
            Ok((EncodedBody::Text(text), content_type))
        }
        Some(RequestBody::Form(payload)) => {
            if contains_binary(&payload) {
                return Ok((EncodedBody::Multipart(flatten_multipart(&payload)), None));
            }
            if auto_json {
                let value = form_to_json(&payload)?;
                Ok((
                    EncodedBody::Text(serde_json::to_string(&value)?),
                    Some(CONTENT_TYPE_JSON),
                ))
            } else {
                let pairs = form_to_pairs(&payload)?;
                let text = serde_urlencoded::to_string(&pairs)
                    .map_err(|e| FetchError::runtime(e.to_string()))?;
                Ok((EncodedBody::Text(text), Some(CONTENT_TYPE_FORM)))
            }
        }
    }
}

/// Flatten a payload into ordered multipart entries. A file list expands
/// into repeated entries under the same key; nested entries flatten
/// under `parent[child]` names; order is otherwise preserved.
pub fn flatten_multipart(payload: &FormPayload) -> Vec<(String, PartValue)> {
    let mut parts = Vec::new();
    flatten_into(payload, None, &mut parts);
    parts
}

fn flatten_into(
    entries: &[(String, FormValue)],
    prefix: Option<&str>,
    parts: &mut Vec<(String, PartValue)>,
) {
    for (key, value) in entries {
        let name = match prefix {
            Some(p) => format!("{p}[{key}]"),
            None => key.clone(),
        };
        match value {
            FormValue::Text(text) => parts.push((name, PartValue::Text(text.clone()))),
            FormValue::File(file) => parts.push((name, PartValue::File(file.clone()))),
            FormValue::FileList(files) => {
                for file in files {
                    parts.push((name.clone(), PartValue::File(file.clone())));
                }
            }
            FormValue::Nested(inner) => flatten_into(inner, Some(&name), parts),
        }
    }
}

/// Build a JSON object from a binary-free payload. Nested entries become
/// nested objects; an empty file list becomes an empty array.
fn form_to_json(entries: &FormPayload) -> Result<serde_json::Value, FetchError> {
    let mut map = serde_json::Map::new();
    for (key, value) in entries {
        map.insert(key.clone(), value_to_json(value)?);
    }
    Ok(serde_json::Value::Object(map))
}

fn value_to_json(value: &FormValue) -> Result<serde_json::Value, FetchError> {
    match value {
        FormValue::Text(text) => Ok(serde_json::Value::String(text.clone())),
        FormValue::FileList(files) if files.is_empty() => {
            Ok(serde_json::Value::Array(Vec::new()))
        }
        FormValue::File(_) | FormValue::FileList(_) => Err(FetchError::runtime(
            "binary leaves take the multipart path",
        )),
        FormValue::Nested(inner) => {
            let mut map = serde_json::Map::new();
            for (key, value) in inner {
                map.insert(key.clone(), value_to_json(value)?);
            }
            Ok(serde_json::Value::Object(map))
        }
    }
}

/// Flatten a binary-free payload into urlencoded pairs. Empty file lists
/// contribute nothing.
fn form_to_pairs(entries: &FormPayload) -> Result<Vec<(String, String)>, FetchError> {
    let mut pairs = Vec::new();
    for (name, part) in flatten_multipart(entries) {
        match part {
            PartValue::Text(text) => pairs.push((name, text)),
            PartValue::File(_) => {
                return Err(FetchError::runtime(
                    "binary leaves take the multipart path",
                ));
            }
        }
    }
    Ok(pairs)
}
