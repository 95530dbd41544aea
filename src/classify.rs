//! Response classification by declared content type.

/// Handling strategy for a response body, derived from the
/// `Content-Type` header. The tag drives [`crate::body::read_body`];
/// callers never guess it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Text,
    Multipart,
    Binary,
    Unknown,
}

/// Map a declared content type to a [`BodyKind`]. First match wins,
/// ASCII-case-insensitive; an absent header is `Unknown`.
pub fn classify(content_type: Option<&str>) -> BodyKind {
    let Some(raw) = content_type else {
        return BodyKind::Unknown;
    };
    let ct = raw.trim().to_ascii_lowercase();

    if ct.contains("application/json") {
        BodyKind::Json
    } else if ct.starts_with("text/") {
        BodyKind::Text
    } else if ct.starts_with("multipart/") {
        BodyKind::Multipart
    } else if ct.starts_with("image/")
        || ct.starts_with("audio/")
        || ct.starts_with("video/")
        || ct.contains("application/octet-stream")
        || ct.contains("application/pdf")
    {
        BodyKind::Binary
    } else {
        BodyKind::Unknown
    }
}
