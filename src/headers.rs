//! Request header construction.
//!
//! A small configuration expands into a `HeaderMap`. Precedence, highest
//! first: explicit extra entries, the CSRF header, bearer auth, then the
//! defaults (`Accept: application/json`, and a JSON content type when
//! `json` is set). The executor strips `Content-Type` again for
//! multipart bodies; the transport owns the boundary.

use std::collections::HashMap;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::error::FetchError;

/// Header name the CSRF token travels under, matching the `csrftoken`
/// cookie convention.
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Inputs for [`HeaderConfig::build`]. Pure configuration; building has
/// no side effects.
#[derive(Debug, Clone)]
pub struct HeaderConfig {
    /// Announce a JSON content type by default.
    pub json: bool,
    pub bearer_token: Option<String>,
    pub csrf_token: Option<String>,
    /// Explicit overrides; these win over everything else.
    pub extra: HashMap<String, String>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            json: true,
            bearer_token: None,
            csrf_token: None,
            extra: HashMap::new(),
        }
    }
}

impl HeaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Whether the extra entries explicitly pin a content type.
    pub(crate) fn has_explicit_content_type(&self) -> bool {
        self.extra
            .keys()
            .any(|k| k.eq_ignore_ascii_case("content-type"))
    }

    /// Expand the configuration into a `HeaderMap`. Invalid header names
    /// or values are `Runtime` faults.
    pub fn build(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if self.json {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if let Some(token) = &self.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| FetchError::runtime(format!("invalid bearer token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        if let Some(token) = &self.csrf_token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| FetchError::runtime(format!("invalid CSRF token: {e}")))?;
            headers.insert(HeaderName::from_static(CSRF_HEADER), value);
        }

        for (key, value) in &self.extra {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| FetchError::runtime(format!("invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FetchError::runtime(format!("invalid header value for '{key}': {e}")))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_announce_json() {
        let headers = HeaderConfig::new().build().unwrap();
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn json_off_omits_content_type() {
        let headers = HeaderConfig::new().with_json(false).build().unwrap();
        assert!(headers.get(CONTENT_TYPE).is_none());
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn bearer_and_csrf_are_set() {
        let headers = HeaderConfig::new()
            .with_bearer_token("t0k")
            .with_csrf_token("c5rf")
            .build()
            .unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer t0k");
        assert_eq!(headers.get(CSRF_HEADER).unwrap(), "c5rf");
    }

    #[test]
    fn extra_overrides_everything() {
        let headers = HeaderConfig::new()
            .with_bearer_token("t0k")
            .with_csrf_token("c5rf")
            .with_header("Authorization", "Basic abc")
            .with_header("X-CSRFToken", "override")
            .with_header("Content-Type", "text/plain")
            .build()
            .unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Basic abc");
        assert_eq!(headers.get(CSRF_HEADER).unwrap(), "override");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn invalid_header_name_is_a_runtime_fault() {
        let err = HeaderConfig::new()
            .with_header("bad name", "v")
            .build()
            .unwrap_err();
        assert!(matches!(err, FetchError::Runtime { .. }));
    }

    #[test]
    fn explicit_content_type_detection_is_case_insensitive() {
        let config = HeaderConfig::new().with_header("CONTENT-TYPE", "text/csv");
        assert!(config.has_explicit_content_type());
        assert!(!HeaderConfig::new().has_explicit_content_type());
    }
}
