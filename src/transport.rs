//! HTTP transport abstraction.
//!
//! The executor talks to an injectable [`Transport`] that exchanges
//! plain request/response data. This keeps the retry and classification
//! logic deterministic under test (a double can fail, stall, or return a
//! synthetic response) and lets embedders substitute their own I/O. The
//! production implementation wraps a shared `reqwest::Client`.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::multipart::{Form, Part};

use crate::error::FetchError;
use crate::payload::{EncodedBody, PartValue};

/// Transport-level request data.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: EncodedBody,
}

/// Transport-level response data. The body is captured whole so that
/// classification and reading work on duplicates of one buffer.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    /// Final URL after any redirects.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    /// Success range: 2xx and 3xx.
    pub fn ok(&self) -> bool {
        (200..400).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Pluggable request execution.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, FetchError>;
}

/// Production transport over `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, FetchError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        builder = match request.body {
            EncodedBody::Empty => builder,
            EncodedBody::Text(text) => builder.body(text),
            // The form is rebuilt from plain data on every send; reqwest
            // sets the boundary-bearing Content-Type itself.
            EncodedBody::Multipart(parts) => builder.multipart(build_form(&parts)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text,
            url,
            headers,
            body,
        })
    }
}

fn build_form(parts: &[(String, PartValue)]) -> Result<Form, FetchError> {
    let mut form = Form::new();
    for (name, value) in parts {
        form = match value {
            PartValue::Text(text) => form.text(name.clone(), text.clone()),
            PartValue::File(file) => {
                let part = Part::bytes(file.data.to_vec())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.mime_type())?;
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_covers_success_and_redirect_ranges() {
        let mut response = TransportResponse {
            status: 200,
            status_text: "OK".into(),
            url: "/".into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        assert!(response.ok());
        response.status = 304;
        assert!(response.ok());
        response.status = 404;
        assert!(!response.ok());
        response.status = 500;
        assert!(!response.ok());
        response.status = 199;
        assert!(!response.ok());
    }

    #[test]
    fn content_type_reads_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/html".parse().unwrap());
        let response = TransportResponse {
            status: 200,
            status_text: "OK".into(),
            url: "/".into(),
            headers,
            body: Bytes::new(),
        };
        assert_eq!(response.content_type(), Some("text/html"));
    }

    #[test]
    fn form_builds_from_flattened_parts() {
        use crate::payload::FilePart;
        let parts = vec![
            ("title".to_string(), PartValue::Text("x".into())),
            (
                "img".to_string(),
                PartValue::File(FilePart::new("a.png", Bytes::from_static(b"png"))),
            ),
        ];
        assert!(build_form(&parts).is_ok());
    }
}
