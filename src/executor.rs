//! Resilient request execution.
//!
//! [`Fetcher::execute`] is the orchestration point: encode the payload
//! once, build the header set once, then run a bounded attempt loop.
//! Each attempt gets a fresh timeout guard and re-sends the complete
//! request; a guard expired on one attempt cannot affect the next. Every
//! caught failure, whether a transport fault, a timeout, a non-ok status,
//! or a read fault, spends exactly one unit of the retry budget, and
//! exhaustion resolves through the outcome value instead of raising.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::body::read_body;
use crate::classify::classify;
use crate::error::{FetchError, FetchOutcome};
use crate::headers::HeaderConfig;
use crate::payload::{EncodedBody, FormPayload, RequestBody, encode_body};
use crate::retry::RetryPacing;
use crate::transport::{ReqwestTransport, Transport, TransportRequest};

/// Per-call execution knobs.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Serialize structured bodies as JSON and announce the content type.
    pub auto_json: bool,
    /// Extra attempts after the first; zero means exactly one attempt.
    pub retries: u32,
    /// Per-attempt guard; zero disables it and the attempt is bounded
    /// only by the underlying transport.
    pub timeout: Duration,
    /// Delay curve between attempts; immediate by default.
    pub pacing: RetryPacing,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            auto_json: true,
            retries: 0,
            timeout: Duration::ZERO,
            pacing: RetryPacing::immediate(),
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_auto_json(mut self, auto_json: bool) -> Self {
        self.auto_json = auto_json;
        self
    }

    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pacing(mut self, pacing: RetryPacing) -> Self {
        self.pacing = pacing;
        self
    }
}

/// What to send: verb, headers, payload. The verb is left to the caller;
/// entry points fill in their own default when it is unset.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: HeaderConfig,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_json(self, value: serde_json::Value) -> Self {
        self.with_body(RequestBody::Json(value))
    }

    pub fn with_form(self, payload: FormPayload) -> Self {
        self.with_body(RequestBody::Form(payload))
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.headers = self.headers.with_bearer_token(token);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers = self.headers.with_header(name, value);
        self
    }
}

/// Request executor bound to a transport. The composition root owns the
/// transport; tests substitute a double.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::new()),
        }
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Execute a request and resolve to an outcome. Total: every fault
    /// comes back through the `Err` side.
    pub async fn execute(
        &self,
        url: &str,
        options: RequestOptions,
        config: &FetchConfig,
    ) -> FetchOutcome {
        let RequestOptions {
            method,
            headers: header_config,
            body,
        } = options;
        let method = method.unwrap_or(Method::GET);

        let explicit_content_type = header_config.has_explicit_content_type();
        let (body, implied_content_type) = encode_body(body, config.auto_json)?;
        let mut headers = header_config.build()?;
        match &body {
            // The transport owns the boundary-bearing Content-Type.
            EncodedBody::Multipart(_) => {
                headers.remove(CONTENT_TYPE);
            }
            _ => {
                if !explicit_content_type
                    && let Some(content_type) = implied_content_type
                {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                }
            }
        }

        let mut attempt: u32 = 0;
        loop {
            tracing::debug!(%url, attempt, "dispatching request");
            match self
                .attempt(&method, url, &headers, &body, config.timeout)
                .await
            {
                Ok(parsed) => {
                    tracing::debug!(%url, attempt, "request resolved");
                    return Ok(parsed);
                }
                Err(error) if attempt < config.retries => {
                    tracing::warn!(%url, attempt, error = %error, "attempt failed, retrying");
                    let delay = config.pacing.delay_for(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(error) => {
                    tracing::warn!(%url, attempt, error = %error, "retry budget exhausted");
                    return Err(error);
                }
            }
        }
    }

    /// One attempt: fresh guard, full send, classify, read.
    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: &EncodedBody,
        timeout: Duration,
    ) -> FetchOutcome {
        let request = TransportRequest {
            method: method.clone(),
            url: url.to_string(),
            headers: headers.clone(),
            body: body.clone(),
        };

        let response = if timeout.is_zero() {
            self.transport.execute(request).await?
        } else {
            tokio::time::timeout(timeout, self.transport.execute(request)).await??
        };

        let kind = classify(response.content_type());
        if !response.ok() {
            return Err(FetchError::from_response(
                response.status,
                &response.status_text,
                &response.url,
                kind,
                &response.body,
            ));
        }
        read_body(kind, &response.body)
    }
}

/// Execute a request with the default reqwest transport. For repeated
/// calls, build one [`Fetcher`] and reuse it so the underlying client
/// pool is shared.
pub async fn safe_fetch(url: &str, options: RequestOptions, config: &FetchConfig) -> FetchOutcome {
    Fetcher::new().execute(url, options, config).await
}
