//! fetchguard
//!
//! A resilient request layer over an injectable HTTP transport. The two
//! entry points, [`safe_fetch`] and [`fetch_with_csrf`], never panic and
//! never propagate a raw transport fault: every call resolves to a
//! [`FetchOutcome`] carrying either the classified response body or one
//! normalized [`FetchError`].
//!
//! The pipeline: encode the payload (JSON, urlencoded, or multipart),
//! build the header set, then run a bounded attempt loop where each
//! attempt gets its own timeout guard and re-sends the full request.
//! Responses are classified by declared content type and decoded to a
//! tagged [`ParsedBody`].
//!
//! ```rust,no_run
//! use fetchguard::{safe_fetch, FetchConfig, RequestOptions};
//!
//! # async fn example() {
//! let config = FetchConfig::new()
//!     .with_retries(2)
//!     .with_timeout(std::time::Duration::from_secs(5));
//! match safe_fetch("https://example.com/api/items", RequestOptions::new(), &config).await {
//!     Ok(body) => println!("got {body:?}"),
//!     Err(err) => eprintln!("request failed: {err}"),
//! }
//! # }
//! ```
#![deny(unsafe_code)]

pub mod body;
pub mod classify;
pub mod csrf;
pub mod error;
pub mod executor;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod transport;

pub use body::{ParsedBody, read_body};
pub use classify::{BodyKind, classify};
pub use csrf::{CsrfCache, CsrfResolver, PageTokenSource, fetch_with_csrf};
pub use error::{FetchError, FetchOutcome};
pub use executor::{FetchConfig, Fetcher, RequestOptions, safe_fetch};
pub use headers::HeaderConfig;
pub use payload::{
    EncodedBody, FilePart, FormPayload, FormValue, PartValue, RequestBody, contains_binary,
    encode_body,
};
pub use retry::RetryPacing;
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
