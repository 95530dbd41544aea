//! CSRF-aware requests.
//!
//! Token discovery walks the page collaborators in a fixed order
//! (hidden form field, then meta tag, then the `csrftoken` cookie) and
//! caches the first hit for the cache's lifetime. A failed discovery is never
//! cached; the next call retries the lookup. The wrapper injects the
//! token as a header and otherwise behaves exactly like the executor:
//! an unresolved token still produces a normal outcome, the server gets
//! to reject it.

use std::sync::{Arc, RwLock};

use reqwest::Method;

use crate::error::FetchOutcome;
use crate::executor::{FetchConfig, Fetcher, RequestOptions};

/// Cookie the resolver falls back to.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Page-side lookups the resolver consumes as black boxes. Each returns
/// the raw value or `None` when the source is absent.
pub trait PageTokenSource: Send + Sync {
    /// First hidden form field carrying the token.
    fn hidden_field(&self) -> Option<String>;
    /// Token meta tag.
    fn meta_tag(&self) -> Option<String>;
    /// Cookie by name.
    fn cookie(&self, name: &str) -> Option<String>;
}

/// Explicit token cache, owned by the composition root. Cloning shares
/// the slot. Written at most once per successful discovery; concurrent
/// pre-success discoveries are idempotent and the last writer wins.
#[derive(Debug, Clone, Default)]
pub struct CsrfCache {
    slot: Arc<RwLock<Option<String>>>,
}

impl CsrfCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.slot.read().ok().and_then(|guard| guard.clone())
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = Some(token.into());
        }
    }

    /// Drop the cached token, e.g. after the page rotates its source.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = None;
        }
    }
}

/// Cached token discovery over a [`PageTokenSource`].
#[derive(Clone)]
pub struct CsrfResolver {
    source: Arc<dyn PageTokenSource>,
    cache: CsrfCache,
}

impl CsrfResolver {
    pub fn new(source: Arc<dyn PageTokenSource>) -> Self {
        Self {
            source,
            cache: CsrfCache::new(),
        }
    }

    /// Share an externally owned cache, e.g. one cache across several
    /// resolvers or a fresh one per test.
    pub fn with_cache(source: Arc<dyn PageTokenSource>, cache: CsrfCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &CsrfCache {
        &self.cache
    }

    /// Cached token, or run discovery: hidden field, then meta tag, then
    /// the `csrftoken` cookie. Empty values count as absent. The first
    /// hit is cached; a miss is not.
    pub fn resolve(&self) -> Option<String> {
        if let Some(token) = self.cache.get() {
            return Some(token);
        }

        let found = self
            .source
            .hidden_field()
            .filter(|t| !t.is_empty())
            .or_else(|| self.source.meta_tag().filter(|t| !t.is_empty()))
            .or_else(|| self.source.cookie(CSRF_COOKIE).filter(|t| !t.is_empty()));

        if let Some(token) = &found {
            self.cache.set(token.clone());
        } else {
            tracing::debug!("no CSRF token discoverable; proceeding without one");
        }
        found
    }
}

impl Fetcher {
    /// Execute with a resolved CSRF token injected as a header. The verb
    /// defaults to POST when the caller left it unset.
    pub async fn execute_with_csrf(
        &self,
        url: &str,
        mut options: RequestOptions,
        config: &FetchConfig,
        resolver: &CsrfResolver,
    ) -> FetchOutcome {
        if options.method.is_none() {
            options.method = Some(Method::POST);
        }
        if let Some(token) = resolver.resolve() {
            options.headers = options.headers.with_csrf_token(token);
        }
        self.execute(url, options, config).await
    }
}

/// CSRF-aware request with the default transport and configuration.
pub async fn fetch_with_csrf(
    url: &str,
    options: RequestOptions,
    resolver: &CsrfResolver,
) -> FetchOutcome {
    Fetcher::new()
        .execute_with_csrf(url, options, &FetchConfig::default(), resolver)
        .await
}
