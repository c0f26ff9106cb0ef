//! API Handlers
//!
//! The single proxy handler and the state it shares across requests.

use std::sync::Arc;

use anyhow::{bail, Context};
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tracing::debug;

use crate::cache::DiskStore;
use crate::config::Config;
use crate::error::Result;
use crate::proxy::{FetchCache, UpstreamClient};

/// Application state shared across all handlers.
///
/// Built once at startup; nothing in it changes afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside fetcher
    pub cache: Arc<FetchCache>,
    /// Upstream base URL without a trailing slash
    upstream_base: Arc<str>,
    forward_query: bool,
}

impl AppState {
    /// Creates a new AppState around an existing fetcher.
    pub fn new(cache: FetchCache, upstream_base: &Url, forward_query: bool) -> Self {
        Self {
            cache: Arc::new(cache),
            upstream_base: upstream_base.as_str().trim_end_matches('/').into(),
            forward_query,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Validates the upstream URL, opens the cache directory and builds the
    /// upstream client.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let base = Url::parse(&config.upstream_url)
            .with_context(|| format!("invalid upstream URL '{}'", config.upstream_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            bail!("upstream URL must be http or https, got '{}'", base.scheme());
        }

        let store = DiskStore::new(&config.store_root)
            .await
            .context("failed to open cache directory")?;
        let upstream = UpstreamClient::new(config.upstream_timeout())
            .context("failed to build upstream client")?;

        let cache = FetchCache::new(store, upstream, config.ttl());
        Ok(Self::new(cache, &base, config.forward_query))
    }

    /// Resolves an inbound request URI onto the upstream base.
    pub fn target_url(&self, uri: &Uri) -> String {
        let mut target = format!("{}{}", self.upstream_base, uri.path());
        if self.forward_query {
            if let Some(query) = uri.query() {
                target.push('?');
                target.push_str(query);
            }
        }
        target
    }
}

/// Fallback handler for every path.
///
/// - `OPTIONS` answers the preflight with an empty 200
/// - `GET` goes through the cache
/// - anything else is rejected with 405 without touching the cache
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }
    if method != Method::GET {
        return Ok((StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response());
    }

    let target = state.target_url(&uri);
    let response = state.cache.fetch_with_cache(&target).await?;
    debug!(
        target = %target,
        status = response.status,
        cache = ?response.cache_status,
        "Proxied request"
    );
    Ok(response.into_response())
}
