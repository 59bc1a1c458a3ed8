//! Accounts proxy: forwards `/accounts` to Nibo with the private token and
//! caches the parameterless listing.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info, instrument, warn};

use super::error::ProxyError;
use super::types::{
    AccountsReply, QueryParams, ReplySource, UpstreamBody, UpstreamRequest, UpstreamResponse,
};
use crate::cache::{CachedPayload, ResponseCache};
use crate::config::NiboConfig;

/// Resource path appended to the configured base URL.
pub const ACCOUNTS_PATH: &str = "empresas/v1/accounts";

/// Nibo reads the token from this header, not from `Authorization`.
pub const API_TOKEN_HEADER: HeaderName = HeaderName::from_static("apitoken");

pub struct AccountsProxy {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    timeout: Duration,
    cache_ttl: Duration,
    cache: Arc<dyn ResponseCache>,
}

impl AccountsProxy {
    pub fn new(config: &NiboConfig, cache: Arc<dyn ResponseCache>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nibo-bff/", env!("CARGO_PKG_VERSION")))
            // Redirects are returned to the caller like any other status < 400.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build HTTP client")?;
        Self::with_client(client, config, cache)
    }

    pub fn with_client(
        client: reqwest::Client,
        config: &NiboConfig,
        cache: Arc<dyn ResponseCache>,
    ) -> anyhow::Result<Self> {
        let mut token = HeaderValue::from_str(&config.api_token)
            .context("nibo.api_token is not a valid header value")?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_TOKEN_HEADER, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            timeout: config.request_timeout(),
            cache_ttl: config.cache_ttl(),
            cache,
        })
    }

    /// Serves one `/accounts` request.
    ///
    /// Only requests without query parameters read or write the cache.
    #[instrument(skip(self, query), fields(params = query.len()))]
    pub async fn handle(&self, query: QueryParams) -> Result<AccountsReply, ProxyError> {
        let use_cache = query.is_empty();

        if use_cache {
            if let Some(entry) = self.cache.get().filter(|e| e.is_fresh()) {
                debug!("accounts cache hit");
                return Ok(AccountsReply {
                    source: ReplySource::Cache,
                    payload: entry.payload.clone(),
                });
            }
            debug!("accounts cache miss");
        }

        let request = UpstreamRequest {
            path: ACCOUNTS_PATH.to_string(),
            query,
        };
        let response = self.fetch(&request).await?;

        if response.is_error() {
            warn!(status = response.status, "Nibo accounts request failed");
            return Err(ProxyError::Upstream {
                status: response.status,
                body: response.body.into_value(),
            });
        }

        let payload = CachedPayload {
            status: response.status,
            data: response.body.into_value(),
        };
        if use_cache {
            self.cache.set(payload.clone(), self.cache_ttl);
        }

        Ok(AccountsReply {
            source: ReplySource::Nibo,
            payload,
        })
    }

    /// Issues exactly one GET; transport errors become `Timeout` or `Gateway`.
    async fn fetch(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        let url = request.url(&self.base_url);
        let params: Vec<(&str, &str)> = request.query.iter().collect();

        info!(
            target_url = %url,
            timeout_ms = self.timeout.as_millis() as u64,
            "Forwarding accounts request to Nibo"
        );

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "Nibo request failed"))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to read Nibo response body"))?;

        info!(status, bytes = bytes.len(), "Nibo request completed");

        Ok(UpstreamResponse {
            status,
            body: UpstreamBody::try_parse(&bytes),
        })
    }
}
