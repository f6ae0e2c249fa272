//! Outbound catalog client.
//!
//! # Responsibilities
//! - Issue the two catalog calls (similar ids, product detail)
//! - Classify transport results into the shared failure taxonomy
//! - Nothing else: retries and admission control live a layer up
//!
//! # Classification
//! - 404 → NotFound
//! - 5xx, connect error, timeout → Transient
//! - decode failure or any other status → Internal

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::FetchError;
use crate::observability::metrics;
use crate::upstream::types::{ProductDetail, ProductId};

/// The two remote operations of the catalog service.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Ids considered similar to `id`. Fails with `NotFound` when the root
    /// id is unknown upstream.
    async fn similar_product_ids(&self, id: &ProductId) -> Result<Vec<ProductId>, FetchError>;

    /// Full detail record for one id.
    async fn product_detail(&self, id: &ProductId) -> Result<ProductDetail, FetchError>;
}

/// reqwest-backed production client.
pub struct HttpUpstreamClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpUpstreamClient {
    /// Build a client from config. The base URL gains a trailing slash when
    /// missing so relative joins keep the full path.
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            FetchError::Internal(format!(
                "invalid upstream base url '{}': {e}",
                config.base_url
            ))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.response_timeout_ms))
            .build()
            .map_err(|e| FetchError::Internal(format!("failed to build upstream client: {e}")))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::Internal(format!("invalid upstream path '{path}': {e}")))
    }

    async fn get_json<T>(&self, id: &ProductId, path: &str) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        // Everything that fails before a status line is a transport problem.
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transient { reason: e.to_string() })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| FetchError::Internal(format!("malformed upstream body: {e}")));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(id.clone()));
        }
        if status.is_server_error() {
            return Err(FetchError::Transient {
                reason: format!("upstream returned {status}"),
            });
        }
        Err(FetchError::Internal(format!(
            "unexpected upstream status {status}"
        )))
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn similar_product_ids(&self, id: &ProductId) -> Result<Vec<ProductId>, FetchError> {
        let result = self
            .get_json(id, &format!("product/{id}/similarids"))
            .await;
        metrics::record_upstream_call("similar_ids", result.is_ok());
        result
    }

    async fn product_detail(&self, id: &ProductId) -> Result<ProductDetail, FetchError> {
        let result = self.get_json(id, &format!("product/{id}")).await;
        metrics::record_upstream_call("product_detail", result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpUpstreamClient {
        HttpUpstreamClient::new(&UpstreamConfig {
            base_url: base.to_string(),
            response_timeout_ms: 1000,
        })
        .unwrap()
    }

    #[test]
    fn endpoint_keeps_the_base_path() {
        let client = client("http://catalog.internal:3001/api/v1");
        let url = client.endpoint("product/42/similarids").unwrap();
        assert_eq!(
            url.as_str(),
            "http://catalog.internal:3001/api/v1/product/42/similarids"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = HttpUpstreamClient::new(&UpstreamConfig {
            base_url: "not a url".to_string(),
            response_timeout_ms: 1000,
        });
        assert!(matches!(result, Err(FetchError::Internal(_))));
    }
}
