//! Fan-out orchestration for one aggregation request.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::FetchError;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::retries::RetryPolicy;
use crate::upstream::client::UpstreamClient;
use crate::upstream::types::{ProductDetail, ProductId};

/// Aggregates the detail records of products similar to a root product.
///
/// One instance serves every inbound request; the breaker handle it holds is
/// the process-wide one, so concurrent requests share admission state.
pub struct SimilarProductService {
    upstream: Arc<dyn UpstreamClient>,
    retry: Arc<RetryPolicy>,
    breaker: Arc<CircuitBreaker>,
    max_active_requests: usize,
}

impl SimilarProductService {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        retry: RetryPolicy,
        breaker: Arc<CircuitBreaker>,
        max_active_requests: usize,
    ) -> Self {
        Self {
            upstream,
            retry: Arc::new(retry),
            breaker,
            max_active_requests: max_active_requests.max(1),
        }
    }

    /// Resolve the similar ids for `root` and fetch their detail records.
    ///
    /// Fails only when resolution itself fails. Unreachable similar products
    /// are logged and dropped; the result is the reachable subset, in
    /// completion order. Dropping the returned future aborts every
    /// outstanding fetch.
    pub async fn get_similar_products(
        &self,
        root: &ProductId,
    ) -> Result<Vec<ProductDetail>, FetchError> {
        let ids = self.upstream.similar_product_ids(root).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let permits = Arc::new(Semaphore::new(self.max_active_requests));
        let mut fetches: JoinSet<Result<ProductDetail, (ProductId, FetchError)>> = JoinSet::new();
        for id in ids {
            let permits = Arc::clone(&permits);
            let upstream = Arc::clone(&self.upstream);
            let retry = Arc::clone(&self.retry);
            let breaker = Arc::clone(&self.breaker);
            fetches.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| (id.clone(), FetchError::Internal("fetch semaphore closed".into())))?;
                let result = retry
                    .run(|| breaker.call(|| upstream.product_detail(&id)))
                    .await;
                result.map_err(|err| (id, err))
            });
        }

        let mut details = Vec::with_capacity(fetches.len());
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok(Ok(detail)) => details.push(detail),
                Ok(Err((id, err))) => {
                    tracing::warn!(
                        root_id = %root,
                        product_id = %id,
                        error = %err,
                        "Dropping similar product after fetch failure"
                    );
                    metrics::record_dropped_product();
                }
                Err(join_err) => {
                    tracing::error!(root_id = %root, error = %join_err, "Detail fetch task aborted");
                }
            }
        }
        Ok(details)
    }
}
