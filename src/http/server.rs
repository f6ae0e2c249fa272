//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum Router with the aggregation route
//! - Wire up middleware (timeout, request ID, tracing)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::aggregator::SimilarProductService;
use crate::config::AppConfig;
use crate::http::handlers;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SimilarProductService>,
}

/// HTTP server for the aggregation service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Wire the router and middleware from config and the aggregation core.
    pub fn new(config: &AppConfig, service: Arc<SimilarProductService>) -> Self {
        let state = AppState { service };
        let router = Router::new()
            .route(
                "/product/{productid}/similar",
                get(handlers::similar_products),
            )
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
