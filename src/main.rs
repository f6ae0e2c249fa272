//! Service binary: CLI, configuration, wiring, serve.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use similar_products::config::{load_config, AppConfig};
use similar_products::lifecycle::{signals, Shutdown};
use similar_products::observability::metrics;
use similar_products::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryPolicy};
use similar_products::upstream::HttpUpstreamClient;
use similar_products::{HttpServer, SimilarProductService};

#[derive(Parser)]
#[command(name = "similar-products")]
#[command(about = "Similar-products aggregation service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("similar_products={}", config.observability.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        max_active_requests = config.aggregation.max_active_requests,
        retry_max_attempts = config.retries.max_attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Wire the aggregation core. The breaker is the process-wide instance
    // shared by every request.
    let upstream = Arc::new(HttpUpstreamClient::new(&config.upstream)?);
    let breaker = Arc::new(CircuitBreaker::new(
        "product-api",
        CircuitBreakerConfig {
            sliding_window_size: config.circuit_breaker.sliding_window_size,
            minimum_calls: config.circuit_breaker.minimum_calls,
            failure_rate_threshold: config.circuit_breaker.failure_rate_threshold,
            wait_duration_open: Duration::from_secs(config.circuit_breaker.wait_duration_open_secs),
            permitted_half_open_calls: config.circuit_breaker.permitted_half_open_calls,
        },
    ));
    let retry = RetryPolicy::new(
        config.retries.max_attempts,
        config.retries.base_delay_ms,
        config.retries.max_delay_ms,
    );
    let service = Arc::new(SimilarProductService::new(
        upstream,
        retry,
        breaker,
        config.aggregation.max_active_requests,
    ));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(&config, service);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
