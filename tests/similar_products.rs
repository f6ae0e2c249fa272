//! End-to-end tests: the real HTTP server against a mock upstream catalog.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use similar_products::config::AppConfig;
use similar_products::lifecycle::Shutdown;
use similar_products::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryPolicy};
use similar_products::upstream::{HttpUpstreamClient, ProductDetail};
use similar_products::{HttpServer, SimilarProductService};

mod common;

const SHIRT: &str = r#"{"id":"1","name":"Shirt","price":9.99,"availability":true}"#;
const DRESS: &str = r#"{"id":"2","name":"Dress","price":19.99,"availability":true}"#;
const BLAZER: &str = r#"{"id":"3","name":"Blazer","price":29.99,"availability":false}"#;

/// Wire a service against the given upstream and serve it on an ephemeral
/// port. Retries are tightened so failure tests finish quickly.
async fn start_service(upstream_addr: SocketAddr) -> (SocketAddr, Shutdown) {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = format!("http://{}", upstream_addr);
    config.upstream.response_timeout_ms = 2000;
    config.retries.max_attempts = 3;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 20;

    let upstream = Arc::new(HttpUpstreamClient::new(&config.upstream).unwrap());
    let breaker = Arc::new(CircuitBreaker::new(
        "product-api",
        CircuitBreakerConfig::default(),
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

    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, service);
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn similar_products_success() {
    let upstream = common::start_mock_catalog(|path: String| async move {
        match path.as_str() {
            "/product/1/similarids" => (200, r#"["2","3"]"#.to_string()),
            "/product/2" => (200, DRESS.to_string()),
            "/product/3" => (200, BLAZER.to_string()),
            _ => (404, String::new()),
        }
    })
    .await;

    let (addr, shutdown) = start_service(upstream).await;
    let client = http_client();

    let res = client
        .get(format!("http://{}/product/1/similar", addr))
        .send()
        .await
        .expect("service unreachable");

    assert_eq!(res.status(), 200);
    let mut products: Vec<ProductDetail> = res.json().await.unwrap();
    products.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id.as_str(), "2");
    assert_eq!(products[0].price, Some(19.99));
    assert_eq!(products[1].id.as_str(), "3");
    assert_eq!(products[1].availability, Some(false));

    shutdown.trigger();
}

#[tokio::test]
async fn unknown_root_is_a_404() {
    let upstream = common::start_mock_catalog(|_path: String| async move {
        (404, String::new())
    })
    .await;

    let (addr, shutdown) = start_service(upstream).await;
    let client = http_client();

    let res = client
        .get(format!("http://{}/product/999/similar", addr))
        .send()
        .await
        .expect("service unreachable");

    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn resolution_server_error_is_a_500() {
    let upstream = common::start_mock_catalog(|_path: String| async move {
        (500, String::new())
    })
    .await;

    let (addr, shutdown) = start_service(upstream).await;
    let client = http_client();

    let res = client
        .get(format!("http://{}/product/1/similar", addr))
        .send()
        .await
        .expect("service unreachable");

    assert_eq!(res.status(), 500);

    shutdown.trigger();
}

#[tokio::test]
async fn partial_failure_returns_the_reachable_subset() {
    let upstream = common::start_mock_catalog(|path: String| async move {
        match path.as_str() {
            "/product/5/similarids" => (200, r#"["1","6"]"#.to_string()),
            "/product/1" => (200, SHIRT.to_string()),
            "/product/6" => (500, String::new()),
            _ => (404, String::new()),
        }
    })
    .await;

    let (addr, shutdown) = start_service(upstream).await;
    let client = http_client();

    let res = client
        .get(format!("http://{}/product/5/similar", addr))
        .send()
        .await
        .expect("service unreachable");

    assert_eq!(res.status(), 200);
    let products: Vec<ProductDetail> = res.json().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id.as_str(), "1");
    assert_eq!(products[0].name, "Shirt");

    shutdown.trigger();
}

#[tokio::test]
async fn empty_similar_ids_yield_an_empty_array() {
    let upstream = common::start_mock_catalog(|path: String| async move {
        match path.as_str() {
            "/product/9/similarids" => (200, "[]".to_string()),
            _ => (404, String::new()),
        }
    })
    .await;

    let (addr, shutdown) = start_service(upstream).await;
    let client = http_client();

    let res = client
        .get(format!("http://{}/product/9/similar", addr))
        .send()
        .await
        .expect("service unreachable");

    assert_eq!(res.status(), 200);
    let products: Vec<ProductDetail> = res.json().await.unwrap();
    assert!(products.is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn transient_detail_failure_is_retried_then_served() {
    let detail_calls = Arc::new(AtomicU32::new(0));
    let calls = detail_calls.clone();
    let upstream = common::start_mock_catalog(move |path: String| {
        let calls = calls.clone();
        async move {
            match path.as_str() {
                "/product/1/similarids" => (200, r#"["2"]"#.to_string()),
                "/product/2" => {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        (503, String::new())
                    } else {
                        (200, DRESS.to_string())
                    }
                }
                _ => (404, String::new()),
            }
        }
    })
    .await;

    let (addr, shutdown) = start_service(upstream).await;
    let client = http_client();

    let res = client
        .get(format!("http://{}/product/1/similar", addr))
        .send()
        .await
        .expect("service unreachable");

    assert_eq!(res.status(), 200);
    let products: Vec<ProductDetail> = res.json().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id.as_str(), "2");
    assert_eq!(
        detail_calls.load(Ordering::SeqCst),
        2,
        "one failed attempt plus one successful retry"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let upstream = common::start_mock_catalog(|path: String| async move {
        match path.as_str() {
            "/product/1/similarids" => (200, "[]".to_string()),
            _ => (404, String::new()),
        }
    })
    .await;

    let (addr, shutdown) = start_service(upstream).await;
    let client = http_client();

    let res = client
        .get(format!("http://{}/product/1/similar", addr))
        .send()
        .await
        .expect("service unreachable");
    assert!(res.headers().contains_key("x-request-id"));

    let res = client
        .get(format!("http://{}/product/1/similar", addr))
        .header("x-request-id", "test-correlation-id")
        .send()
        .await
        .expect("service unreachable");
    assert_eq!(
        res.headers().get("x-request-id").unwrap(),
        "test-correlation-id"
    );

    shutdown.trigger();
}
