//! End-to-end checks that the proxy forwards requests and relays responses unchanged.

use axum::http::StatusCode;

mod common;

async fn single_backend_proxy() -> (common::MockBackend, common::RunningProxy) {
    let backend = common::start_backend("b1").await;
    let mut config = common::proxy_config(&[backend.url()]);
    config.health_check.enabled = false;
    let proxy = common::start_proxy(config).await;
    (backend, proxy)
}

#[tokio::test]
async fn test_forwards_method_path_query_headers_and_body() {
    let (backend, proxy) = single_backend_proxy().await;
    let client = common::client();

    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let res = client
        .post(proxy.url("/api/upload?x=1&y=two"))
        .header("x-custom", "custom-value")
        .header("content-type", "application/octet-stream")
        .header("authorization", "Bearer token")
        .body(payload.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers().clone();
    assert_eq!(headers["x-seen-method"], "POST");
    assert_eq!(headers["x-seen-uri"], "/api/upload?x=1&y=two");
    assert_eq!(headers["x-seen-x-custom"], "custom-value");
    assert_eq!(headers["x-seen-content-type"], "application/octet-stream");
    assert_eq!(headers["x-seen-authorization"], "Bearer token");
    assert_eq!(
        headers["x-seen-host"].to_str().unwrap(),
        backend.addr.to_string(),
        "Host must name the backend, not the proxy"
    );

    let body = res.bytes().await.unwrap();
    assert_eq!(body.as_ref(), payload.as_slice());
    assert_eq!(backend.hits(), 1);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_other_methods_are_forwarded() {
    let (_backend, proxy) = single_backend_proxy().await;
    let client = common::client();

    for method in [
        reqwest::Method::PUT,
        reqwest::Method::DELETE,
        reqwest::Method::PATCH,
    ] {
        let res = client
            .request(method.clone(), proxy.url("/items/7"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-seen-method"], method.as_str());
        assert_eq!(res.headers()["x-seen-uri"], "/items/7");
    }

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_root_path_is_proxied() {
    let (_backend, proxy) = single_backend_proxy().await;
    let client = common::client();

    let res = client.get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-seen-uri"], "/");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_status_and_headers_are_relayed() {
    let (_backend, proxy) = single_backend_proxy().await;
    let client = common::client();

    for code in [201u16, 404, 500, 503] {
        let res = client
            .get(proxy.url(&format!("/status/{}", code)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), code);
        assert_eq!(res.headers()["x-upstream"], "yes");
        assert_eq!(res.text().await.unwrap(), format!("status {}", code));
    }

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_is_generated_and_propagated() {
    let (_backend, proxy) = single_backend_proxy().await;
    let client = common::client();

    // Client-supplied id reaches the backend and comes back
    let res = client
        .get(proxy.url("/"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-seen-x-request-id"], "req-42");
    assert_eq!(res.headers()["x-request-id"], "req-42");

    // Otherwise one is generated
    let res = client.get(proxy.url("/")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(!generated.is_empty());
    assert_eq!(res.headers()["x-seen-x-request-id"], generated.as_str());

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_connection_listed_headers_are_not_forwarded() {
    let (_backend, proxy) = single_backend_proxy().await;
    let client = common::client();

    let res = client
        .get(proxy.url("/"))
        .header("connection", "x-hop")
        .header("x-hop", "secret")
        .header("x-custom", "kept")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-seen-x-hop").is_none());
    assert_eq!(res.headers()["x-seen-x-custom"], "kept");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let backend = common::start_backend("b1").await;
    let mut config = common::proxy_config(&[backend.url()]);
    config.health_check.enabled = false;
    config.proxy.max_body_bytes = 1024;
    let proxy = common::start_proxy(config).await;

    let client = common::client();
    let res = client
        .post(proxy.url("/upload"))
        .body(vec![0u8; 4096])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(backend.hits(), 0);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_upstream_response_returns_502() {
    let backend = common::start_backend("b1").await;
    let mut config = common::proxy_config(&[backend.url()]);
    config.health_check.enabled = false;
    config.proxy.max_response_bytes = 1024;
    let proxy = common::start_proxy(config).await;

    let client = common::client();

    // The mock echoes the request body, so the reply is 4096 bytes
    let res = client
        .post(proxy.url("/echo"))
        .body(vec![7u8; 4096])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(backend.hits(), 1);

    // Replies under the cap still pass through
    let res = client
        .post(proxy.url("/echo"))
        .body(vec![7u8; 512])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().len(), 512);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_requests_are_spread_evenly() {
    // 1. Four backends, prober off so every backend stays eligible
    let backends = common::start_backends(4).await;
    let urls: Vec<String> = backends.iter().map(|b| b.url()).collect();
    let mut config = common::proxy_config(&urls);
    config.health_check.enabled = false;
    let proxy = common::start_proxy(config).await;

    // 2. Run Load
    let concurrency: usize = 20;
    let requests_per_task: usize = 20;
    let client = common::client();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = proxy.url("/load");
        tasks.push(tokio::spawn(async move {
            let mut ok = 0usize;
            for _ in 0..requests_per_task {
                if let Ok(res) = client.get(&url).send().await {
                    if res.status().is_success() {
                        ok += 1;
                    }
                }
            }
            ok
        }));
    }

    let mut succeeded = 0;
    for task in tasks {
        succeeded += task.await.unwrap();
    }

    // 3. Every request served, one rotation step each
    let total = concurrency * requests_per_task;
    assert_eq!(succeeded, total);
    for backend in &backends {
        assert_eq!(backend.hits(), total / backends.len(), "backend {}", backend.name);
    }

    proxy.shutdown.trigger();
}
