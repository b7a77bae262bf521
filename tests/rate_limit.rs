//! Per-client rate limiting through the full server.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{MockReply, start_mock_upstream, start_proxy, test_config};

fn quick_reply() -> MockReply {
    MockReply::Stream {
        chunks: vec!["ok"],
        delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn sixth_request_in_window_is_rejected() {
    let upstream = start_mock_upstream(quick_reply()).await;
    let mut config = test_config(&upstream.url());
    config.rate_limit.requests_per_minute = 5;
    let (proxy, shutdown) = start_proxy(config).await;
    let client = common::client();

    for i in 0..5 {
        let res = common::post_json(&client, proxy, r#"{"prompt":"Hello."}"#).await;
        assert_eq!(res.status(), StatusCode::OK, "request {i} should be admitted");
        assert_eq!(res.text().await.unwrap(), "ok");
    }

    let res = common::post_json(&client, proxy, r#"{"prompt":"Hello."}"#).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "error": "Rate limit exceeded" })
    );
    assert_eq!(upstream.hits(), 5);

    shutdown.trigger();
}

#[tokio::test]
async fn admits_again_after_window_resets() {
    let upstream = start_mock_upstream(quick_reply()).await;
    let mut config = test_config(&upstream.url());
    config.rate_limit.requests_per_minute = 2;
    config.rate_limit.window_secs = 2;
    let (proxy, shutdown) = start_proxy(config).await;
    let client = common::client();

    for _ in 0..2 {
        let res = common::post_json(&client, proxy, r#"{"prompt":"Hello."}"#).await;
        assert_eq!(res.status(), StatusCode::OK);
        res.bytes().await.unwrap();
    }
    let res = common::post_json(&client, proxy, r#"{"prompt":"Hello."}"#).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(2200)).await;

    let res = common::post_json(&client, proxy, r#"{"prompt":"Hello."}"#).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(upstream.hits(), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn rejected_requests_count_against_the_window() {
    let upstream = start_mock_upstream(quick_reply()).await;
    let mut config = test_config(&upstream.url());
    config.rate_limit.requests_per_minute = 3;
    let (proxy, shutdown) = start_proxy(config).await;
    let client = common::client();

    for _ in 0..3 {
        let res = common::post_json(&client, proxy, "not json").await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
    let res = common::post_json(&client, proxy, r#"{"prompt":"Hello."}"#).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(upstream.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn concurrent_burst_admits_exactly_the_limit() {
    let upstream = start_mock_upstream(quick_reply()).await;
    let mut config = test_config(&upstream.url());
    config.rate_limit.requests_per_minute = 5;
    let (proxy, shutdown) = start_proxy(config).await;
    let client = common::client();

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                common::post_json(&client, proxy, r#"{"prompt":"Hello."}"#)
                    .await
                    .status()
            })
        })
        .collect();

    let mut admitted = 0;
    let mut limited = 0;
    for task in tasks {
        match task.await.unwrap() {
            StatusCode::OK => admitted += 1,
            StatusCode::TOO_MANY_REQUESTS => limited += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(admitted, 5);
    assert_eq!(limited, 15);

    shutdown.trigger();
}
