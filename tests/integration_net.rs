// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the retrying request client using wiremock.
//!
//! Covers:
//! - Retry on non-200 until the budget is spent
//! - Timeout escalation across attempts
//! - Delay between retries
//! - Malformed JSON (not retried)
//! - Streaming mode (single attempt)
//! - Admission limiting

use ci_watch::error::{NetworkError, ProtocolError, WatchError};
use ci_watch::net::{
    AdmissionLimiter, RequestAttempt, RequestConfig, RetryCause, RetryClient, RetryObserver,
};
use futures_util::StreamExt;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records every retry notification.
#[derive(Default)]
struct Recorder {
    retries: Mutex<Vec<(u32, Duration, String)>>,
}

impl Recorder {
    fn retries(&self) -> Vec<(u32, Duration, String)> {
        self.retries.lock().unwrap().clone()
    }
}

impl RetryObserver for Recorder {
    fn on_retry(&self, _url: &str, attempt: &RequestAttempt, cause: &RetryCause) {
        self.retries
            .lock()
            .unwrap()
            .push((attempt.number(), attempt.timeout(), cause.to_string()));
    }
}

fn client() -> (RetryClient, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let client = RetryClient::new("ci-watch-tests").with_observer(recorder.clone());
    (client, recorder)
}

fn config(server: &MockServer, route: &str, retries: u32) -> RequestConfig {
    RequestConfig::builder()
        .url(format!("{}{route}", server.uri()))
        .timeout(Duration::from_secs(5))
        .retries(retries)
        .build()
}

async fn flaky_server(failures: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(failures)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
        .mount(&server)
        .await;
    server
}

// =============================================================================
// retry budget
// =============================================================================

#[tokio::test]
async fn test_fail_twice_then_ok_within_budget() {
    let server = flaky_server(2).await;
    let (client, recorder) = client();

    let response = client.request(&config(&server, "/flaky", 3)).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), "finally");
    let retries = recorder.retries();
    assert_eq!(retries.len(), 2);
    assert_eq!(retries[0].0, 1);
    assert_eq!(retries[1].0, 2);
    assert_eq!(retries[0].2, "status 500");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fail_twice_exhausts_budget_of_one() {
    let server = flaky_server(2).await;
    let (client, recorder) = client();

    let err = client.request(&config(&server, "/flaky", 1)).await.unwrap_err();

    match err.as_network() {
        Some(NetworkError::BadStatus { status, url }) => {
            assert_eq!(*status, 500);
            assert!(url.ends_with("/flaky"));
        }
        other => panic!("expected BadStatus, got {other:?}"),
    }
    assert_eq!(recorder.retries().len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_zero_budget_makes_one_attempt() {
    let server = flaky_server(1).await;
    let (client, recorder) = client();

    let err = client.request(&config(&server, "/flaky", 0)).await.unwrap_err();

    assert_eq!(err.as_network().and_then(NetworkError::status), Some(500));
    assert!(recorder.retries().is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_200_success_codes_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/created"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    let (client, recorder) = client();

    let err = client.request(&config(&server, "/created", 2)).await.unwrap_err();

    assert_eq!(err.as_network().and_then(NetworkError::status), Some(201));
    assert_eq!(recorder.retries().len(), 2);
}

// =============================================================================
// timeouts and delay
// =============================================================================

#[tokio::test]
async fn test_timeout_doubles_per_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow")
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&server)
        .await;
    let (client, recorder) = client();

    let request = RequestConfig::builder()
        .url(format!("{}/slow", server.uri()))
        .timeout(Duration::from_millis(100))
        .retries(3)
        .build();
    let response = client.request(&request).await.unwrap();

    // 100 ms and 200 ms attempts time out, the 400 ms one gets through
    assert_eq!(response.body(), "slow");
    let timeouts: Vec<_> = recorder.retries().iter().map(|r| r.1).collect();
    assert_eq!(
        timeouts,
        [Duration::from_millis(200), Duration::from_millis(400)]
    );
}

#[tokio::test]
async fn test_transport_timeout_surfaces_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stuck"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let (client, _) = client();

    let request = RequestConfig::builder()
        .url(format!("{}/stuck", server.uri()))
        .timeout(Duration::from_millis(50))
        .retries(1)
        .build();
    let err = client.request(&request).await.unwrap_err();

    let network = err.as_network().expect("network error");
    assert!(matches!(network, NetworkError::Transport { .. }));
    assert!(network.is_timeout());
}

#[tokio::test]
async fn test_delay_between_retries() {
    let server = flaky_server(2).await;
    let (client, _) = client();

    let request = RequestConfig::builder()
        .url(format!("{}/flaky", server.uri()))
        .retries(2)
        .delay(Duration::from_millis(100))
        .build();
    let started = Instant::now();
    client.request(&request).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(200));
}

// =============================================================================
// json
// =============================================================================

#[derive(Debug, Deserialize)]
struct Greeting {
    hello: String,
}

#[tokio::test]
async fn test_request_json_sends_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .and(header("Accept", "application/json"))
        .and(header("User-Agent", "ci-watch-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"hello":"world"}"#))
        .expect(1)
        .mount(&server)
        .await;
    let (client, _) = client();

    let request = config(&server, "/json", 0).header("Accept", "application/json");
    let greeting: Greeting = client.request_json(&request).await.unwrap();
    assert_eq!(greeting.hello, "world");
}

#[tokio::test]
async fn test_malformed_json_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;
    let (client, recorder) = client();

    let err = client
        .request_json::<Greeting>(&config(&server, "/json", 3))
        .await
        .unwrap_err();

    match err {
        WatchError::Protocol(e) => assert!(matches!(*e, ProtocolError::MalformedBody { .. })),
        other => panic!("expected protocol error, got {other:?}"),
    }
    assert!(recorder.retries().is_empty());
}

// =============================================================================
// streaming
// =============================================================================

#[tokio::test]
async fn test_stream_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live"))
        .respond_with(ResponseTemplate::new(200).set_body_string("line 1\nline 2\n"))
        .mount(&server)
        .await;
    let (client, _) = client();

    let response = client.stream(&config(&server, "/live", 3)).await.unwrap();
    assert_eq!(response.status(), 200);

    let mut body = Vec::new();
    let mut chunks = Box::pin(response.into_stream());
    while let Some(chunk) = chunks.next().await {
        body.extend(chunk.unwrap());
    }
    assert_eq!(String::from_utf8(body).unwrap(), "line 1\nline 2\n");
}

#[tokio::test]
async fn test_stream_does_not_retry() {
    let server = flaky_server(1).await;
    let (client, recorder) = client();

    let err = client.stream(&config(&server, "/flaky", 3)).await.unwrap_err();

    assert_eq!(err.as_network().and_then(NetworkError::status), Some(500));
    assert!(recorder.retries().is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stream_header_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stuck"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let (client, _) = client();

    let request = RequestConfig::builder()
        .url(format!("{}/stuck", server.uri()))
        .timeout(Duration::from_millis(50))
        .build();
    let err = client.stream(&request).await.unwrap_err();

    match err.as_network() {
        Some(NetworkError::TimedOut { after_ms, .. }) => assert_eq!(*after_ms, 50),
        other => panic!("expected TimedOut, got {other:?}"),
    }
}

// =============================================================================
// admission limiting
// =============================================================================

#[tokio::test]
async fn test_limiter_serializes_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;
    let (client, _) = client();
    let client = client.with_limiter(AdmissionLimiter::new(1));
    let request = config(&server, "/slow", 0);

    let started = Instant::now();
    let (a, b, c) = tokio::join!(
        client.request(&request),
        client.request(&request),
        client.request(&request)
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_limiter_is_shared_between_clients() {
    let limiter = AdmissionLimiter::new(2);
    let first = RetryClient::new("a").with_limiter(limiter.clone());
    let second = RetryClient::new("b").with_limiter(limiter.clone());

    let _one = first.limiter().acquire().await;
    let _two = second.limiter().acquire().await;
    let third = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
    assert!(third.is_err(), "third slot should not be available");
}
