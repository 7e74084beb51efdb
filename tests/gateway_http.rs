//! End-to-end tests: reqwest client → gateway → real HTTP backend.

mod common;

use std::time::Duration;

use common::{start_gateway, start_mock_backend, unused_address, MockConnector};
use edge_gateway::config::GatewayConfig;
use edge_gateway::lifecycle::run_gateway;
use edge_gateway::Shutdown;
use reqwest::StatusCode;
use tokio::net::TcpListener;

#[tokio::test]
async fn routine_call_is_relayed_from_backend() {
    let backend = start_mock_backend(true).await;
    let gateway = start_gateway(backend.addr, 2).await;

    let response = reqwest::get(gateway.url("/chans/routine/42?verbose=1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.text().await.unwrap(), "routine:/routine/42?verbose=1");
    gateway.stop().await;
}

#[tokio::test]
async fn inbound_request_id_is_echoed() {
    let backend = start_mock_backend(true).await;
    let gateway = start_gateway(backend.addr, 1).await;

    let response = reqwest::Client::new()
        .get(gateway.url("/chans/routine/7"))
        .header("x-request-id", "trace-abc")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "trace-abc");
    gateway.stop().await;
}

#[tokio::test]
async fn single_worker_reuses_one_backend_connection() {
    let backend = start_mock_backend(true).await;
    let gateway = start_gateway(backend.addr, 1).await;
    let client = reqwest::Client::new();

    for i in 0..5 {
        let body = client
            .get(gateway.url(&format!("/chans/routine/{i}")))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, format!("routine:/routine/{i}"));
    }

    assert_eq!(backend.requests(), 5);
    assert_eq!(backend.connections(), 1);
    gateway.stop().await;
}

#[tokio::test]
async fn closed_backend_connection_is_reopened() {
    let backend = start_mock_backend(false).await;
    let gateway = start_gateway(backend.addr, 1).await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        let response = client
            .get(gateway.url(&format!("/chans/routine/{i}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(backend.requests(), 3);
    assert_eq!(backend.connections(), 3);
    gateway.stop().await;
}

#[tokio::test]
async fn unreachable_backend_is_bad_gateway() {
    let gateway = start_gateway(unused_address(), 1).await;

    let response = reqwest::get(gateway.url("/chans/routine/1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["code"], "BACKEND_UNAVAILABLE");
    gateway.stop().await;
}

#[tokio::test]
async fn healthcheck_reports_pool_state() {
    let backend = start_mock_backend(true).await;
    let gateway = start_gateway(backend.addr, 3).await;

    let response = reqwest::get(gateway.url("/healthcheck")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["workers"], 3);
    assert_eq!(json["queue_capacity"], 10);
    assert_eq!(json["queue_depth"], 0);
    assert_eq!(backend.connections(), 0);
    gateway.stop().await;
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let backend = start_mock_backend(true).await;
    let gateway = start_gateway(backend.addr, 1).await;

    let response = reqwest::get(gateway.url("/routine/1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["code"], "PAGE_NOT_FOUND");
    gateway.stop().await;
}

#[tokio::test]
async fn encoded_path_escape_is_rejected_before_dispatch() {
    let backend = start_mock_backend(true).await;
    let gateway = start_gateway(backend.addr, 1).await;

    let response = reqwest::get(gateway.url("/chans/routine/..%2F..%2Fadmin%3Fx=1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["code"], "INVALID_ROUTINE_ID");
    assert_eq!(backend.requests(), 0);
    gateway.stop().await;
}

#[tokio::test]
async fn id_with_invalid_uri_characters_is_bad_request() {
    let backend = start_mock_backend(true).await;
    let gateway = start_gateway(backend.addr, 1).await;

    let response = reqwest::get(gateway.url("/chans/routine/a%20b")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["code"], "INVALID_ROUTINE_ID");
    assert_eq!(backend.requests(), 0);
    assert_eq!(backend.connections(), 0);
    gateway.stop().await;
}

#[tokio::test]
async fn shutdown_completes_in_flight_call_then_drains_pool() {
    let connector = MockConnector::with_delay(Duration::from_millis(200));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let gateway = tokio::spawn({
        let connector = connector.clone();
        let shutdown = shutdown.clone();
        async move { run_gateway(&GatewayConfig::default(), listener, connector, shutdown).await }
    });

    let call = tokio::spawn(reqwest::get(format!("http://{addr}/chans/routine/5")));
    for _ in 0..200 {
        if connector.connects() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(connector.connects(), 1, "request never reached a worker");

    shutdown.trigger("test");
    let response = call.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "/routine/5");

    gateway.await.unwrap().unwrap();
    assert_eq!(connector.executions(), 1);
}
