mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn concurrent_authenticate_logs_in_once() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    transport.delay(LOGIN, Duration::from_millis(50));
    let client = Arc::new(client(transport.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.authenticate().await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    assert_eq!(transport.count(LOGIN), 1);
    assert!(client.token().lock().await.is_valid());
}

#[tokio::test]
async fn valid_token_skips_login() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    let client = client(transport.clone());

    assert!(client.authenticate().await);
    assert!(client.authenticate().await);
    assert_eq!(transport.count(LOGIN), 1);
}

#[tokio::test]
async fn login_without_token_or_errors_fails() {
    let transport = ScriptedTransport::new();
    transport.on(LOGIN, json!({"data": {"obtainKrakenToken": {}}}));
    let client = client(transport.clone());

    assert!(!client.authenticate().await);
    assert!(client.token().lock().await.token().is_none());
}

#[tokio::test]
async fn login_with_errors_fails() {
    let transport = ScriptedTransport::new();
    transport.on(
        LOGIN,
        json!({"data": null, "errors": [{"message": "Invalid data.", "extensions": {"errorCode": "KT-CT-1138"}}]}),
    );
    let client = client(transport.clone());

    assert!(!client.authenticate().await);
    assert!(!client.token().lock().await.is_valid());
}

#[tokio::test]
async fn login_transport_failure_fails() {
    let transport = ScriptedTransport::new();
    let client = client(transport.clone());

    assert!(!client.authenticate().await);
    assert_eq!(transport.count(LOGIN), 1);
}

#[tokio::test]
async fn login_carries_credentials_and_no_bearer() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    let client = client(transport.clone());
    assert!(client.authenticate().await);

    let call = &transport.calls_of(LOGIN)[0];
    assert!(call.header("Authorization").is_none());
    assert_eq!(call.variables["input"]["email"], "user@example.com");
    assert_eq!(call.variables["input"]["password"], "hunter2");
}

#[tokio::test]
async fn login_times_out() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    transport.delay(LOGIN, Duration::from_millis(1500));

    let mut config = test_config();
    config.api.login_timeout_secs = 1;
    let client = hestia::KrakenClient::with_transport(
        &config,
        transport.clone(),
        hestia::kraken::QuerySet::default(),
        hestia::logging::get_logger("test"),
    );

    assert!(!client.authenticate().await);
    assert!(client.token().lock().await.token().is_none());
}

#[tokio::test]
async fn opaque_token_gets_default_lifetime() {
    let transport = ScriptedTransport::new();
    transport.on(LOGIN, json!({"data": {"obtainKrakenToken": {"token": "not-a-jwt"}}}));
    let client = client(transport.clone());

    let before = chrono::Utc::now();
    assert!(client.authenticate().await);
    let expiry = client.token().lock().await.expiry().unwrap();
    let lifetime = (expiry - before).num_seconds();
    assert!((3599..=3601).contains(&lifetime));
}
