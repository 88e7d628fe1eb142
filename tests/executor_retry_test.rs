mod common;

use common::*;
use hestia::HestiaError;
use hestia::kraken::{
    AuthenticatedExecutor, Authenticator, Credentials, GraphqlTransport, TokenManager,
};
use hestia::kraken::queries::{ACCOUNT_DATA_QUERY, ACCOUNTS_QUERY, LOGIN_MUTATION};
use hestia::logging::get_logger;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

fn executor(transport: Arc<ScriptedTransport>) -> (AuthenticatedExecutor, hestia::kraken::SharedToken) {
    let config = test_config();
    let token = TokenManager::from_config(&config.api, get_logger("token")).shared();
    let transport: Arc<dyn GraphqlTransport> = transport;
    let authenticator = Arc::new(Authenticator::new(
        transport.clone(),
        token.clone(),
        Credentials {
            email: config.account.email.clone(),
            password: config.account.password.clone(),
        },
        LOGIN_MUTATION.to_string(),
        Duration::from_secs(5),
        get_logger("auth"),
    ));
    let executor = AuthenticatedExecutor::new(
        transport,
        authenticator,
        token.clone(),
        "JWT".to_string(),
        get_logger("executor"),
    );
    (executor, token)
}

#[tokio::test]
async fn token_error_retries_once_and_returns_second_response_verbatim() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    transport.push(ACCOUNTS, Some(json!({"errors": [{"message": "Invalid token"}]})));
    transport.push(
        ACCOUNTS,
        Some(json!({"data": null, "errors": [{"message": "Token has expired"}]})),
    );
    let (executor, _) = executor(transport.clone());

    let response = executor
        .execute_with_auth(ACCOUNTS_QUERY, json!({}))
        .await
        .unwrap();

    assert_eq!(response.error_messages(), vec!["Token has expired"]);
    assert_eq!(transport.count(ACCOUNTS), 2);
    // initial login plus one after the token was cleared
    assert_eq!(transport.count(LOGIN), 2);
}

#[tokio::test]
async fn retry_success_is_returned() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    transport.push(ACCOUNTS, Some(json!({"errors": [{"message": "Unauthorized"}]})));
    transport.on(ACCOUNTS, json!({"data": {"viewer": {"accounts": []}}}));
    let (executor, token) = executor(transport.clone());

    let response = executor
        .execute_with_auth(ACCOUNTS_QUERY, json!({}))
        .await
        .unwrap();
    assert!(!response.has_errors());
    assert!(token.lock().await.is_valid());
}

#[tokio::test]
async fn non_auth_errors_are_not_retried() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    transport.on(
        ACCOUNTS,
        json!({"data": null, "errors": [{"message": "Account not found"}]}),
    );
    let (executor, _) = executor(transport.clone());

    let response = executor
        .execute_with_auth(ACCOUNTS_QUERY, json!({}))
        .await
        .unwrap();
    assert!(response.has_errors());
    assert_eq!(transport.count(ACCOUNTS), 1);
    assert_eq!(transport.count(LOGIN), 1);
}

#[tokio::test]
async fn bearer_header_is_attached() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    transport.on(ACCOUNTS, json!({"data": {"viewer": {"accounts": []}}}));
    let (executor, token) = executor(transport.clone());

    executor
        .execute_with_auth(ACCOUNTS_QUERY, json!({}))
        .await
        .unwrap();

    let raw = token.lock().await.token().unwrap().to_string();
    let call = &transport.calls_of(ACCOUNTS)[0];
    assert_eq!(call.header("Authorization"), Some(format!("JWT {}", raw).as_str()));
}

#[tokio::test]
async fn failed_login_fails_fast_with_auth_error() {
    let transport = ScriptedTransport::new();
    transport.on(LOGIN, json!({"errors": [{"message": "Invalid credentials"}]}));
    let (executor, _) = executor(transport.clone());

    let err = executor
        .execute_with_auth(ACCOUNTS_QUERY, json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, HestiaError::Auth { .. }));
    assert!(err.requires_reauth());
    assert_eq!(transport.count(ACCOUNTS), 0);
}

#[tokio::test]
async fn missing_transport_result_is_empty_response() {
    let transport = ScriptedTransport::new();
    login_ok(&transport);
    let (executor, _) = executor(transport.clone());

    let err = executor
        .execute_with_auth(ACCOUNTS_QUERY, json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, HestiaError::EmptyResponse { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn concurrent_token_errors_share_one_relogin() {
    let transport = ScriptedTransport::new();
    let issued = Arc::new(AtomicI64::new(0));
    let counter = issued.clone();
    transport.respond_with(LOGIN, move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Some(response(
            json!({"data": {"obtainKrakenToken": {"token": jwt(3600 + n)}}}),
        ))
    });
    transport.delay(LOGIN, Duration::from_millis(50));

    let expired = json!({"data": null, "errors": [{"message": "Token has expired"}]});
    transport.delay(ACCOUNTS, Duration::from_millis(10));
    transport.push(ACCOUNTS, Some(expired.clone()));
    transport.on(ACCOUNTS, json!({"data": {"viewer": {"accounts": [{"number": "A-1"}]}}}));
    transport.delay(ACCOUNT_DATA, Duration::from_millis(30));
    transport.push(ACCOUNT_DATA, Some(expired));
    transport.on(ACCOUNT_DATA, json!({"data": {"account": {"number": "A-1"}}}));
    let (executor, _) = executor(transport.clone());

    let (accounts, data) = tokio::join!(
        executor.execute_with_auth(ACCOUNTS_QUERY, json!({})),
        executor.execute_with_auth(ACCOUNT_DATA_QUERY, json!({"accountNumber": "A-1"})),
    );

    assert!(!accounts.unwrap().has_errors());
    assert!(!data.unwrap().has_errors());
    // one login up front, one after the shared token was refused
    assert_eq!(transport.count(LOGIN), 2);
    assert_eq!(transport.count(ACCOUNTS), 2);
    assert_eq!(transport.count(ACCOUNT_DATA), 2);

    let first = transport.calls_of(ACCOUNTS);
    let second = transport.calls_of(ACCOUNT_DATA);
    assert_eq!(first[0].header("Authorization"), second[0].header("Authorization"));
    assert_eq!(first[1].header("Authorization"), second[1].header("Authorization"));
    assert_ne!(first[0].header("Authorization"), first[1].header("Authorization"));
}
