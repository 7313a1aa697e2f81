#![allow(clippy::unwrap_used)]
// Integration tests for `WattsClient` using wiremock.

use std::collections::BTreeMap;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use watts_api::auth::TOKEN_PATH;
use watts_api::endpoints::{
    CHECK_LAST_CONNEXION, QUERY_CHECK_FAILURE, QUERY_PUSH, SMARTHOME_READ, SMARTHOME_TIME_OFFSET,
    STATS_READ, USER_READ,
};
use watts_api::{Credentials, Error, TransportConfig, WattsClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, WattsClient) {
    let server = MockServer::start().await;
    let transport = TransportConfig::single_host(server.uri());
    let client = WattsClient::new(
        Credentials::new("user@example.com", "hunter2"),
        "en",
        &transport,
    )
    .unwrap();
    (server, client)
}

fn token_body(access: &str, expires_in: u64) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": format!("{access}-refresh"),
        "expires_in": expires_in,
    })
}

async fn mount_token(server: &MockServer, access: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access, 300)))
        .mount(server)
        .await;
}

fn ok_envelope(data: serde_json::Value) -> serde_json::Value {
    json!({
        "code": { "code": "1", "key": "OK", "value": "OK" },
        "data": data,
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_sends_password_grant() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=app-front"))
        .and(body_string_contains("username=user%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 300)))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
    assert!(client.has_fresh_token().await);
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let result = client.login().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.has_fresh_token().await);
}

#[tokio::test]
async fn test_token_reused_while_fresh() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 300)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(USER_READ))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({}))))
        .expect(2)
        .mount(&server)
        .await;

    client.get_user_data(None).await.unwrap();
    client.get_user_data(None).await.unwrap();
}

#[tokio::test]
async fn test_token_inside_expiry_margin_triggers_login() {
    let (server, client) = setup().await;

    // 10s lifetime is inside the 30s margin: every call logs in again.
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 10)))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(USER_READ))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({}))))
        .mount(&server)
        .await;

    client.get_user_data(None).await.unwrap();
    client.get_user_data(None).await.unwrap();
}

#[tokio::test]
async fn test_rejected_token_reauthenticates_once() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 300)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-2", 300)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(USER_READ))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(USER_READ))
        .and(header("authorization", "Bearer tok-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok_envelope(json!({"user_id": "42"}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let body = client.get_user_data(None).await.unwrap();
    assert_eq!(body["data"]["user_id"], "42");
}

#[tokio::test]
async fn test_second_rejection_is_terminal() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok", 300)))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(USER_READ))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.get_user_data(None).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.has_fresh_token().await);
}

// ── Envelope tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_carries_path_and_status() {
    let (server, client) = setup().await;
    mount_token(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path(SMARTHOME_READ))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client.get_smarthome_data("SH1", None).await.unwrap_err();
    match err {
        Error::Http { path, status, body } => {
            assert_eq!(path, SMARTHOME_READ);
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_vendor_code_rejected() {
    let (server, client) = setup().await;
    mount_token(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path(SMARTHOME_READ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": { "code": "3", "key": "ERR_SMARTHOME", "value": "unknown smarthome" },
            "data": null,
        })))
        .mount(&server)
        .await;

    let err = client.get_smarthome_data("SH1", None).await.unwrap_err();
    assert!(err.is_api());
    assert_eq!(err.vendor_code(), Some("3"));
}

#[tokio::test]
async fn test_check_failure_tolerates_no_data_code() {
    let (server, client) = setup().await;
    mount_token(&server, "tok").await;

    let body = json!({
        "code": { "code": "2", "key": "NO_DATA", "value": "" },
        "data": [],
    });
    Mock::given(method("POST"))
        .and(path(QUERY_CHECK_FAILURE))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SMARTHOME_READ))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    client.check_failure("SH1", None).await.unwrap();
    let err = client.get_smarthome_data("SH1", None).await.unwrap_err();
    assert_eq!(err.vendor_code(), Some("2"));
}

#[tokio::test]
async fn test_invalid_json_is_deserialization_error() {
    let (server, client) = setup().await;
    mount_token(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path(USER_READ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client.get_user_data(None).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Form shaping tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_push_query_form_fields() {
    let (server, client) = setup().await;
    mount_token(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path(QUERY_PUSH))
        .and(body_string_contains("smarthome_id=SH1"))
        .and(body_string_contains("lang=fr"))
        .and(body_string_contains("context=1"))
        .and(body_string_contains("peremption=15000"))
        .and(body_string_contains("query%5Bgv_mode%5D=4"))
        .and(body_string_contains("query%5Bid_device%5D=C001-000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let query = BTreeMap::from([
        ("id_device".to_owned(), "C001-000".to_owned()),
        ("gv_mode".to_owned(), "4".to_owned()),
    ]);
    client.push_query("SH1", &query, Some("fr")).await.unwrap();
}

#[tokio::test]
async fn test_default_lang_is_sent() {
    let (server, client) = setup().await;
    mount_token(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path(SMARTHOME_READ))
        .and(body_string_contains("lang=en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    client.get_smarthome_data("SH1", None).await.unwrap();
}

#[tokio::test]
async fn test_smarthome_scoped_reads_share_form_shape() {
    let (server, client) = setup().await;
    mount_token(&server, "tok").await;

    for endpoint in [SMARTHOME_TIME_OFFSET, CHECK_LAST_CONNEXION, STATS_READ] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(header("authorization", "Bearer tok"))
            .and(body_string_contains("smarthome_id=SH1"))
            .and(body_string_contains("lang=de"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(ok_envelope(json!({ "path": endpoint }))),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let offset = client.get_time_offset("SH1", Some("de")).await.unwrap();
    assert_eq!(offset["data"]["path"], SMARTHOME_TIME_OFFSET);

    let last = client.check_last_connection("SH1", Some("de")).await.unwrap();
    assert_eq!(last["data"]["path"], CHECK_LAST_CONNEXION);

    let stats = client.read_stats("SH1", Some("de")).await.unwrap();
    assert_eq!(stats["data"]["path"], STATS_READ);
}

// ── Transport tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    let transport = TransportConfig::single_host("http://127.0.0.1:1");
    let client = WattsClient::new(Credentials::new("u", "p"), "en", &transport).unwrap();

    let result = client.get_user_data(None).await;
    assert!(
        matches!(result, Err(Error::Connection(_))),
        "expected Connection error, got: {result:?}"
    );
    assert!(result.unwrap_err().is_transient());
}
