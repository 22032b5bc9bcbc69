//! Integration tests for the certificate API client against a mocked shop
//!
//! Run with: cargo test --test api_client_test

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use giftcert_bot::api::{
    ApiError, CertCode, CertRef, CertificateApi, CertificateStatus, HttpCertificateApi, NewCertificate, TOKEN_HEADER,
};

const TOKEN: &str = "secret-token";

fn route(op: &str) -> String {
    format!("extension/module/giftcert_pdf_api/{}", op)
}

fn client_for(base: &str) -> HttpCertificateApi {
    let base = Url::parse(&format!("{}/", base.trim_end_matches('/'))).unwrap();
    HttpCertificateApi::new(
        base,
        SecretString::from(TOKEN.to_string()),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn by_code(raw: &str) -> CertRef {
    CertRef::Code(CertCode::parse(raw).unwrap())
}

async fn setup() -> (MockServer, HttpCertificateApi) {
    let server = MockServer::start().await;
    let api = client_for(&server.uri());
    (server, api)
}

#[tokio::test]
async fn test_get_by_code_sends_token_and_numeric_code() {
    let (server, api) = setup().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("route", route("get")))
        .and(query_param("code", "555555"))
        .and(header(TOKEN_HEADER, TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "cert": {
                "giftcert_id": "17",
                "code": "555555",
                "amount": "70.00",
                "status": "sent",
                "recipient_name": "Анна"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cert = api.get(by_code("555555")).await.unwrap();
    assert_eq!(cert.giftcert_id, 17);
    assert_eq!(cert.code, "555555");
    assert_eq!(cert.status, CertificateStatus::Sent);
}

#[tokio::test]
async fn test_get_by_id_uses_giftcert_id() {
    let (server, api) = setup().await;

    Mock::given(method("GET"))
        .and(query_param("route", route("get")))
        .and(query_param("giftcert_id", "17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": 1,
            "cert": {"giftcert_id": 17, "code": 123456}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cert = api.get(CertRef::Id(17)).await.unwrap();
    assert_eq!(cert.cert_code().map(|c| c.to_string()), Some("123456".to_string()));
}

#[tokio::test]
async fn test_list_passes_paging_and_keeps_order() {
    let (server, api) = setup().await;

    Mock::given(method("GET"))
        .and(query_param("route", route("list")))
        .and(query_param("start", "0"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "rows": [
                {"giftcert_id": 3, "code": "333", "status": "used"},
                {"giftcert_id": 2, "code": "222", "status": "annulled"},
                {"giftcert_id": 1, "code": "111", "status": null}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api.list(0, 10).await.unwrap();
    let codes: Vec<&str> = page.rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["333", "222", "111"]);
    assert!(page.rows[2].status.is_active());
}

#[tokio::test]
async fn test_create_posts_json_body() {
    let (server, api) = setup().await;

    Mock::given(method("POST"))
        .and(query_param("route", route("create")))
        .and(header(TOKEN_HEADER, TOKEN))
        .and(body_json(json!({
            "amount": 70,
            "recipient_name": "Анна",
            "firstname": "Иван",
            "lastname": "Петров",
            "recipient_email": "",
            "send_email": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "giftcert_id": 42,
            "code": "987654",
            "amount": "70.00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = api
        .create(&NewCertificate {
            amount: 70,
            recipient_name: "Анна".into(),
            firstname: "Иван".into(),
            lastname: "Петров".into(),
            recipient_email: String::new(),
            send_email: false,
        })
        .await
        .unwrap();

    assert_eq!(created.giftcert_id, 42);
    assert_eq!(created.code, "987654");
}

#[tokio::test]
async fn test_mutations_send_expected_bodies() {
    let (server, api) = setup().await;

    Mock::given(method("POST"))
        .and(query_param("route", route("delete")))
        .and(body_json(json!({"code": "012345", "confirm": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "Deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("route", route("annul")))
        .and(body_json(json!({"code": "555555", "reason": "test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "cert": {"code": "555555", "status": "annulled"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("route", route("use")))
        .and(body_json(json!({"giftcert_id": 17, "note": "test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": "true"})))
        .expect(1)
        .mount(&server)
        .await;

    let deleted = api.delete(by_code("012345")).await.unwrap();
    assert!(deleted.cert.is_none());
    assert_eq!(deleted.message.as_deref(), Some("Deleted"));

    let annulled = api.annul(by_code("555555"), "test").await.unwrap();
    assert_eq!(annulled.cert.map(|c| c.status), Some(CertificateStatus::Annulled));

    let used = api.mark_used(CertRef::Id(17), "test").await.unwrap();
    assert!(used.cert.is_none());
}

#[tokio::test]
async fn test_remote_error_is_surfaced_verbatim() {
    let (server, api) = setup().await;

    Mock::given(method("POST"))
        .and(query_param("route", route("resend")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Recipient email is empty"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = api.resend(by_code("1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Remote(ref m) if m == "Recipient email is empty"));
}

#[tokio::test]
async fn test_non_2xx_status_is_reported_with_code() {
    let (server, api) = setup().await;

    Mock::given(method("GET"))
        .and(query_param("route", route("list")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    match api.list(0, 10).await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparsable_body_is_a_decode_error() {
    let (server, api) = setup().await;

    Mock::given(method("GET"))
        .and(query_param("route", route("get")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Fatal error</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = api.get(by_code("1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_pdf_returns_bytes() {
    let (server, api) = setup().await;
    let pdf = b"%PDF-1.4 fake".to_vec();

    Mock::given(method("GET"))
        .and(query_param("route", route("pdf")))
        .and(query_param("code", "012345"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(api.pdf(by_code("012345")).await.unwrap(), pdf);
}

#[tokio::test]
async fn test_pdf_json_error_is_remote_error() {
    let (server, api) = setup().await;

    Mock::given(method("GET"))
        .and(query_param("route", route("pdf")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Certificate not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = api.pdf(by_code("1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Remote(ref m) if m == "Certificate not found"));
}

#[tokio::test]
async fn test_transport_failure_is_not_retried() {
    // Nothing listens on port 1
    let api = client_for("http://127.0.0.1:1");

    let err = api.list(0, 10).await.unwrap_err();
    assert!(err.is_transport(), "expected transport error, got {:?}", err);
}

#[tokio::test]
async fn test_timeout_is_a_transport_error_and_single_request() {
    let server = MockServer::start().await;
    let api = HttpCertificateApi::new(
        Url::parse(&format!("{}/", server.uri())).unwrap(),
        SecretString::from(TOKEN.to_string()),
        Duration::from_millis(200),
        Duration::from_millis(200),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(query_param("route", route("get")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "cert": {}}))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = api.get(by_code("1")).await.unwrap_err();
    assert!(err.is_transport());
}
