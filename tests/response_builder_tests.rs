use std::time::{Duration, SystemTime};

use wasmgate::response::{self, CookieAttributes};
use wasmgate::{ResponseBuilder, StatusCode};

#[test]
fn finalize_is_idempotent_and_fills_missing_headers() {
    let mut b = ResponseBuilder::new();
    b.set_json(r#"{"n":1}"#).unwrap();
    b.finalize().unwrap();
    let first = b.build();
    b.finalize().unwrap();
    let second = b.build();

    assert_eq!(first, second);
    assert_eq!(first.header("Content-Length"), Some("7"));
    assert!(first.headers.contains("Date"));
    assert!(first.headers.contains("Server"));
}

#[test]
fn content_length_reflects_body_at_finalize_time() {
    let mut b = ResponseBuilder::new();
    b.set_text("1234").unwrap();
    b.set_text("123456789").unwrap();
    b.finalize().unwrap();
    assert_eq!(b.response().header("Content-Length"), Some("9"));
}

#[test]
fn error_page_and_error_json_shapes() {
    let page = response::not_found_response().unwrap();
    assert_eq!(page.status, StatusCode::NOT_FOUND);
    let html = String::from_utf8(page.body.clone().unwrap()).unwrap();
    assert!(html.contains("404 Not Found"));
    assert_eq!(page.header("Content-Type"), Some("text/html; charset=utf-8"));

    let mut b = ResponseBuilder::new();
    b.set_error_json(StatusCode::BAD_GATEWAY, "UPSTREAM", "backend down")
        .unwrap();
    let body: serde_json::Value =
        serde_json::from_slice(b.response().body.as_deref().unwrap()).unwrap();
    assert_eq!(body["error"]["status"], 502);
    assert_eq!(body["error"]["code"], "UPSTREAM");
}

#[test]
fn redirects_use_301_and_302() {
    let mut permanent = ResponseBuilder::new();
    permanent.redirect("/there", true).unwrap();
    assert_eq!(permanent.response().status, StatusCode::MOVED_PERMANENTLY);

    let mut temporary = ResponseBuilder::new();
    temporary.redirect("/there", false).unwrap();
    assert_eq!(temporary.response().status, StatusCode::FOUND);
    assert_eq!(temporary.response().header("Location"), Some("/there"));
}

#[test]
fn cookies_round_trip_attributes() {
    let mut b = ResponseBuilder::new();
    b.add_cookie(
        "session",
        "tok/en+value",
        &CookieAttributes {
            path: Some("/app".into()),
            max_age: Some(600),
            secure: true,
            http_only: true,
            ..CookieAttributes::default()
        },
    )
    .unwrap();
    let cookie = b.response().header("Set-Cookie").unwrap();
    assert!(cookie.starts_with("session=tok%2Fen%2Bvalue"));
    assert!(cookie.contains("; Path=/app"));
    assert!(cookie.contains("; Max-Age=600"));
    assert!(cookie.ends_with("; Secure; HttpOnly"));

    let mut b = ResponseBuilder::new();
    b.delete_cookie("session", None, None).unwrap();
    assert_eq!(b.response().header("Set-Cookie"), Some("session=; Max-Age=0"));
}

#[test]
fn caching_headers() {
    let mut b = ResponseBuilder::new();
    b.set_cache_control("public, max-age=3600").unwrap();
    b.set_etag("abc123", true).unwrap();
    let expires = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    b.set_expires(expires).unwrap();

    assert_eq!(
        b.response().header("Cache-Control"),
        Some("public, max-age=3600")
    );
    assert_eq!(b.response().header("ETag"), Some("W/\"abc123\""));
    assert_eq!(
        b.response().header("Expires"),
        Some("Tue, 14 Nov 2023 22:13:20 GMT")
    );
}

#[test]
fn security_header_block() {
    let mut b = ResponseBuilder::new();
    b.set_security_headers().unwrap();
    b.set_csp("script-src 'none'").unwrap();
    let resp = b.build();
    assert_eq!(resp.header("X-Content-Type-Options"), Some("nosniff"));
    assert_eq!(resp.header("X-Frame-Options"), Some("DENY"));
    assert_eq!(resp.header("X-XSS-Protection"), Some("1; mode=block"));
    assert_eq!(resp.header("Content-Security-Policy"), Some("script-src 'none'"));
}

#[test]
fn health_responses() {
    let healthy = response::health_response(true, "all good").unwrap();
    assert_eq!(healthy.status, StatusCode::OK);
    let unhealthy = response::health_response(false, "db down").unwrap();
    assert_eq!(unhealthy.status, StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value =
        serde_json::from_slice(unhealthy.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["details"], "db down");
}
