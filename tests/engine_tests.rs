use std::sync::Once;
use std::time::Duration;

use wasmgate::{
    EngineError, HandlerError, LifecycleState, Method, Middleware, Request, Response,
    ResponseBuilder, ServiceConfig, ServiceEngine, StatusCode,
};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("wasmgate=debug")
            .with_test_writer()
            .try_init();
    });
}

fn running_engine() -> ServiceEngine {
    init_tracing();
    let mut engine = ServiceEngine::new();
    engine.init(None);
    engine.start().unwrap();
    engine
}

fn request(method: Method, path: &str) -> Request {
    let mut req = Request::new(method, path);
    req.headers.add("Host", "svc.local").unwrap();
    req
}

fn body_json(response: &Response) -> serde_json::Value {
    serde_json::from_slice(response.body.as_deref().unwrap()).unwrap()
}

#[test]
fn start_requires_init() {
    let mut engine = ServiceEngine::new();
    assert_eq!(engine.start(), Err(EngineError::NotInitialized));
    engine.init(None);
    assert!(engine.start().is_ok());
    assert_eq!(engine.state(), LifecycleState::Running);
}

#[test]
fn init_applies_config() {
    let mut engine = ServiceEngine::new();
    engine.init(Some(ServiceConfig::new("orders", "2.0.0")));
    assert_eq!(engine.get_config().name, "orders");
    assert_eq!(engine.get_config().version, "2.0.0");
}

#[test]
fn health_route_reflects_lifecycle() {
    let mut engine = running_engine();
    let resp = engine.handle_request(&request(Method::Get, "/health")).unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(body_json(&resp)["status"], "healthy");

    engine.stop();
    let resp = engine.handle_request(&request(Method::Get, "/health")).unwrap();
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(&resp)["status"], "unhealthy");
}

#[test]
fn echo_route_renders_the_request() {
    let mut engine = running_engine();
    let mut req = request(Method::Get, "/echo");
    req.query = Some("a=1".to_string());
    let resp = engine.handle_request(&req).unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    let text = String::from_utf8(resp.body.unwrap()).unwrap();
    assert!(text.starts_with("GET /echo?a=1 HTTP/1.1\r\n"));
    assert!(text.contains("Host: svc.local"));
}

#[test]
fn security_violations_return_403() {
    // missing Host
    let mut engine = running_engine();
    let resp = engine
        .handle_request(&Request::new(Method::Get, "/health"))
        .unwrap();
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    // https required but not forwarded
    let mut engine = running_engine();
    engine.set_require_https(true);
    let resp = engine.handle_request(&request(Method::Get, "/health")).unwrap();
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    let mut req = request(Method::Get, "/health");
    req.headers.add("X-Forwarded-Proto", "https").unwrap();
    assert_eq!(engine.handle_request(&req).unwrap().status, StatusCode::OK);

    // body over the configured ceiling
    let mut engine = ServiceEngine::new();
    let mut config = ServiceConfig::default();
    config.max_request_size = 8;
    engine.init(Some(config));
    engine.start().unwrap();
    let mut req = request(Method::Post, "/echo");
    req.body = Some(vec![0u8; 9]);
    let resp = engine.handle_request(&req).unwrap();
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[test]
fn stats_track_outcomes_and_average() {
    let mut engine = running_engine();
    for _ in 0..3 {
        engine.handle_request(&request(Method::Get, "/health")).unwrap();
    }
    for _ in 0..2 {
        let resp = engine.handle_request(&request(Method::Get, "/missing")).unwrap();
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
    }
    let stats = engine.get_stats();
    assert_eq!(stats.total_requests, 5);
    assert_eq!(stats.successful_requests, 3);
    assert_eq!(stats.failed_requests, 2);

    engine.reset_stats();
    assert_eq!(engine.get_stats().total_requests, 0);
}

#[test]
fn start_resets_statistics() {
    let mut engine = running_engine();
    engine.handle_request(&request(Method::Get, "/health")).unwrap();
    assert_eq!(engine.get_stats().total_requests, 1);
    engine.stop();
    engine.start().unwrap();
    assert_eq!(engine.get_stats().total_requests, 0);
}

#[test]
fn custom_routes_and_handler_errors() {
    let mut engine = running_engine();
    engine.add_route(
        Method::Post,
        "/items",
        |req: &Request| -> Result<Response, HandlerError> {
            let mut b = ResponseBuilder::new();
            b.set_status(StatusCode::CREATED);
            b.set_json(&format!(r#"{{"received":{}}}"#, req.body_size()))?;
            b.finalize()?;
            Ok(b.into_response())
        },
    );
    engine.add_route(
        Method::Get,
        "/fail",
        |_req: &Request| -> Result<Response, HandlerError> { Err(HandlerError::new("nope")) },
    );

    let mut req = request(Method::Post, "/items");
    req.body = Some(b"12345".to_vec());
    let resp = engine.handle_request(&req).unwrap();
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(body_json(&resp)["received"], 5);

    let err = engine.handle_request(&request(Method::Get, "/fail")).unwrap_err();
    assert_eq!(err.message, "nope");
    let stats = engine.get_stats();
    assert_eq!(stats.successful_requests, 1);
    assert_eq!(stats.failed_requests, 1);
}

#[test]
fn static_assets_serve_as_fallback() {
    let mut engine = running_engine();
    engine.enable_security_headers(true);
    assert!(engine.add_static_asset("/index.html", b"<h1>home</h1>".to_vec()));

    let resp = engine.handle_request(&request(Method::Get, "/")).unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("Content-Type"), Some("text/html"));
    assert_eq!(resp.body.as_deref(), Some(&b"<h1>home</h1>"[..]));
    assert_eq!(resp.header("X-Frame-Options"), Some("DENY"));

    let resp = engine.handle_request(&request(Method::Get, "/nope.js")).unwrap();
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[test]
fn security_headers_and_csp_on_success() {
    let mut engine = running_engine();
    engine.enable_security_headers(true);
    engine.set_csp_policy("default-src 'self'");
    let resp = engine.handle_request(&request(Method::Get, "/health")).unwrap();
    assert_eq!(resp.header("X-Content-Type-Options"), Some("nosniff"));
    assert_eq!(resp.header("X-XSS-Protection"), Some("1; mode=block"));
    assert_eq!(
        resp.header("Referrer-Policy"),
        Some("strict-origin-when-cross-origin")
    );
    assert_eq!(
        resp.header("Content-Security-Policy"),
        Some("default-src 'self'")
    );
}

struct Blocker;

impl Middleware for Blocker {
    fn before(&self, request: &Request) -> Option<Response> {
        if request.header("X-Deny").is_some() {
            let mut b = ResponseBuilder::new();
            b.set_status(StatusCode::TOO_MANY_REQUESTS);
            Some(b.build())
        } else {
            None
        }
    }
}

struct Stamper;

impl Middleware for Stamper {
    fn after(&self, _request: &Request, response: &mut Response, latency: Duration) {
        let _ = latency;
        response.headers.add("X-Stage", "stamped").ok();
    }
}

#[test]
fn middleware_wraps_the_handler() {
    let mut engine = running_engine();
    engine.add_middleware(Blocker);
    engine.add_middleware(Stamper);

    // pass-through: handler runs, after() stamps
    let resp = engine.handle_request(&request(Method::Get, "/health")).unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("X-Stage"), Some("stamped"));

    // short-circuit: handler never runs, after() still stamps
    let mut req = request(Method::Get, "/health");
    req.headers.add("X-Deny", "1").unwrap();
    let resp = engine.handle_request(&req).unwrap();
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.header("X-Stage"), Some("stamped"));
}

#[test]
fn custom_error_handler_overrides_default_pages() {
    let mut engine = running_engine();
    engine.set_error_handler(|_req, status, message| {
        let mut b = ResponseBuilder::new();
        b.set_error_json(status, "CUSTOM", message)?;
        b.finalize()?;
        Ok(b.into_response())
    });
    let resp = engine.handle_request(&request(Method::Get, "/missing")).unwrap();
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(body_json(&resp)["error"]["code"], "CUSTOM");
    assert_eq!(body_json(&resp)["error"]["message"], "Route not found");
}

#[test]
fn handle_chunk_end_to_end() {
    let mut engine = running_engine();
    let wire = b"GET /health HTTP/1.1\r\nHost: svc.local\r\n\r\n";
    // drip-feed the whole message in 8-byte chunks
    let mut response = None;
    for chunk in wire.chunks(8) {
        if let Some(resp) = engine.handle_chunk(chunk).unwrap() {
            response = Some(resp);
        }
    }
    let resp = response.expect("completed request");
    assert_eq!(resp.status, StatusCode::OK);
}
