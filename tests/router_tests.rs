use wasmgate::router::{path_matches_pattern, HandlerRef};
use wasmgate::{
    Handler, HandlerError, Method, Request, Response, ResponseBuilder, Router, StatusCode,
};

fn tagged_handler(tag: &'static str) -> impl Fn(&Request) -> Result<Response, HandlerError> {
    move |_req: &Request| {
        let mut b = ResponseBuilder::new();
        b.set_text(tag)?;
        Ok(b.into_response())
    }
}

fn dispatch(router: &Router, method: Method, path: &str) -> Option<Response> {
    let route = router.find_route(method, path)?;
    match &route.handler {
        HandlerRef::Custom(handler) => handler.handle(&Request::new(method, path)).ok(),
        HandlerRef::Builtin(_) => None,
    }
}

fn body_text(response: &Response) -> String {
    String::from_utf8(response.body.clone().unwrap_or_default()).unwrap()
}

#[test]
fn wildcard_matching_vectors() {
    assert!(path_matches_pattern("/users/42", "/users/*"));
    assert!(!path_matches_pattern("/users", "/users/*"));
    assert!(path_matches_pattern("/a/b/c", "/a/*/c"));
    assert!(path_matches_pattern("/a/x/c", "/a/*/c"));
    assert!(!path_matches_pattern("/a/c", "/a/*/c"));
}

#[test]
fn wildcard_spans_multiple_segments() {
    assert!(path_matches_pattern("/static/css/deep/site.css", "/static/*"));
    assert!(path_matches_pattern("/v1/anything/status", "/v1/*/status"));
    assert!(!path_matches_pattern("/v1/anything/health", "/v1/*/status"));
}

#[test]
fn more_specific_later_registration_shadows() {
    let mut router = Router::new();
    router.add_handler(Method::Get, "/users/*", tagged_handler("wildcard"));
    router.add_handler(Method::Get, "/users/me", tagged_handler("exact"));

    let resp = dispatch(&router, Method::Get, "/users/me").unwrap();
    assert_eq!(body_text(&resp), "exact");
    let resp = dispatch(&router, Method::Get, "/users/42").unwrap();
    assert_eq!(body_text(&resp), "wildcard");
}

#[test]
fn registration_order_decides_between_overlapping_wildcards() {
    let mut router = Router::new();
    router.add_handler(Method::Get, "/api/*", tagged_handler("old"));
    router.add_handler(Method::Get, "/api/*", tagged_handler("new"));
    let resp = dispatch(&router, Method::Get, "/api/x").unwrap();
    assert_eq!(body_text(&resp), "new");
}

#[test]
fn method_must_match() {
    let mut router = Router::new();
    router.add_handler(Method::Post, "/items", tagged_handler("create"));
    assert!(router.find_route(Method::Get, "/items").is_none());
    assert!(router.find_route(Method::Post, "/items").is_some());
}

#[test]
fn remove_route_restores_shadowed_registration() {
    let mut router = Router::new();
    router.add_handler(Method::Get, "/p", tagged_handler("first"));
    router.add_handler(Method::Get, "/p", tagged_handler("second"));

    assert!(router.remove_route(Method::Get, "/p"));
    let resp = dispatch(&router, Method::Get, "/p").unwrap();
    assert_eq!(body_text(&resp), "first");

    assert!(router.remove_route(Method::Get, "/p"));
    assert!(router.find_route(Method::Get, "/p").is_none());
    assert!(!router.remove_route(Method::Get, "/p"));
}

#[test]
fn list_routes_reports_registration_order() {
    let mut router = Router::new();
    router.add_handler(Method::Get, "/a", tagged_handler("a"));
    router.add_handler(Method::Put, "/b/*", tagged_handler("b"));
    let routes = router.list_routes();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].method, Method::Get);
    assert_eq!(routes[0].pattern, "/a");
    assert_eq!(routes[1].method, Method::Put);
    assert_eq!(routes[1].pattern, "/b/*");
}

#[test]
fn handler_results_flow_through() {
    let mut router = Router::new();
    router.add_handler(
        Method::Get,
        "/ok",
        |_req: &Request| -> Result<Response, HandlerError> {
            let mut b = ResponseBuilder::new();
            b.set_status(StatusCode::CREATED);
            Ok(b.into_response())
        },
    );
    let resp = dispatch(&router, Method::Get, "/ok").unwrap();
    assert_eq!(resp.status, StatusCode::CREATED);
}
