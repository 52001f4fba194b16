//! Middleware seam around route handlers.

use std::time::Duration;

use tracing::info;

use crate::request::Request;
use crate::response::Response;

/// A processing stage wrapped around the matched handler.
///
/// `before` runs ahead of the handler and may short-circuit by returning a
/// response of its own, in which case the handler and any later middleware
/// never run. `after` runs once a response exists (from the handler or a
/// short-circuit) and may mutate it; `after` stages run in reverse
/// registration order with the handler's elapsed time.
pub trait Middleware: Send + Sync {
    /// Inspect the request before the handler. `Some(response)`
    /// short-circuits the chain.
    fn before(&self, request: &Request) -> Option<Response> {
        let _ = request;
        None
    }

    /// Observe or mutate the response after the handler.
    fn after(&self, request: &Request, response: &mut Response, latency: Duration) {
        let _ = (request, response, latency);
    }
}

/// Stock middleware that logs each request/response pair with structured
/// fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogMiddleware;

impl Middleware for RequestLogMiddleware {
    fn after(&self, request: &Request, response: &mut Response, latency: Duration) {
        info!(
            method = %request.method,
            path = %request.path,
            status = response.status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            "request handled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;
    use crate::response::ResponseBuilder;
    use http::StatusCode;

    struct Gate;

    impl Middleware for Gate {
        fn before(&self, request: &Request) -> Option<Response> {
            if request.header("X-Blocked").is_some() {
                let mut b = ResponseBuilder::new();
                b.set_status(StatusCode::FORBIDDEN);
                Some(b.build())
            } else {
                None
            }
        }
    }

    #[test]
    fn test_before_default_passes_through() {
        let req = Request::new(Method::Get, "/");
        assert!(RequestLogMiddleware.before(&req).is_none());
    }

    #[test]
    fn test_before_can_short_circuit() {
        let mut req = Request::new(Method::Get, "/");
        assert!(Gate.before(&req).is_none());
        req.headers.add("X-Blocked", "1").unwrap();
        let resp = Gate.before(&req).unwrap();
        assert_eq!(resp.status, StatusCode::FORBIDDEN);
    }
}
