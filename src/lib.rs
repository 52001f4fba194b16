//! # wasmgate
//!
//! **wasmgate** is an embedded HTTP/1.1 request-processing engine for
//! sandboxed WebAssembly components.
//!
//! ## Overview
//!
//! The host owns the transport: it delivers raw request bytes (in chunks
//! of any size) and serializes the structured responses this crate
//! produces. Inside the sandbox there are no sockets, no threads, and no
//! filesystem; everything here is synchronous and allocation-bounded, so
//! the same engine runs identically under any component host.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`parser`]** - Resumable byte-chunk HTTP/1.1 parser
//! - **[`router`]** - Wildcard path matching and handler dispatch
//! - **[`response`]** - Response builder with typed bodies, cookies, and
//!   security headers
//! - **[`middleware`]** - Pluggable before/after stages around handlers
//! - **[`engine`]** - Service orchestration: lifecycle, security
//!   validation, CORS, statistics
//! - **[`static_assets`]** - In-memory static asset serving
//! - **[`config`]** - Service configuration, parser limits, CORS policy
//!
//! ## Example
//!
//! ```
//! use wasmgate::{HandlerError, Method, Request, Response, ServiceEngine, response};
//!
//! let mut engine = ServiceEngine::new();
//! engine.init(None);
//! engine.start().unwrap();
//! engine.add_route(
//!     Method::Get,
//!     "/hello/*",
//!     |_req: &Request| -> Result<Response, HandlerError> {
//!         Ok(response::json_response(r#"{"greeting":"hi"}"#)?)
//!     },
//! );
//!
//! let mut request = Request::new(Method::Get, "/hello/world");
//! request.headers.add("Host", "example.com").unwrap();
//! let resp = engine.handle_request(&request).unwrap();
//! assert_eq!(resp.status, wasmgate::StatusCode::OK);
//! ```
//!
//! Hosts that hand over raw bytes instead of parsed requests drive
//! [`ServiceEngine::handle_chunk`] and get `Ok(None)` until a full
//! message has arrived.

pub mod config;
pub mod engine;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod static_assets;
pub mod util;

pub use http::StatusCode;

pub use config::{CorsConfig, CorsConfigBuilder, EngineLimits, ServiceConfig};
pub use engine::{ErrorHandler, LifecycleState, ServiceEngine, ServiceStats};
pub use error::{
    CorsConfigError, EngineError, HandlerError, HeaderError, ParseError, RoutingError,
    SecurityError,
};
pub use headers::{Header, HeaderStore};
pub use middleware::{Middleware, RequestLogMiddleware};
pub use parser::{ParseMode, ParseStatus, RequestParser};
pub use request::{request_to_string, Method, Request};
pub use response::{Response, ResponseBuilder};
pub use router::{Handler, Router};
pub use static_assets::StaticAssets;
pub use util::{get_content_type, parse_query_string};

/// Whether a request declares a JSON content type.
#[must_use]
pub fn is_json_request(request: &Request) -> bool {
    request.is_json()
}

/// Whether a request declares a form content type (urlencoded or
/// multipart).
#[must_use]
pub fn is_form_request(request: &Request) -> bool {
    request.is_form()
}
