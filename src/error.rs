//! Error taxonomy for the engine.
//!
//! Parse failures are captured inside the parser and surfaced through its
//! tri-state result; they never unwind. Security and routing failures are
//! converted into ordinary 403/404 responses at the engine layer. Only
//! handler failures propagate to the host as `Err`.

use thiserror::Error;

/// Errors produced while parsing an HTTP/1.1 request from byte chunks.
///
/// Once the parser reports one of these it is in a terminal `Error` state
/// and must be reset before being fed again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Method token is not one of the recognized seven.
    ///
    /// Only produced in [`ParseMode::Strict`](crate::parser::ParseMode);
    /// lenient mode tolerates unknown tokens by defaulting to GET.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    /// Version string is not exactly `HTTP/1.0`, `HTTP/1.1`, or `HTTP/2.0`.
    #[error("invalid HTTP version: {0}")]
    InvalidVersion(String),
    /// `Content-Length` header value is not a parseable non-negative integer.
    #[error("invalid Content-Length")]
    InvalidContentLength,
    /// Buffered header data exceeded the configured maximum.
    #[error("header too large")]
    HeaderTooLarge,
    /// Declared body size exceeds the configured maximum.
    ///
    /// Detected at the Content-Length parsing step, before any body buffer
    /// is allocated.
    #[error("body too large: {0} bytes")]
    BodyTooLarge(usize),
    /// A header line contained no `:` separator.
    #[error("malformed header line: {0}")]
    MalformedHeaderLine(String),
    /// Header or parameter storage hit its hard count ceiling.
    #[error(transparent)]
    Header(#[from] HeaderError),
}

/// Recoverable failures from [`HeaderStore`](crate::headers::HeaderStore)
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Adding another header would exceed the configured count ceiling.
    #[error("maximum header count exceeded ({0})")]
    LimitExceeded(usize),
}

/// Security validation failures, converted to `403 Forbidden` responses by
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
    /// HTTPS is required but `X-Forwarded-Proto: https` was absent.
    #[error("HTTPS required")]
    HttpsRequired,
    /// Request body exceeds the configured `max_request_size`.
    #[error("request body exceeds maximum size")]
    RequestTooLarge,
    /// The `Host` header is missing (required by HTTP/1.1).
    #[error("missing Host header")]
    MissingHostHeader,
}

/// Routing failures, converted to `404 Not Found` responses by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No registered route matched the request method and path.
    #[error("no route matched {0}")]
    NoMatch(String),
}

/// Opaque failure from a route handler.
///
/// This is the only error the host sees from
/// [`handle_request`](crate::engine::ServiceEngine::handle_request); every
/// other failure class becomes a structured error response instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    /// Human-readable failure description.
    pub message: String,
}

impl HandlerError {
    /// Create a handler error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<HeaderError> for HandlerError {
    fn from(err: HeaderError) -> Self {
        Self::new(err.to_string())
    }
}

/// Invalid CORS configuration detected at build time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorsConfigError {
    /// Wildcard origin combined with credentials is forbidden by the CORS
    /// specification.
    #[error("wildcard origin '*' cannot be combined with allow_credentials")]
    WildcardWithCredentials,
}

/// Engine lifecycle misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start()` was called before `init()`.
    #[error("engine not initialized")]
    NotInitialized,
    /// Configuration could not be deserialized.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
