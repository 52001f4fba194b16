//! Service orchestration: lifecycle, security validation, CORS, routing,
//! middleware, statistics.
//!
//! [`ServiceEngine`] is the component's top-level object. The host feeds
//! it parsed requests (or raw byte chunks via
//! [`handle_chunk`](ServiceEngine::handle_chunk)) and receives structured
//! responses; every failure class except handler errors is converted into
//! an error response rather than propagated.

use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{CorsConfig, EngineLimits, ServiceConfig};
use crate::error::{EngineError, HandlerError, SecurityError};
use crate::middleware::Middleware;
use crate::parser::{ParseMode, ParseStatus, RequestParser};
use crate::request::{request_to_string, Method, Request};
use crate::response::{
    self, health_response, not_found_response, text_response, Response, ResponseBuilder,
};
use crate::router::{Builtin, Handler, HandlerRef, RouteInfo, Router};
use crate::static_assets::{StaticAsset, StaticAssets};

/// Engine lifecycle states.
///
/// `new` yields `Uninitialized`; `init` moves to `Initialized`; `start`
/// and `stop` toggle `Running`/`Stopped`. Routes, statistics, and
/// configuration survive a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

/// Cumulative request statistics.
///
/// `average_response_time_ms` is an online mean over all requests that
/// reached the main handling path. `uptime_seconds` counts from the last
/// `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: u32,
    pub uptime_seconds: u64,
}

/// Pluggable error responder: receives the request, the status the engine
/// chose, and a message, and produces the error response.
pub type ErrorHandler =
    Arc<dyn Fn(&Request, StatusCode, &str) -> Result<Response, HandlerError> + Send + Sync>;

/// The request-processing engine.
pub struct ServiceEngine {
    state: LifecycleState,
    config: ServiceConfig,
    limits: EngineLimits,
    stats: ServiceStats,
    started_at: Option<Instant>,
    parser: RequestParser,
    router: Router,
    middlewares: Vec<Arc<dyn Middleware>>,
    cors: Option<CorsConfig>,
    csp_policy: Option<String>,
    require_https: bool,
    enable_security_headers: bool,
    enable_request_logging: bool,
    static_assets: StaticAssets,
    error_handler: Option<ErrorHandler>,
}

impl Default for ServiceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceEngine {
    /// Create an uninitialized engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default(), EngineLimits::default())
    }

    /// Create an engine with explicit configuration and parser limits.
    #[must_use]
    pub fn with_config(config: ServiceConfig, limits: EngineLimits) -> Self {
        let parser = RequestParser::with_config(ParseMode::Lenient, limits.clone());
        Self {
            state: LifecycleState::Uninitialized,
            config,
            limits,
            stats: ServiceStats::default(),
            started_at: None,
            parser,
            router: Router::new(),
            middlewares: Vec::new(),
            cors: None,
            csp_policy: None,
            require_https: false,
            enable_security_headers: false,
            enable_request_logging: false,
            static_assets: StaticAssets::new(),
            error_handler: None,
        }
    }

    /// Apply configuration (when given) and install the default routes:
    /// `GET /health` and `GET /echo`.
    pub fn init(&mut self, config: Option<ServiceConfig>) {
        if let Some(config) = config {
            self.config = config;
        }
        if self.state == LifecycleState::Uninitialized {
            self.router
                .add_route(Method::Get, "/health", HandlerRef::Builtin(Builtin::Health));
            self.router
                .add_route(Method::Get, "/echo", HandlerRef::Builtin(Builtin::Echo));
        }
        self.state = LifecycleState::Initialized;
        info!(name = %self.config.name, version = %self.config.version, "engine initialized");
    }

    /// Begin serving: resets statistics and starts the uptime clock.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotInitialized`] before `init`.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state == LifecycleState::Uninitialized {
            return Err(EngineError::NotInitialized);
        }
        self.state = LifecycleState::Running;
        self.started_at = Some(Instant::now());
        self.stats = ServiceStats::default();
        info!(name = %self.config.name, "engine started");
        Ok(())
    }

    /// Stop serving. Routes, configuration, and statistics are retained;
    /// `start` resumes (and resets statistics).
    pub fn stop(&mut self) {
        if self.state == LifecycleState::Running {
            self.state = LifecycleState::Stopped;
            info!(name = %self.config.name, "engine stopped");
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// `true` when the engine is initialized and running.
    #[must_use]
    pub fn health_check(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// Active service configuration.
    #[must_use]
    pub fn get_config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Statistics snapshot with up-to-date uptime.
    #[must_use]
    pub fn get_stats(&self) -> ServiceStats {
        let mut stats = self.stats;
        if let Some(started_at) = self.started_at {
            stats.uptime_seconds = started_at.elapsed().as_secs();
        }
        stats
    }

    /// Zero all counters. The uptime clock keeps running.
    pub fn reset_stats(&mut self) {
        self.stats = ServiceStats::default();
    }

    // Configuration surface

    /// Register a handler for a method and wildcard pattern. The newest
    /// registration wins when patterns overlap.
    pub fn add_route<H>(&mut self, method: Method, pattern: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        self.router.add_handler(method, pattern, handler);
    }

    /// Remove the most recently registered route with this exact method
    /// and pattern.
    pub fn remove_route(&mut self, method: Method, pattern: &str) -> bool {
        self.router.remove_route(method, pattern)
    }

    /// All registered routes in registration order.
    #[must_use]
    pub fn list_routes(&self) -> Vec<RouteInfo> {
        self.router.list_routes()
    }

    /// Append a middleware stage. `before` hooks run in registration
    /// order, `after` hooks in reverse.
    pub fn add_middleware<M>(&mut self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Enable CORS handling with the given policy.
    pub fn configure_cors(&mut self, cors: CorsConfig) {
        self.cors = Some(cors);
    }

    /// Replace the default error responder.
    pub fn set_error_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Request, StatusCode, &str) -> Result<Response, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
    }

    /// Require `X-Forwarded-Proto: https` on every request.
    pub fn set_require_https(&mut self, require: bool) {
        self.require_https = require;
    }

    /// Stamp the standard security headers on successful responses.
    pub fn enable_security_headers(&mut self, enable: bool) {
        self.enable_security_headers = enable;
    }

    /// Send a `Content-Security-Policy` alongside the security headers.
    pub fn set_csp_policy(&mut self, policy: impl Into<String>) {
        self.csp_policy = Some(policy.into());
    }

    /// Toggle per-request logging.
    pub fn enable_logging(&mut self, enable: bool) {
        self.enable_request_logging = enable;
    }

    /// Change the method-token policy for subsequent parses. Discards any
    /// partially parsed message.
    pub fn set_parse_mode(&mut self, mode: ParseMode) {
        self.parser = RequestParser::with_config(mode, self.limits.clone());
    }

    /// Register a static asset served when no route matches.
    pub fn add_static_asset(&mut self, path: &str, content: Vec<u8>) -> bool {
        self.static_assets.add(path, content)
    }

    /// Parser limits in effect.
    #[must_use]
    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    // Request handling

    /// Feed raw request bytes from the host transport.
    ///
    /// Returns `Ok(None)` while the request is incomplete, `Ok(Some)` with
    /// the response once it parses (or a `400 Bad Request` when parsing
    /// fails), and resets the parser for the next message either way.
    ///
    /// # Errors
    ///
    /// Propagates a handler's [`HandlerError`] unchanged.
    pub fn handle_chunk(&mut self, data: &[u8]) -> Result<Option<Response>, HandlerError> {
        match self.parser.feed(data) {
            ParseStatus::NeedMoreData => Ok(None),
            ParseStatus::Complete => {
                // take_request on a complete parser always yields a value.
                match self.parser.take_request() {
                    Some(request) => self.handle_request(&request).map(Some),
                    None => Ok(None),
                }
            }
            ParseStatus::Error => {
                let message = self
                    .parser
                    .error()
                    .map_or_else(|| "parse error".to_string(), ToString::to_string);
                warn!(error = %message, "rejecting unparseable request");
                self.parser.reset();
                Ok(Some(response::bad_request_response(&message)?))
            }
        }
    }

    /// Process one parsed request through the full pipeline.
    ///
    /// Order: statistics, request logging, security validation (failure
    /// becomes `403`), CORS preflight short-circuit for OPTIONS, route
    /// lookup, static-asset fallback, `404`, middleware chain around the
    /// handler, then CORS and security headers on success.
    ///
    /// Not gated on the lifecycle state: a stopped engine still answers,
    /// only `health_check` and the built-in health route observe the
    /// difference.
    ///
    /// # Errors
    ///
    /// Only a handler's own [`HandlerError`] propagates; security and
    /// routing failures are returned as `Ok` error responses.
    pub fn handle_request(&mut self, request: &Request) -> Result<Response, HandlerError> {
        let start = Instant::now();
        self.stats.total_requests += 1;

        if self.enable_request_logging {
            info!(method = %request.method, path = %request.path, "request received");
        }

        if let Err(violation) = self.validate_security(request) {
            warn!(
                method = %request.method,
                path = %request.path,
                violation = %violation,
                "request failed security validation"
            );
            self.stats.failed_requests += 1;
            return self.error_response(
                request,
                StatusCode::FORBIDDEN,
                "Request failed security validation",
            );
        }

        if request.method == Method::Options && self.cors.is_some() {
            let result = self.preflight_response(request);
            match &result {
                Ok(_) => self.stats.successful_requests += 1,
                Err(_) => self.stats.failed_requests += 1,
            }
            self.record_duration(start);
            return result;
        }

        let handler = match self.router.find_route(request.method, &request.path) {
            Some(route) => route.handler.clone(),
            None => {
                if let Some(asset) = self.static_assets.lookup(&request.path).cloned() {
                    let mut resp = self.asset_response(&asset)?;
                    if self.enable_security_headers {
                        self.stamp_security_headers(&mut resp)?;
                    }
                    self.stats.successful_requests += 1;
                    self.record_duration(start);
                    return Ok(resp);
                }
                self.stats.failed_requests += 1;
                return self.error_response(request, StatusCode::NOT_FOUND, "Route not found");
            }
        };

        let result = self.run_chain(request, &handler, start);
        match result {
            Ok(mut resp) => {
                self.stats.successful_requests += 1;
                if self.cors.is_some() {
                    self.stamp_cors_headers(request, &mut resp)?;
                }
                if self.enable_security_headers {
                    self.stamp_security_headers(&mut resp)?;
                }
                self.record_duration(start);
                if self.enable_request_logging {
                    info!(
                        method = %request.method,
                        path = %request.path,
                        status = resp.status.as_u16(),
                        "request completed"
                    );
                }
                Ok(resp)
            }
            Err(err) => {
                self.stats.failed_requests += 1;
                self.record_duration(start);
                Err(err)
            }
        }
    }

    fn validate_security(&self, request: &Request) -> Result<(), SecurityError> {
        if self.require_https
            && request.header("X-Forwarded-Proto") != Some("https")
        {
            return Err(SecurityError::HttpsRequired);
        }
        if request.body_size() > self.config.max_request_size {
            return Err(SecurityError::RequestTooLarge);
        }
        // HTTP/1.1 requires Host.
        if !request.headers.contains("Host") {
            return Err(SecurityError::MissingHostHeader);
        }
        Ok(())
    }

    /// Middleware chain around the handler: `before` hooks in order (any
    /// may short-circuit), the handler, then `after` hooks in reverse.
    fn run_chain(
        &self,
        request: &Request,
        handler: &HandlerRef,
        start: Instant,
    ) -> Result<Response, HandlerError> {
        let mut response = None;
        for middleware in &self.middlewares {
            if let Some(short_circuit) = middleware.before(request) {
                debug!(path = %request.path, "middleware short-circuited request");
                response = Some(short_circuit);
                break;
            }
        }
        let mut response = match response {
            Some(response) => response,
            None => self.invoke(request, handler)?,
        };
        let latency = start.elapsed();
        for middleware in self.middlewares.iter().rev() {
            middleware.after(request, &mut response, latency);
        }
        Ok(response)
    }

    fn invoke(&self, request: &Request, handler: &HandlerRef) -> Result<Response, HandlerError> {
        match handler {
            HandlerRef::Custom(handler) => handler.handle(request),
            HandlerRef::Builtin(Builtin::NotFound) => Ok(not_found_response()?),
            HandlerRef::Builtin(Builtin::Health) => {
                let healthy = self.health_check();
                let details = if healthy {
                    "Service is running"
                } else {
                    "Service unavailable"
                };
                Ok(health_response(healthy, details)?)
            }
            HandlerRef::Builtin(Builtin::Echo) => {
                Ok(text_response(StatusCode::OK, &request_to_string(request))?)
            }
        }
    }

    /// 204 preflight answer plus the general CORS headers.
    fn preflight_response(&self, request: &Request) -> Result<Response, HandlerError> {
        // cors.is_some() checked by the caller
        let Some(cors) = &self.cors else {
            return self.error_response(request, StatusCode::NOT_FOUND, "CORS not configured");
        };
        let mut builder = ResponseBuilder::new();
        builder.set_status(StatusCode::NO_CONTENT);
        if let Some(origin) = request.header("Origin") {
            if let Some(value) = cors.allow_origin_value(origin) {
                builder.add_header("Access-Control-Allow-Origin", value)?;
            }
        }
        builder.add_header("Access-Control-Allow-Methods", cors.methods_header())?;
        builder.add_header("Access-Control-Allow-Headers", cors.headers_header())?;
        if cors.allow_credentials {
            builder.add_header("Access-Control-Allow-Credentials", "true")?;
        }
        builder.add_header("Access-Control-Max-Age", cors.max_age_seconds.to_string())?;
        builder.finalize()?;
        Ok(builder.into_response())
    }

    /// Stamp `Access-Control-Allow-Origin` (and credentials) on an
    /// ordinary response, replacing rather than duplicating.
    fn stamp_cors_headers(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), HandlerError> {
        let Some(cors) = &self.cors else {
            return Ok(());
        };
        if let Some(origin) = request.header("Origin") {
            if let Some(value) = cors.allow_origin_value(origin) {
                response
                    .headers
                    .update_or_add("Access-Control-Allow-Origin", value)?;
            }
        }
        if cors.allow_credentials {
            response
                .headers
                .update_or_add("Access-Control-Allow-Credentials", "true")?;
        }
        Ok(())
    }

    fn stamp_security_headers(&self, response: &mut Response) -> Result<(), HandlerError> {
        let headers = &mut response.headers;
        headers.update_or_add("X-Content-Type-Options", "nosniff")?;
        headers.update_or_add("X-Frame-Options", "DENY")?;
        headers.update_or_add("X-XSS-Protection", "1; mode=block")?;
        headers.update_or_add("Referrer-Policy", "strict-origin-when-cross-origin")?;
        if let Some(policy) = &self.csp_policy {
            headers.update_or_add("Content-Security-Policy", policy.clone())?;
        }
        Ok(())
    }

    fn asset_response(&self, asset: &StaticAsset) -> Result<Response, HandlerError> {
        let mut builder = ResponseBuilder::new();
        builder.set_binary(&asset.content, Some(asset.content_type))?;
        builder.finalize()?;
        Ok(builder.into_response())
    }

    /// Route through the custom error handler when set, else the default
    /// HTML error page.
    fn error_response(
        &self,
        request: &Request,
        status: StatusCode,
        message: &str,
    ) -> Result<Response, HandlerError> {
        if let Some(handler) = &self.error_handler {
            return handler(request, status, message);
        }
        let mut builder = ResponseBuilder::new();
        builder.set_error_message(status, message)?;
        builder.finalize()?;
        Ok(builder.into_response())
    }

    fn record_duration(&mut self, start: Instant) {
        let duration_ms = start.elapsed().as_millis() as u64;
        let total = self.stats.total_requests;
        // Online mean; total was already incremented for this request.
        self.stats.average_response_time_ms =
            (((u64::from(self.stats.average_response_time_ms) * (total - 1)) + duration_ms)
                / total) as u32;
    }
}
