//! Service configuration, parser limits, and CORS policy.

use serde::{Deserialize, Serialize};

use crate::error::{CorsConfigError, EngineError};
use crate::request::Method;

/// Hard size ceiling on request bodies when no explicit limit is configured,
/// 1 MiB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Service identity and request-handling policy.
///
/// Deserializable from YAML via [`ServiceConfig::from_yaml`], mirroring a
/// `config.yaml` shipped next to the component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Human-readable service name.
    pub name: String,
    /// Service version string.
    pub version: String,
    /// Methods this service accepts; empty means all.
    pub supported_methods: Vec<Method>,
    /// Maximum accepted request body size in bytes, enforced by the
    /// engine's security validation.
    pub max_request_size: usize,
    /// Advisory request timeout in milliseconds. The engine does not
    /// enforce it (no clocks beyond `Instant` in the sandbox); it is
    /// surfaced to the host through `get_config`.
    pub timeout_ms: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "HTTP Service".to_string(),
            version: "1.0.0".to_string(),
            supported_methods: Vec::new(),
            max_request_size: DEFAULT_MAX_BODY_SIZE,
            timeout_ms: 30_000,
        }
    }
}

impl ServiceConfig {
    /// Create a config with the given identity and default policy.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Deserialize a config from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] when the document does not
    /// deserialize.
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        serde_yaml::from_str(yaml).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    /// Whether this config accepts the given method.
    #[must_use]
    pub fn supports_method(&self, method: Method) -> bool {
        self.supported_methods.is_empty() || self.supported_methods.contains(&method)
    }
}

/// Size ceilings applied while parsing a request.
///
/// Defaults match the reference component: 64 headers, 256-byte names,
/// 8 KiB values, 8 KiB parse scratch, 2 KiB paths, 4 KiB queries, 1 MiB
/// bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    /// Maximum number of headers per request.
    pub max_header_count: usize,
    /// Maximum length of a header name.
    pub max_header_name_length: usize,
    /// Maximum length of a header value.
    pub max_header_value_length: usize,
    /// Cap on the parser's scratch buffer; exceeding it while waiting for
    /// a delimiter fails the parse with `HeaderTooLarge`.
    pub max_header_size: usize,
    /// Maximum request path length.
    pub max_path_length: usize,
    /// Maximum query string length.
    pub max_query_length: usize,
    /// Maximum declared body size; checked against `Content-Length`
    /// before the body buffer is allocated.
    pub max_body_size: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_header_count: 64,
            max_header_name_length: 256,
            max_header_value_length: 8192,
            max_header_size: 8192,
            max_path_length: 2048,
            max_query_length: 4096,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Cross-origin resource sharing policy.
///
/// Built with [`CorsConfigBuilder`]; the engine applies it to preflight
/// OPTIONS requests and stamps response headers on ordinary requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to make cross-origin requests; `"*"` allows any.
    pub allowed_origins: Vec<String>,
    /// Methods advertised in `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<String>,
    /// Headers advertised in `Access-Control-Allow-Headers`.
    pub allowed_headers: Vec<String>,
    /// Whether `Access-Control-Allow-Credentials: true` is sent.
    pub allow_credentials: bool,
    /// `Access-Control-Max-Age` in seconds.
    pub max_age_seconds: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
            ],
            allow_credentials: false,
            max_age_seconds: 86_400,
        }
    }
}

impl CorsConfig {
    /// Start building a CORS policy.
    #[must_use]
    pub fn builder() -> CorsConfigBuilder {
        CorsConfigBuilder::new()
    }

    /// Whether the given `Origin` value is allowed by this policy.
    #[must_use]
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|o| o == "*" || o.eq_ignore_ascii_case(origin))
    }

    /// The `Access-Control-Allow-Origin` value for a request origin, or
    /// `None` when the origin is not allowed.
    ///
    /// Wildcard policies echo `*` unless credentials are enabled.
    #[must_use]
    pub fn allow_origin_value(&self, origin: &str) -> Option<String> {
        if !self.origin_allowed(origin) {
            return None;
        }
        if self.allowed_origins.iter().any(|o| o == "*") && !self.allow_credentials {
            Some("*".to_string())
        } else {
            Some(origin.to_string())
        }
    }

    /// Comma-joined `Access-Control-Allow-Methods` value.
    #[must_use]
    pub fn methods_header(&self) -> String {
        self.allowed_methods.join(", ")
    }

    /// Comma-joined `Access-Control-Allow-Headers` value.
    #[must_use]
    pub fn headers_header(&self) -> String {
        self.allowed_headers.join(", ")
    }
}

/// Fluent builder for [`CorsConfig`].
#[derive(Debug, Clone, Default)]
pub struct CorsConfigBuilder {
    origins: Vec<String>,
    methods: Vec<String>,
    headers: Vec<String>,
    allow_credentials: bool,
    max_age_seconds: Option<u32>,
}

impl CorsConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an allowed origin (`"*"` for any).
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.origins.push(origin.into());
        self
    }

    /// Add an allowed method token.
    #[must_use]
    pub fn allow_method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    /// Add an allowed request header.
    #[must_use]
    pub fn allow_header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    /// Send `Access-Control-Allow-Credentials: true`.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Set `Access-Control-Max-Age` in seconds.
    #[must_use]
    pub fn max_age_seconds(mut self, seconds: u32) -> Self {
        self.max_age_seconds = Some(seconds);
        self
    }

    /// Validate and produce the policy. Unset lists fall back to the
    /// defaults of [`CorsConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`CorsConfigError::WildcardWithCredentials`] when a `"*"`
    /// origin is combined with credentials, which the CORS specification
    /// forbids.
    pub fn build(self) -> Result<CorsConfig, CorsConfigError> {
        if self.allow_credentials && self.origins.iter().any(|o| o == "*") {
            return Err(CorsConfigError::WildcardWithCredentials);
        }
        let defaults = CorsConfig::default();
        Ok(CorsConfig {
            allowed_origins: if self.origins.is_empty() {
                defaults.allowed_origins
            } else {
                self.origins
            },
            allowed_methods: if self.methods.is_empty() {
                defaults.allowed_methods
            } else {
                self.methods
            },
            allowed_headers: if self.headers.is_empty() {
                defaults.allowed_headers
            } else {
                self.headers
            },
            allow_credentials: self.allow_credentials,
            max_age_seconds: self.max_age_seconds.unwrap_or(defaults.max_age_seconds),
        })
    }
}
