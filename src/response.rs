//! Structured HTTP response and the builder that assembles it.
//!
//! The engine produces a [`Response`]; serializing it to wire bytes is the
//! host transport's job.

use std::time::SystemTime;

use http::StatusCode;

use crate::error::HeaderError;
use crate::headers::HeaderStore;
use crate::util;

/// Server header value stamped by [`ResponseBuilder::finalize`] when the
/// caller has not set one.
pub const SERVER_HEADER: &str = concat!("wasmgate/", env!("CARGO_PKG_VERSION"));

/// Reason phrase for a status code, for error pages and status lines.
#[inline]
#[must_use]
pub fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// A structured HTTP response: status, ordered headers, optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderStore,
    pub body: Option<Vec<u8>>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderStore::new(),
            body: None,
        }
    }
}

impl Response {
    /// Body length in bytes (0 when absent).
    #[inline]
    #[must_use]
    pub fn body_size(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// First value of a header, case-insensitively.
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.find(name)
    }
}

/// Optional attributes for [`ResponseBuilder::add_cookie`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: Option<String>,
    pub domain: Option<String>,
    /// `Max-Age` in seconds; negative values omit the attribute.
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

/// Accumulates status, headers, and body into a [`Response`].
///
/// Typed setters (`set_json`, `set_html`, ...) set the body and the
/// matching `Content-Type` in one step. [`finalize`](Self::finalize) fills
/// in `Content-Length`, `Date`, and `Server` when absent and is idempotent.
///
/// The automatic-header flags default to on; disabling
/// `auto_content_type` makes the typed setters leave `Content-Type` to the
/// caller.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    response: Response,
    auto_content_length: bool,
    auto_date_header: bool,
    auto_content_type: bool,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    /// Create a builder for a `200 OK` response with no headers or body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            response: Response::default(),
            auto_content_length: true,
            auto_date_header: true,
            auto_content_type: true,
        }
    }

    /// Reset to a fresh `200 OK` response, keeping the flag configuration.
    pub fn reset(&mut self) {
        self.response = Response::default();
    }

    /// Configure which headers `finalize` and the typed setters manage
    /// automatically.
    pub fn set_auto_headers(
        &mut self,
        content_length: bool,
        date: bool,
        content_type: bool,
    ) -> &mut Self {
        self.auto_content_length = content_length;
        self.auto_date_header = date;
        self.auto_content_type = content_type;
        self
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.response.status = status;
        self
    }

    /// Append a header (duplicates permitted).
    pub fn add_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self, HeaderError> {
        self.response.headers.add(name, value)?;
        Ok(self)
    }

    /// Remove the first header with this name.
    pub fn remove_header(&mut self, name: &str) -> bool {
        self.response.headers.remove(name)
    }

    /// Replace the response body with raw bytes. An empty slice clears it.
    pub fn set_body(&mut self, body: &[u8]) -> &mut Self {
        self.response.body = if body.is_empty() {
            None
        } else {
            Some(body.to_vec())
        };
        self
    }

    /// Append raw bytes to the body.
    pub fn append_body(&mut self, data: &[u8]) -> &mut Self {
        if !data.is_empty() {
            self.response
                .body
                .get_or_insert_with(Vec::new)
                .extend_from_slice(data);
        }
        self
    }

    fn set_typed_body(&mut self, body: &[u8], content_type: &str) -> Result<&mut Self, HeaderError> {
        self.set_body(body);
        if self.auto_content_type {
            self.response
                .headers
                .update_or_add("Content-Type", content_type)?;
        }
        Ok(self)
    }

    /// Set a JSON body and `Content-Type: application/json`.
    pub fn set_json(&mut self, json: &str) -> Result<&mut Self, HeaderError> {
        self.set_typed_body(json.as_bytes(), "application/json; charset=utf-8")
    }

    /// Serialize a value with `serde_json` and set it as the JSON body.
    pub fn set_json_value(&mut self, value: &serde_json::Value) -> Result<&mut Self, HeaderError> {
        self.set_typed_body(
            value.to_string().as_bytes(),
            "application/json; charset=utf-8",
        )
    }

    /// Set an HTML body and `Content-Type: text/html`.
    pub fn set_html(&mut self, html: &str) -> Result<&mut Self, HeaderError> {
        self.set_typed_body(html.as_bytes(), "text/html; charset=utf-8")
    }

    /// Set a plain-text body and `Content-Type: text/plain`.
    pub fn set_text(&mut self, text: &str) -> Result<&mut Self, HeaderError> {
        self.set_typed_body(text.as_bytes(), "text/plain; charset=utf-8")
    }

    /// Set an XML body and `Content-Type: application/xml`.
    pub fn set_xml(&mut self, xml: &str) -> Result<&mut Self, HeaderError> {
        self.set_typed_body(xml.as_bytes(), "application/xml; charset=utf-8")
    }

    /// Set a binary body with an explicit content type
    /// (default `application/octet-stream`).
    pub fn set_binary(
        &mut self,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<&mut Self, HeaderError> {
        self.set_typed_body(data, content_type.unwrap_or("application/octet-stream"))
    }

    /// Set a redirect: `301 Moved Permanently` or `302 Found` plus a
    /// `Location` header.
    pub fn redirect(&mut self, location: &str, permanent: bool) -> Result<&mut Self, HeaderError> {
        self.set_status(if permanent {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::FOUND
        });
        self.add_header("Location", location)
    }

    /// Set an error response using the status's reason phrase as message.
    pub fn set_error(&mut self, status: StatusCode) -> Result<&mut Self, HeaderError> {
        let message = status_reason(status).to_string();
        self.set_error_message(status, &message)
    }

    /// Set an error response with a minimal HTML page embedding the numeric
    /// status, reason phrase, and message.
    pub fn set_error_message(
        &mut self,
        status: StatusCode,
        message: &str,
    ) -> Result<&mut Self, HeaderError> {
        self.set_status(status);
        let reason = status_reason(status);
        let code = status.as_u16();
        let html = format!(
            "<!DOCTYPE html>\n\
             <html><head><title>{code} {reason}</title></head>\n\
             <body><h1>{code} {reason}</h1><p>{message}</p></body></html>"
        );
        self.set_html(&html)
    }

    /// Set an error response with a `{"error": {...}}` JSON body instead of
    /// an HTML page.
    pub fn set_error_json(
        &mut self,
        status: StatusCode,
        error_code: &str,
        message: &str,
    ) -> Result<&mut Self, HeaderError> {
        self.set_status(status);
        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16(),
            }
        });
        self.set_json_value(&body)
    }

    /// Append a `Set-Cookie` header with a percent-encoded value and the
    /// given attributes.
    pub fn add_cookie(
        &mut self,
        name: &str,
        value: &str,
        attrs: &CookieAttributes,
    ) -> Result<&mut Self, HeaderError> {
        let mut cookie = format!("{}={}", name, util::url_encode(value));
        if let Some(path) = &attrs.path {
            cookie.push_str("; Path=");
            cookie.push_str(path);
        }
        if let Some(domain) = &attrs.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        if let Some(max_age) = attrs.max_age {
            if max_age >= 0 {
                cookie.push_str("; Max-Age=");
                cookie.push_str(&max_age.to_string());
            }
        }
        if attrs.secure {
            cookie.push_str("; Secure");
        }
        if attrs.http_only {
            cookie.push_str("; HttpOnly");
        }
        self.add_header("Set-Cookie", cookie)
    }

    /// Delete a cookie by setting it to an empty value with `Max-Age=0`.
    pub fn delete_cookie(
        &mut self,
        name: &str,
        path: Option<&str>,
        domain: Option<&str>,
    ) -> Result<&mut Self, HeaderError> {
        let attrs = CookieAttributes {
            path: path.map(str::to_string),
            domain: domain.map(str::to_string),
            max_age: Some(0),
            ..CookieAttributes::default()
        };
        self.add_cookie(name, "", &attrs)
    }

    /// Add a `Cache-Control` header.
    pub fn set_cache_control(&mut self, directive: &str) -> Result<&mut Self, HeaderError> {
        self.add_header("Cache-Control", directive)
    }

    /// Add an `Expires` header in RFC 7231 date form.
    pub fn set_expires(&mut self, expires: SystemTime) -> Result<&mut Self, HeaderError> {
        self.add_header("Expires", httpdate::fmt_http_date(expires))
    }

    /// Add an `ETag` header, optionally weak (`W/"..."`).
    pub fn set_etag(&mut self, etag: &str, weak: bool) -> Result<&mut Self, HeaderError> {
        let prefix = if weak { "W/" } else { "" };
        self.add_header("ETag", format!("{prefix}\"{etag}\""))
    }

    /// Add the standard security headers: `X-Content-Type-Options`,
    /// `X-Frame-Options`, `X-XSS-Protection`, `Referrer-Policy`.
    pub fn set_security_headers(&mut self) -> Result<&mut Self, HeaderError> {
        self.add_header("X-Content-Type-Options", "nosniff")?;
        self.add_header("X-Frame-Options", "DENY")?;
        self.add_header("X-XSS-Protection", "1; mode=block")?;
        self.add_header("Referrer-Policy", "strict-origin-when-cross-origin")
    }

    /// Add a `Content-Security-Policy` header.
    pub fn set_csp(&mut self, policy: &str) -> Result<&mut Self, HeaderError> {
        self.add_header("Content-Security-Policy", policy)
    }

    /// Fill in the automatic headers when absent: `Content-Length`
    /// (computed from the body size at call time), `Date`, and `Server`.
    ///
    /// Idempotent: a second call on an unmodified builder adds nothing.
    /// Mutating the body after `finalize` leaves `Content-Length` stale;
    /// finalize last.
    pub fn finalize(&mut self) -> Result<&mut Self, HeaderError> {
        if self.auto_content_length && !self.response.headers.contains("Content-Length") {
            let len = self.response.body_size().to_string();
            self.response.headers.add("Content-Length", len)?;
        }
        if self.auto_date_header && !self.response.headers.contains("Date") {
            self.response
                .headers
                .add("Date", httpdate::fmt_http_date(SystemTime::now()))?;
        }
        if !self.response.headers.contains("Server") {
            self.response.headers.add("Server", SERVER_HEADER)?;
        }
        Ok(self)
    }

    /// Borrow the in-progress response.
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Deep-copy the in-progress response: status, headers, and body share
    /// no state with the builder.
    #[must_use]
    pub fn build(&self) -> Response {
        self.response.clone()
    }

    /// Consume the builder, yielding the response without a copy.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Build a finalized `200 OK` JSON response.
pub fn json_response(json: &str) -> Result<Response, HeaderError> {
    let mut builder = ResponseBuilder::new();
    builder.set_json(json)?.finalize()?;
    Ok(builder.into_response())
}

/// Build a finalized `404 Not Found` HTML error page.
pub fn not_found_response() -> Result<Response, HeaderError> {
    let mut builder = ResponseBuilder::new();
    builder.set_error(StatusCode::NOT_FOUND)?.finalize()?;
    Ok(builder.into_response())
}

/// Build a finalized `500 Internal Server Error` page with a message.
pub fn server_error_response(message: &str) -> Result<Response, HeaderError> {
    let mut builder = ResponseBuilder::new();
    builder
        .set_error_message(StatusCode::INTERNAL_SERVER_ERROR, message)?
        .finalize()?;
    Ok(builder.into_response())
}

/// Build a finalized `400 Bad Request` page with a message.
pub fn bad_request_response(message: &str) -> Result<Response, HeaderError> {
    let mut builder = ResponseBuilder::new();
    builder
        .set_error_message(StatusCode::BAD_REQUEST, message)?
        .finalize()?;
    Ok(builder.into_response())
}

/// Build a finalized plain-text response with an arbitrary status.
pub fn text_response(status: StatusCode, text: &str) -> Result<Response, HeaderError> {
    let mut builder = ResponseBuilder::new();
    builder.set_status(status);
    builder.set_text(text)?.finalize()?;
    Ok(builder.into_response())
}

/// Build a finalized health-check response: `200` with
/// `{"status":"healthy",...}` or `503` with `{"status":"unhealthy",...}`.
pub fn health_response(healthy: bool, details: &str) -> Result<Response, HeaderError> {
    let mut builder = ResponseBuilder::new();
    let body = serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "details": details,
    });
    if !healthy {
        builder.set_status(StatusCode::SERVICE_UNAVAILABLE);
    }
    builder.set_json_value(&body)?.finalize()?;
    Ok(builder.into_response())
}
