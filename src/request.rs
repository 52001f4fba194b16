//! Structured HTTP request type and the method vocabulary the component
//! boundary transmits.

use serde::{Deserialize, Serialize};

use crate::headers::HeaderStore;
use crate::util;

/// The HTTP methods this engine recognizes.
///
/// A closed enum rather than an open method type because the component
/// boundary transmits methods as a seven-variant tag, and because unknown
/// tokens have an explicit (configurable) decode policy — see
/// [`Method::from_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Decode a method token case-insensitively.
    ///
    /// Returns `None` for unrecognized tokens; the parser's lenient mode
    /// maps `None` to `Get` (the observed reference behavior) while strict
    /// mode rejects the request.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("GET") {
            Some(Method::Get)
        } else if token.eq_ignore_ascii_case("POST") {
            Some(Method::Post)
        } else if token.eq_ignore_ascii_case("PUT") {
            Some(Method::Put)
        } else if token.eq_ignore_ascii_case("DELETE") {
            Some(Method::Delete)
        } else if token.eq_ignore_ascii_case("PATCH") {
            Some(Method::Patch)
        } else if token.eq_ignore_ascii_case("HEAD") {
            Some(Method::Head)
        } else if token.eq_ignore_ascii_case("OPTIONS") {
            Some(Method::Options)
        } else {
            None
        }
    }

    /// The canonical upper-case token for this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parsed HTTP request.
///
/// Built incrementally by [`RequestParser`](crate::parser::RequestParser);
/// immutable once parsing reaches `Complete`. `path` excludes the query
/// string (split at the first `?`).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// Raw query string (text after the first `?`), if any.
    pub query: Option<String>,
    /// Headers in wire order.
    pub headers: HeaderStore,
    /// Request body, present when a non-zero `Content-Length` was declared.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Create a bodyless request, mainly for tests and built-in handlers.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderStore::new(),
            body: None,
        }
    }

    /// First value of a header, case-insensitively.
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.find(name)
    }

    /// Body length in bytes (0 when absent).
    #[inline]
    #[must_use]
    pub fn body_size(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// Whether the request declares a JSON content type.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.header("Content-Type")
            .is_some_and(util::is_json_content_type)
    }

    /// Whether the request declares a form content type (urlencoded or
    /// multipart).
    #[must_use]
    pub fn is_form(&self) -> bool {
        self.header("Content-Type")
            .is_some_and(util::is_form_content_type)
    }

    /// Body as a UTF-8 string, only when the content type is JSON.
    #[must_use]
    pub fn json_body_str(&self) -> Option<&str> {
        if !self.is_json() {
            return None;
        }
        self.body
            .as_deref()
            .filter(|b| !b.is_empty())
            .and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Body parsed as JSON, when the content type and payload allow it.
    #[must_use]
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.json_body_str()
            .and_then(|s| serde_json::from_str(s).ok())
    }
}

/// Render a request back to HTTP/1.1 wire form.
///
/// The output is a valid request prefix: `METHOD SP PATH[?QUERY] SP
/// HTTP/1.1 CRLF`, each header on its own CRLF-terminated line, a blank
/// line, then the raw body bytes rendered lossily as UTF-8. Reparsing the
/// output recovers the same method, path, query, and header sequence.
#[must_use]
pub fn request_to_string(request: &Request) -> String {
    let mut out = String::with_capacity(64 + request.body_size());
    out.push_str(request.method.as_str());
    out.push(' ');
    out.push_str(&request.path);
    if let Some(query) = &request.query {
        out.push('?');
        out.push_str(query);
    }
    out.push_str(" HTTP/1.1\r\n");
    for header in request.headers.iter() {
        out.push_str(&header.name);
        out.push_str(": ");
        out.push_str(&header.value);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    if let Some(body) = &request.body {
        out.push_str(&String::from_utf8_lossy(body));
    }
    out
}
