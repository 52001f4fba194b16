//! Ownership-safe string and byte helpers shared by the parser, router,
//! and response builder: case-insensitive comparison, trimming, URL
//! percent-coding, query-string parsing, and MIME-type lookup.

use crate::headers::Header;

/// Case-insensitive ASCII equality, the comparison used for header names
/// everywhere in this crate.
#[inline]
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Trim ASCII whitespace from both ends of a header token.
#[inline]
#[must_use]
pub fn trim_whitespace(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Percent-decode a URL component. `+` decodes to a space, as in query
/// strings; malformed escapes are passed through unchanged.
#[must_use]
pub fn url_decode(encoded: &str) -> String {
    // Decode '+' first so form-style queries round-trip; percent escapes
    // are handled by the urlencoding crate.
    let plus_decoded = encoded.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(|c| c.into_owned())
        .unwrap_or(plus_decoded)
}

/// Percent-encode a string for use in a URL component.
///
/// Unreserved characters (`A-Z a-z 0-9 - _ . ~`) pass through; everything
/// else becomes `%XX`.
#[must_use]
pub fn url_encode(decoded: &str) -> String {
    urlencoding::encode(decoded).into_owned()
}

/// Parse a query string (the part after `?`) into ordered name/value pairs.
///
/// Splits on `&`, then at the first `=`; both sides are URL-decoded.
/// Pairs without an `=` are skipped, matching the reference behavior.
/// Duplicate names are preserved in order.
#[must_use]
pub fn parse_query_string(query: &str) -> Vec<Header> {
    query
        .split('&')
        .filter(|pair| pair.contains('='))
        .flat_map(|pair| url::form_urlencoded::parse(pair.as_bytes()))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| Header::new(name.into_owned(), value.into_owned()))
        .collect()
}

/// Look up a MIME type by file extension (without the leading dot).
///
/// Unknown extensions resolve to `application/octet-stream`.
#[must_use]
pub fn get_content_type(file_extension: &str) -> &'static str {
    match file_extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Whether a Content-Type value denotes a JSON payload.
#[inline]
#[must_use]
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type.contains("application/json")
}

/// Whether a Content-Type value denotes a form payload (urlencoded or
/// multipart).
#[inline]
#[must_use]
pub fn is_form_content_type(content_type: &str) -> bool {
    content_type.contains("application/x-www-form-urlencoded")
        || content_type.contains("multipart/form-data")
}

/// Whether a Content-Type value denotes a textual payload.
#[must_use]
pub fn is_text_content_type(content_type: &str) -> bool {
    content_type.contains("text/")
        || is_json_content_type(content_type)
        || content_type.contains("application/xml")
}

/// Validate a request path: must start with `/` and contain only path
/// characters (alphanumeric, `/ - _ . ~ *`).
#[must_use]
pub fn is_valid_path(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    path.bytes().all(|b| {
        b.is_ascii_alphanumeric() || matches!(b, b'/' | b'-' | b'_' | b'.' | b'~' | b'*')
    })
}

/// Validate a header name: non-empty, alphanumeric plus `-` and `_`.
#[must_use]
pub fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Validate a header value: no control characters except horizontal tab.
#[must_use]
pub fn is_valid_header_value(value: &str) -> bool {
    value.bytes().all(|b| !b.is_ascii_control() || b == b'\t')
}
