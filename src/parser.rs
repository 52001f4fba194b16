//! Incremental HTTP/1.1 request parser.
//!
//! The host delivers the request as byte chunks in arbitrary sizes; the
//! parser consumes them through a resumable state machine and yields a
//! [`Request`] once the message is complete. No I/O happens here.

use memchr::{memchr, memmem};
use tracing::{debug, trace};

use crate::config::EngineLimits;
use crate::error::ParseError;
use crate::headers::HeaderStore;
use crate::request::{Method, Request};

/// Policy for unrecognized method tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Unknown methods are tolerated and parsed as `GET`.
    #[default]
    Lenient,
    /// Unknown methods fail the parse with
    /// [`ParseError::InvalidMethod`].
    Strict,
}

/// Result of feeding bytes to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The message is incomplete; feed more bytes.
    NeedMoreData,
    /// A full request is available via
    /// [`request`](RequestParser::request).
    Complete,
    /// Parsing failed; see [`error`](RequestParser::error). Terminal
    /// until [`reset`](RequestParser::reset).
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Method,
    Path,
    Version,
    Headers,
    Body,
    Complete,
    Failed,
}

/// Chunk-fed HTTP/1.1 request parser.
///
/// States advance `Method → Path → Version → Headers → Body` and finish in
/// `Complete` or `Error`; both terminal states consume no further input.
/// Bytes not yet resolvable into a token are held in a scratch buffer
/// capped at [`EngineLimits::max_header_size`], so delimiters split across
/// chunk boundaries are found no matter where the split falls.
///
/// The body is read verbatim for exactly the declared `Content-Length`
/// bytes; absent or zero Content-Length completes the request at the blank
/// line. Chunked transfer-encoding is not supported.
#[derive(Debug)]
pub struct RequestParser {
    state: State,
    mode: ParseMode,
    limits: EngineLimits,
    scratch: Vec<u8>,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderStore,
    body: Vec<u8>,
    body_expected: usize,
    request: Option<Request>,
    error: Option<ParseError>,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    /// Create a lenient parser with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ParseMode::Lenient, EngineLimits::default())
    }

    /// Create a parser with an explicit mode and limits.
    #[must_use]
    pub fn with_config(mode: ParseMode, limits: EngineLimits) -> Self {
        let headers = HeaderStore::with_max_count(limits.max_header_count);
        Self {
            state: State::Method,
            mode,
            limits,
            scratch: Vec::new(),
            method: Method::Get,
            path: String::new(),
            query: None,
            headers,
            body: Vec::new(),
            body_expected: 0,
            request: None,
            error: None,
        }
    }

    /// Restore the initial state for a new message, keeping mode and
    /// limits.
    pub fn reset(&mut self) {
        self.state = State::Method;
        self.scratch.clear();
        self.method = Method::Get;
        self.path.clear();
        self.query = None;
        self.headers = HeaderStore::with_max_count(self.limits.max_header_count);
        self.body.clear();
        self.body_expected = 0;
        self.request = None;
        self.error = None;
    }

    /// Current status without consuming anything.
    #[must_use]
    pub fn status(&self) -> ParseStatus {
        match self.state {
            State::Complete => ParseStatus::Complete,
            State::Failed => ParseStatus::Error,
            _ => ParseStatus::NeedMoreData,
        }
    }

    /// The parsed request, available once status is `Complete`.
    #[must_use]
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// Take ownership of the parsed request, resetting the parser for the
    /// next message.
    pub fn take_request(&mut self) -> Option<Request> {
        let request = self.request.take();
        if request.is_some() {
            self.reset();
        }
        request
    }

    /// The parse error, available once status is `Error`.
    #[must_use]
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Feed a chunk of request bytes.
    ///
    /// Terminal states ignore further input and report their status
    /// unchanged. An empty chunk is a no-op.
    pub fn feed(&mut self, data: &[u8]) -> ParseStatus {
        if data.is_empty() || matches!(self.state, State::Complete | State::Failed) {
            return self.status();
        }

        if self.state == State::Body {
            self.feed_body(data);
            return self.status();
        }

        self.scratch.extend_from_slice(data);
        let mut consumed = 0;

        while !matches!(self.state, State::Complete | State::Failed) {
            let step = match self.state {
                State::Method => self.take_method(consumed),
                State::Path => self.take_path(consumed),
                State::Version => self.take_version(consumed),
                State::Headers => self.take_header_line(consumed),
                // Body leaves the line-oriented loop below.
                State::Body | State::Complete | State::Failed => break,
            };
            match step {
                Ok(Some(used)) => consumed += used,
                Ok(None) => break,
                Err(err) => {
                    self.fail(err);
                    break;
                }
            }
            if self.state == State::Body {
                // Remaining buffered bytes are body payload.
                let rest = self.scratch.split_off(consumed);
                self.scratch.clear();
                consumed = 0;
                self.feed_body(&rest);
                break;
            }
        }

        self.scratch.drain(..consumed);
        if self.status() == ParseStatus::NeedMoreData
            && self.state != State::Body
            && self.scratch.len() > self.limits.max_header_size
        {
            self.fail(ParseError::HeaderTooLarge);
        }
        self.status()
    }

    fn fail(&mut self, error: ParseError) {
        debug!(error = %error, "request parse failed");
        self.error = Some(error);
        self.state = State::Failed;
    }

    /// Method token up to the first space. `Ok(Some(n))` consumed n bytes,
    /// `Ok(None)` needs more data.
    fn take_method(&mut self, offset: usize) -> Result<Option<usize>, ParseError> {
        let pending = &self.scratch[offset..];
        let Some(sp) = memchr(b' ', pending) else {
            return Ok(None);
        };
        let token = String::from_utf8_lossy(&pending[..sp]).into_owned();
        self.method = match Method::from_token(&token) {
            Some(method) => method,
            None if self.mode == ParseMode::Strict => {
                return Err(ParseError::InvalidMethod(token));
            }
            None => Method::Get,
        };
        trace!(method = %self.method, "parsed method");
        self.state = State::Path;
        Ok(Some(sp + 1))
    }

    /// Path token up to the next space, split at the first `?`.
    fn take_path(&mut self, offset: usize) -> Result<Option<usize>, ParseError> {
        let pending = &self.scratch[offset..];
        let Some(sp) = memchr(b' ', pending) else {
            return Ok(None);
        };
        let mut target = String::from_utf8_lossy(&pending[..sp]).into_owned();
        if let Some(mark) = target.find('?') {
            self.query = Some(target[mark + 1..].to_string());
            target.truncate(mark);
        }
        self.path = target;
        trace!(path = %self.path, "parsed path");
        self.state = State::Version;
        Ok(Some(sp + 1))
    }

    /// Version token up to CRLF; must be exactly HTTP/1.0, 1.1, or 2.0.
    fn take_version(&mut self, offset: usize) -> Result<Option<usize>, ParseError> {
        let pending = &self.scratch[offset..];
        let Some(eol) = memmem::find(pending, b"\r\n") else {
            return Ok(None);
        };
        let version = String::from_utf8_lossy(&pending[..eol]);
        if !matches!(version.as_ref(), "HTTP/1.0" | "HTTP/1.1" | "HTTP/2.0") {
            return Err(ParseError::InvalidVersion(version.into_owned()));
        }
        self.state = State::Headers;
        Ok(Some(eol + 2))
    }

    /// One CRLF-terminated header line; the empty line ends the header
    /// section and resolves Content-Length.
    fn take_header_line(&mut self, offset: usize) -> Result<Option<usize>, ParseError> {
        let pending = &self.scratch[offset..];
        let Some(eol) = memmem::find(pending, b"\r\n") else {
            return Ok(None);
        };
        let line = &pending[..eol];

        if line.is_empty() {
            self.finish_headers()?;
            return Ok(Some(2));
        }

        let Some(colon) = memchr(b':', line) else {
            return Err(ParseError::MalformedHeaderLine(
                String::from_utf8_lossy(line).into_owned(),
            ));
        };
        let name = String::from_utf8_lossy(&line[..colon]).trim().to_string();
        let value = String::from_utf8_lossy(&line[colon + 1..]).trim().to_string();
        self.headers.add(name, value)?;
        Ok(Some(eol + 2))
    }

    /// Blank line seen: decide between `Body` and `Complete` from the
    /// declared Content-Length.
    fn finish_headers(&mut self) -> Result<(), ParseError> {
        let declared = match self.headers.find("Content-Length") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength)?,
            None => 0,
        };

        if declared == 0 {
            self.complete();
            return Ok(());
        }
        if declared > self.limits.max_body_size {
            // Rejected before any body buffer is allocated.
            return Err(ParseError::BodyTooLarge(declared));
        }
        self.body_expected = declared;
        self.body = Vec::with_capacity(declared);
        self.state = State::Body;
        Ok(())
    }

    /// Copy body bytes up to the declared length; surplus bytes are
    /// ignored (no pipelining).
    fn feed_body(&mut self, data: &[u8]) {
        let needed = self.body_expected - self.body.len();
        let take = needed.min(data.len());
        self.body.extend_from_slice(&data[..take]);
        if self.body.len() >= self.body_expected {
            self.complete();
        }
    }

    fn complete(&mut self) {
        let body = if self.body_expected > 0 {
            Some(std::mem::take(&mut self.body))
        } else {
            None
        };
        self.request = Some(Request {
            method: self.method,
            path: std::mem::take(&mut self.path),
            query: self.query.take(),
            headers: std::mem::take(&mut self.headers),
            body,
        });
        self.state = State::Complete;
        debug!(method = %self.method, "request parse complete");
    }
}
