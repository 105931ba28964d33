//! HTTP request parsing and representation.

use std::collections::HashMap;

use crate::parser::error::Error;

/// Header key under which the request method is mirrored.
pub const METHOD_KEY: &str = "Method";
/// Header key under which the request target is mirrored.
pub const REQUEST_KEY: &str = "Request";
/// Header key under which the protocol version is mirrored.
pub const PROTOCOL_KEY: &str = "Protocol";

/// Represents a parsed HTTP request.
///
/// A request is built once per connection and never modified afterwards.
/// `method`, `target` and `protocol` are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// The request method as sent by the client (GET, HEAD, ...)
    pub method: String,
    /// The request target, including any query string
    pub target: String,
    /// The protocol version string (for example `HTTP/1.1`)
    pub protocol: String,
    /// The header mapping, keyed exactly as received, plus the reserved
    /// [`METHOD_KEY`], [`REQUEST_KEY`] and [`PROTOCOL_KEY`] entries
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a new HTTP request.
    ///
    /// The request line components are also stored in `headers` under the
    /// reserved keys, replacing any client header of the same name.
    pub fn new(
        method: impl Into<String>,
        target: impl Into<String>,
        protocol: impl Into<String>,
        mut headers: HashMap<String, String>,
    ) -> Self {
        let method = method.into();
        let target = target.into();
        let protocol = protocol.into();

        headers.insert(METHOD_KEY.to_string(), method.clone());
        headers.insert(REQUEST_KEY.to_string(), target.clone());
        headers.insert(PROTOCOL_KEY.to_string(), protocol.clone());

        Self {
            method,
            target,
            protocol,
            headers,
        }
    }

    /// Get a header value, ignoring ASCII case in the name.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// The target without its query string.
    pub fn path(&self) -> &str {
        split_query(&self.target).0
    }

    /// The query string of the target, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        split_query(&self.target).1
    }
}

/// Split a request target into its path and optional query string.
pub(crate) fn split_query(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Split off the first line of `text`, accepting `\r\n` or a bare `\n`.
///
/// Returns `None` when `text` holds no complete line.
fn split_line(text: &str) -> Option<(&str, &str)> {
    let end = text.find('\n')?;
    let line = &text[..end];
    let line = line.strip_suffix('\r').unwrap_or(line);
    Some((line, &text[end + 1..]))
}

/// Parse the header block that follows the request line.
///
/// Parsing stops at the first empty line. An unterminated trailing fragment
/// is what remains of a truncated read and is dropped. Lines starting with
/// whitespace continue the previous header's value.
fn parse_headers(mut rest: &str) -> Result<HashMap<String, String>, Error> {
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut last: Option<String> = None;

    while let Some((line, remainder)) = split_line(rest) {
        rest = remainder;

        // Empty line indicates the end of headers
        if line.is_empty() {
            break;
        }

        if line.starts_with(|c: char| c == ' ' || c == '\t') {
            let value = last
                .as_ref()
                .and_then(|name| headers.get_mut(name))
                .ok_or_else(|| Error::InvalidHeaderFormat(line.to_string()))?;
            value.push(' ');
            value.push_str(line.trim());
            continue;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::InvalidHeaderFormat(line.to_string()))?;
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Error::InvalidHeaderFormat(line.to_string()));
        }

        headers.insert(name.to_string(), value.trim().to_string());
        last = Some(name.to_string());
    }

    Ok(headers)
}

/// Parse an HTTP request from a byte slice.
///
/// The input must hold at least a request line terminated by a line break.
/// The request line must split on single spaces into exactly three non-empty
/// tokens: method, target and protocol.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    // A read cut short may split a character at the very end; that partial
    // fragment is dropped along with the rest of the unterminated line.
    let input_str = match std::str::from_utf8(input) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&input[..e.valid_up_to()]).map_err(|_| Error::InvalidEncoding)?
        }
        Err(_) => return Err(Error::InvalidEncoding),
    };

    let (request_line, rest) = split_line(input_str)
        .ok_or_else(|| Error::MalformedRequestLine(input_str.trim_end().to_string()))?;

    let parts: Vec<&str> = request_line.split(' ').collect();
    let &[method, target, protocol] = parts.as_slice() else {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    };
    if method.is_empty() || target.is_empty() || protocol.is_empty() {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let headers = parse_headers(rest)?;

    Ok(HttpRequest::new(method, target, protocol, headers))
}
