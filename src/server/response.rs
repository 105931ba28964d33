//! HTTP response types and wire serialization.

use std::fmt;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::html;

/// The status codes this server emits, with their standard reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok = 200,
    MovedPermanently = 301,
    Forbidden = 403,
    NotFound = 404,
    InternalServerError = 500,
}

impl StatusCode {
    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// The numeric code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Represents an HTTP response.
///
/// `Server`, `Content-Length`, `Connection` and `Content-Type` are produced
/// by the serializer; `headers` only holds extra headers such as `Location`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// The value of the Content-Type header
    pub content_type: String,
    /// Extra headers, written in insertion order
    pub headers: Vec<(String, String)>,
    /// The response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new, empty `text/html` response with the given status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: "text/html".to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A generic error page for `status`.
    pub fn error(status: StatusCode) -> Self {
        Self::new(status).with_body_string(html::error_page(&status.to_string()))
    }

    /// A permanent redirect to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        let location = location.into();
        Self::new(StatusCode::MovedPermanently)
            .with_body_string(html::redirect_stub(&location))
            .with_header("Location", location)
    }

    /// Set the response body with a string.
    pub fn with_body_string(self, body: impl Into<String>) -> Self {
        self.with_body_bytes(body.into().into_bytes())
    }

    /// Set the response body with bytes.
    pub fn with_body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Add an extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Look up an extra header by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize the status line and header block.
    pub fn header_bytes(&self, server: &str) -> Vec<u8> {
        let mut header = format!(
            "HTTP/1.1 {status}\r\n\
             Server: {server}\r\n\
             Content-Length: {length}\r\n\
             Connection: close\r\n",
            status = self.status,
            length = self.body.len(),
        );
        for (name, value) in &self.headers {
            header.push_str(&format!("{name}: {value}\r\n"));
        }
        header.push_str(&format!("Content-Type: {}\r\n\r\n", self.content_type));
        header.into_bytes()
    }

    /// Convert the whole response to bytes.
    pub fn to_bytes(&self, server: &str) -> Vec<u8> {
        let mut bytes = self.header_bytes(server);
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Write the response to `writer`: the header block first, then the body.
    pub async fn write_to<W>(&self, writer: &mut W, server: &str) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.header_bytes(server)).await?;
        writer.write_all(&self.body).await?;
        writer.flush().await
    }
}
