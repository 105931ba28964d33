//! HTTP request parser module.
//!
//! Turns the raw bytes received on a connection into an [`HttpRequest`]:
//! the request line plus an RFC 2822 style header block.

mod request;
mod error;

// Re-export public items
pub use request::{HttpRequest, METHOD_KEY, PROTOCOL_KEY, REQUEST_KEY};
pub use error::Error;

// Re-export the parse_request function
pub use request::parse_request;
pub(crate) use request::split_query;
