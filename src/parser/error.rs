//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur during HTTP request parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,

    /// The request bytes are not valid ASCII/UTF-8 text.
    #[error("Request is not valid text")]
    InvalidEncoding,

    /// The request line does not split into method, target and protocol.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// A header line has no `:` separating its name from its value.
    #[error("Invalid header line: {0}")]
    InvalidHeaderFormat(String),
}
