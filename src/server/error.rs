//! Error types for the HTTP server.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// The listening socket could not be bound. Fatal at startup.
    #[error("Could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: io::Error,
    },

    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// The client sent nothing before the read timeout expired.
    #[error("The connection to {0} timed out")]
    Timeout(SocketAddr),

    /// The client closed the connection without sending a request.
    #[error("{0} closed the connection before sending a request")]
    Closed(SocketAddr),

    /// Reading the request from the connection failed.
    #[error("Could not read from {peer}: {source}")]
    Read {
        peer: SocketAddr,
        source: io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// The configuration file could not be read.
    #[error("Could not load config file at '{path}': {source}")]
    ConfigFile {
        path: PathBuf,
        source: io::Error,
    },

    /// The configuration holds an unusable value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The global logger could not be installed.
    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),

    /// Starting or stopping the daemon failed.
    #[error("Daemon error: {0}")]
    Daemon(String),
}
