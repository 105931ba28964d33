//! HTTP server implementation for microserve-rs.
//!
//! The listener accepts connections and queues them; a fixed pool of
//! workers takes them off the queue, answers one request per connection and
//! closes it.

mod response;
mod config;
mod error;
mod http_server;
mod worker;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use config::ServerConfig;
pub use error::Error;
pub use http_server::{HttpServer, ShutdownHandle};
pub use worker::{handle_connection, Connection, ConnectionContext};
