//! A minimal concurrent HTTP file server.
//!
//! Each connection carries exactly one request. The listener queues accepted
//! connections, a fixed pool of workers takes them off the queue, and every
//! request is answered with a file, a directory listing, a redirect or an
//! error page, after which the connection is closed.
//!
//! # Features
//!
//! - Request parsing from raw bytes: request line plus RFC 2822 style headers
//! - Resolution of request targets against a document root, with default
//!   pages, optional directory listings and a configurable missing page
//! - `200`, `301`, `403`, `404` and `500` responses, always `Connection: close`
//! - A fixed worker pool behind an unbounded FIFO queue
//! - JSON configuration, console/file logging and a unix daemon mode
//!
//! # Examples
//!
//! ## Parsing a request
//!
//! ```
//! use microserve_rs::parse_request;
//!
//! let request_bytes = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
//!
//! match parse_request(request_bytes) {
//!     Ok(request) => {
//!         println!("Method: {}", request.method);
//!         println!("Target: {}", request.target);
//!         println!("Protocol: {}", request.protocol);
//!         println!("Headers: {:?}", request.headers);
//!     },
//!     Err(err) => {
//!         println!("Error parsing request: {}", err);
//!     }
//! }
//! ```
//!
//! ## Running a server
//!
//! ```no_run
//! use microserve_rs::{HttpServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), microserve_rs::ServerError> {
//!     let config = ServerConfig {
//!         document_root: "/srv/www".into(),
//!         directory_indexing: true,
//!         ..ServerConfig::default()
//!     };
//!
//!     HttpServer::new(config).start().await
//! }
//! ```

// Export the parser module
pub mod parser;

// Export the resolver module
pub mod resolver;

// Export the server module
pub mod server;

pub mod logging;

#[cfg(unix)]
pub mod daemon;

mod html;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, parse_request};
pub use resolver::{FileSystem, LocalFs, ResourceResolver};
pub use server::{Error as ServerError, HttpResponse, HttpServer, ServerConfig, ShutdownHandle, StatusCode};
