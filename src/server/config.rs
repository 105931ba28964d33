//! Server configuration.
//!
//! Settings are read from a JSON document. Every field has a default, so a
//! config file only needs to name what it changes:
//!
//! ```json
//! {
//!     "port": 8000,
//!     "document_root": "/srv/www",
//!     "directory_indexing": true
//! }
//! ```

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::server::error::Error;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// The address to bind to.
    pub listen_address: IpAddr,
    /// The port to bind to.
    pub port: u16,
    /// The number of connection workers.
    pub threads: usize,
    /// The directory all request targets are resolved against.
    pub document_root: PathBuf,
    /// File served when a directory is requested with a trailing slash.
    pub default_page: String,
    /// Page served with 404 responses, relative to the document root.
    pub missing_page: Option<String>,
    /// Whether directories without a default page are listed.
    pub directory_indexing: bool,
    /// Value of the `Server` response header.
    pub server_info: String,
    /// Whether log lines are also appended to `log_location`.
    pub use_text_log: bool,
    /// The log file.
    pub log_location: PathBuf,
    /// Where the daemon records its pid.
    pub pid_file: PathBuf,
    /// The most bytes read from a connection for one request.
    pub read_buffer_size: usize,
    /// How long a worker waits for the request bytes.
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            threads: 5,
            document_root: PathBuf::from("www"),
            default_page: "index.html".to_string(),
            missing_page: None,
            directory_indexing: false,
            server_info: concat!("microserve/", env!("CARGO_PKG_VERSION")).to_string(),
            use_text_log: false,
            log_location: PathBuf::from("microserve.log"),
            pid_file: PathBuf::from("/tmp/microserve-daemon.pid"),
            read_buffer_size: 1024,
            read_timeout_ms: 100,
        }
    }
}

impl ServerConfig {
    /// Load the configuration from a JSON file.
    ///
    /// Relative paths in the file are made absolute against the current
    /// working directory, and the result is validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let base = std::env::current_dir()?;
        let config = Self::from_json(&contents)?.absolutize(&base);
        config.validate()?;
        Ok(config)
    }

    /// Parse the configuration from a JSON string without validating it.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve relative paths against `base`.
    pub fn absolutize(mut self, base: &Path) -> Self {
        for path in [&mut self.document_root, &mut self.log_location, &mut self.pid_file] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    /// Check the configuration for values the server cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.threads == 0 {
            return Err(Error::Config("threads must be at least 1".to_string()));
        }
        if self.read_buffer_size == 0 {
            return Err(Error::Config("read_buffer_size must be at least 1".to_string()));
        }
        if self.default_page.is_empty() || self.default_page.contains('/') {
            return Err(Error::Config(format!(
                "default_page must be a plain file name, got '{}'",
                self.default_page
            )));
        }
        if !self.document_root.is_dir() {
            return Err(Error::Config(format!(
                "document_root {} is not a directory",
                self.document_root.display()
            )));
        }
        Ok(())
    }

    /// The socket address to listen on.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }

    /// The read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
