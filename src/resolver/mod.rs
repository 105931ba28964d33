//! Resource resolution.
//!
//! Maps a request target onto the document root and decides what to send
//! back. Checks run in a fixed order and the first match wins:
//!
//! 1. the path does not exist: `404`, with the missing page if configured
//! 2. the path is a regular file: `200` with its contents
//! 3. the path is a directory and the target lacks a trailing slash: `301`
//! 4. the directory holds the default page: `200` with that page
//! 5. directory indexing is enabled: `200` with a listing
//! 6. otherwise: `403`
//!
//! Permission errors become `403`; any other filesystem error becomes `500`
//! and is only described in the server log.

mod fs;
mod index;
mod tests;

use std::io;
use std::path::{Path, PathBuf};

use log::{error, warn};

use crate::parser::split_query;
use crate::server::{HttpResponse, ServerConfig, StatusCode};

pub use fs::{EntryKind, FileSystem, LocalFs};
pub use index::render_index;

/// Resolves request targets against a document root.
pub struct ResourceResolver {
    document_root: PathBuf,
    default_page: String,
    missing_page: Option<String>,
    directory_indexing: bool,
    fs: Box<dyn FileSystem>,
}

impl ResourceResolver {
    /// Create a resolver for `config` that reads the local disk.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_file_system(config, LocalFs)
    }

    /// Create a resolver for `config` on top of `fs`.
    pub fn with_file_system(config: &ServerConfig, fs: impl FileSystem + 'static) -> Self {
        Self {
            document_root: config.document_root.clone(),
            default_page: config.default_page.clone(),
            missing_page: config.missing_page.clone(),
            directory_indexing: config.directory_indexing,
            fs: Box::new(fs),
        }
    }

    /// Map a request target to a filesystem path under the document root.
    ///
    /// `.` segments and empty segments are dropped and `..` removes the
    /// previous segment, so the result never climbs above the root. Symlinks
    /// are not resolved.
    pub fn filesystem_path(&self, target: &str) -> PathBuf {
        let mut path = self.document_root.clone();
        let mut depth = 0usize;
        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if depth > 0 {
                        path.pop();
                        depth -= 1;
                    }
                }
                name => {
                    path.push(name);
                    depth += 1;
                }
            }
        }
        path
    }

    /// Decide the response for `target`. Never fails: errors are folded
    /// into `403` and `500` responses.
    pub fn resolve(&self, target: &str) -> HttpResponse {
        let (path, query) = split_query(target);
        match self.try_resolve(path, query) {
            Ok(response) => response,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                warn!("403 Forbidden: {target}: {e}");
                HttpResponse::error(StatusCode::Forbidden)
            }
            Err(e) => {
                error!("Error resolving '{target}': {e}");
                HttpResponse::error(StatusCode::InternalServerError)
            }
        }
    }

    fn try_resolve(&self, path: &str, query: Option<&str>) -> io::Result<HttpResponse> {
        let fs_path = self.filesystem_path(path);

        let kind = match self.fs.kind(&fs_path) {
            Ok(kind) => kind,
            Err(e) if is_missing(&e) => return Ok(self.not_found()),
            Err(e) => return Err(e),
        };

        match kind {
            EntryKind::File => self.serve_file(&fs_path),
            EntryKind::Directory => {
                if !path.ends_with('/') {
                    let location = match query {
                        Some(query) => format!("{path}/?{query}"),
                        None => format!("{path}/"),
                    };
                    return Ok(HttpResponse::redirect(location));
                }

                let default_page = fs_path.join(&self.default_page);
                match self.fs.kind(&default_page) {
                    Ok(EntryKind::File) => return self.serve_file(&default_page),
                    Ok(_) => {}
                    Err(e) if is_missing(&e) => {}
                    Err(e) => return Err(e),
                }

                if self.directory_indexing {
                    let entries = self.fs.read_dir(&fs_path)?;
                    Ok(HttpResponse::new(StatusCode::Ok).with_body_string(render_index(path, &entries)))
                } else {
                    Ok(HttpResponse::error(StatusCode::Forbidden))
                }
            }
            EntryKind::Other => {
                warn!("403 Forbidden: {} is not a regular file", fs_path.display());
                Ok(HttpResponse::error(StatusCode::Forbidden))
            }
        }
    }

    fn serve_file(&self, path: &Path) -> io::Result<HttpResponse> {
        let body = self.fs.read(path)?;
        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        Ok(HttpResponse::new(StatusCode::Ok)
            .with_content_type(content_type.essence_str())
            .with_body_bytes(body))
    }

    fn not_found(&self) -> HttpResponse {
        let generic = || HttpResponse::error(StatusCode::NotFound);
        let Some(missing_page) = &self.missing_page else {
            return generic();
        };

        let path = self.filesystem_path(missing_page);
        match self.fs.read(&path) {
            Ok(body) => HttpResponse::new(StatusCode::NotFound).with_body_bytes(body),
            Err(e) if e.kind() == io::ErrorKind::NotFound => generic(),
            Err(e) => {
                error!("Could not read missing page {}: {e}", path.display());
                generic()
            }
        }
    }
}

/// Errors that mean "nothing is there" rather than a failure. A name too
/// long for the filesystem cannot exist either.
fn is_missing(e: &io::Error) -> bool {
    if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) {
        return true;
    }
    #[cfg(unix)]
    if e.raw_os_error() == Some(libc::ENAMETOOLONG) {
        return true;
    }
    false
}
