//! Tests for resource resolution and directory listings.

#[cfg(test)]
mod resolver_tests {
    use std::collections::HashMap;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use crate::resolver::{render_index, EntryKind, FileSystem, ResourceResolver};
    use crate::server::{ServerConfig, StatusCode};

    fn config_for(root: &Path) -> ServerConfig {
        ServerConfig {
            document_root: root.to_path_buf(),
            ..ServerConfig::default()
        }
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
        fs::write(dir.path().join("page.html"), "<p>page</p>").unwrap();
        fs::write(dir.path().join("blob.bin"), [0u8, 159, 146, 150, 255]).unwrap();
        fs::create_dir(dir.path().join("files")).unwrap();
        fs::write(dir.path().join("files/a.txt"), "a").unwrap();
        fs::write(dir.path().join("files/b.txt"), "b").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "<h1>docs</h1>").unwrap();
        dir
    }

    #[test]
    fn test_existing_file_is_served() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/hello.txt");
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.content_type, "text/plain");
        assert_eq!(response.body, b"hello world");
    }

    #[test]
    fn test_binary_file_is_served_byte_for_byte() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/blob.bin");
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.content_type, "application/octet-stream");
        assert_eq!(response.body, vec![0u8, 159, 146, 150, 255]);
    }

    #[test]
    fn test_html_content_type() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));
        assert_eq!(resolver.resolve("/page.html").content_type, "text/html");
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/nope.txt");
        assert_eq!(response.status, StatusCode::NotFound);
        assert!(String::from_utf8_lossy(&response.body).contains("404 Not Found"));
    }

    #[test]
    fn test_path_below_a_file_is_not_found() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));
        assert_eq!(resolver.resolve("/hello.txt/child").status, StatusCode::NotFound);
    }

    #[test]
    fn test_overlong_name_is_not_found() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let target = format!("/{}", "a".repeat(300));
        assert_eq!(resolver.resolve(&target).status, StatusCode::NotFound);
    }

    #[test]
    fn test_configured_missing_page() {
        let dir = site();
        fs::write(dir.path().join("404.html"), "custom missing").unwrap();
        let config = ServerConfig {
            missing_page: Some("404.html".to_string()),
            ..config_for(dir.path())
        };
        let resolver = ResourceResolver::new(&config);

        let response = resolver.resolve("/nope");
        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(response.body, b"custom missing");
    }

    #[test]
    fn test_absent_missing_page_falls_back_to_generic() {
        let dir = site();
        let config = ServerConfig {
            missing_page: Some("404.html".to_string()),
            ..config_for(dir.path())
        };
        let resolver = ResourceResolver::new(&config);

        let response = resolver.resolve("/nope");
        assert_eq!(response.status, StatusCode::NotFound);
        assert!(String::from_utf8_lossy(&response.body).contains("<h1>404 Not Found</h1>"));
    }

    #[test]
    fn test_unreadable_missing_page_falls_back_to_generic() {
        let dir = site();
        fs::create_dir(dir.path().join("404.html")).unwrap();
        let config = ServerConfig {
            missing_page: Some("404.html".to_string()),
            ..config_for(dir.path())
        };
        let resolver = ResourceResolver::new(&config);

        let response = resolver.resolve("/nope");
        assert_eq!(response.status, StatusCode::NotFound);
        assert!(String::from_utf8_lossy(&response.body).contains("404 Not Found"));
    }

    #[test]
    fn test_directory_without_slash_redirects() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/files");
        assert_eq!(response.status, StatusCode::MovedPermanently);
        assert_eq!(response.header("Location"), Some("/files/"));
        assert_eq!(
            String::from_utf8_lossy(&response.body),
            "Permanently moved <a href='/files/'>here</a>."
        );
    }

    #[test]
    fn test_redirect_wins_over_default_page() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/docs");
        assert_eq!(response.status, StatusCode::MovedPermanently);
        assert_eq!(response.header("Location"), Some("/docs/"));
    }

    #[test]
    fn test_redirect_keeps_query_string() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/files?sort=name");
        assert_eq!(response.header("Location"), Some("/files/?sort=name"));
    }

    #[test]
    fn test_default_page_is_served() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/docs/");
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.content_type, "text/html");
        assert_eq!(response.body, b"<h1>docs</h1>");
    }

    #[test]
    fn test_query_string_is_ignored_for_lookup() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/hello.txt?v=2");
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.body, b"hello world");
    }

    #[test]
    fn test_directory_without_index_is_forbidden() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        let response = resolver.resolve("/files/");
        assert_eq!(response.status, StatusCode::Forbidden);
        assert!(String::from_utf8_lossy(&response.body).contains("403 Forbidden"));
    }

    #[test]
    fn test_directory_listing_when_enabled() {
        let dir = site();
        let config = ServerConfig {
            directory_indexing: true,
            ..config_for(dir.path())
        };
        let resolver = ResourceResolver::new(&config);

        let response = resolver.resolve("/files/");
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.content_type, "text/html");
        let body = String::from_utf8_lossy(&response.body);
        assert!(body.contains("<a href='/files/a.txt'>a.txt</a>"));
        assert!(body.contains("<a href='/files/b.txt'>b.txt</a>"));
    }

    #[test]
    fn test_default_page_wins_over_listing() {
        let dir = site();
        let config = ServerConfig {
            directory_indexing: true,
            ..config_for(dir.path())
        };
        let resolver = ResourceResolver::new(&config);
        assert_eq!(resolver.resolve("/docs/").body, b"<h1>docs</h1>");
    }

    #[test]
    fn test_root_listing_links() {
        let dir = site();
        let config = ServerConfig {
            directory_indexing: true,
            default_page: "missing.html".to_string(),
            ..config_for(dir.path())
        };
        let resolver = ResourceResolver::new(&config);

        let body = String::from_utf8(resolver.resolve("/").body).unwrap();
        assert!(body.contains("<a href='/hello.txt'>hello.txt</a>"));
        assert!(body.contains("<a href='/files'>files</a>"));
        assert!(!body.contains("//"));
    }

    #[test]
    fn test_parent_segments_stay_under_root() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));

        assert_eq!(
            resolver.filesystem_path("/../../etc/passwd"),
            dir.path().join("etc/passwd")
        );
        assert_eq!(
            resolver.filesystem_path("/files/./../hello.txt"),
            dir.path().join("hello.txt")
        );
        assert_eq!(resolver.filesystem_path("/"), dir.path().to_path_buf());

        let response = resolver.resolve("/files/../hello.txt");
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.body, b"hello world");
    }

    #[test]
    fn test_same_file_resolves_identically() {
        let dir = site();
        let resolver = ResourceResolver::new(&config_for(dir.path()));
        assert_eq!(resolver.resolve("/hello.txt"), resolver.resolve("/hello.txt"));
    }

    /// A filesystem whose answers are scripted per path.
    #[derive(Default)]
    struct ScriptedFs {
        kinds: HashMap<PathBuf, Result<EntryKind, io::ErrorKind>>,
        reads: HashMap<PathBuf, Result<Vec<u8>, io::ErrorKind>>,
    }

    impl FileSystem for ScriptedFs {
        fn kind(&self, path: &Path) -> io::Result<EntryKind> {
            match self.kinds.get(path) {
                Some(Ok(kind)) => Ok(*kind),
                Some(Err(kind)) => Err(io::Error::new(*kind, "scripted")),
                None => Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        }

        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            match self.reads.get(path) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(kind)) => Err(io::Error::new(*kind, "scripted")),
                None => Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        }

        fn read_dir(&self, _path: &Path) -> io::Result<Vec<String>> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    fn scripted_config() -> ServerConfig {
        ServerConfig {
            document_root: PathBuf::from("/srv"),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_permission_denied_is_forbidden() {
        let mut fs = ScriptedFs::default();
        fs.kinds.insert(PathBuf::from("/srv/secret.txt"), Ok(EntryKind::File));
        fs.reads.insert(PathBuf::from("/srv/secret.txt"), Err(io::ErrorKind::PermissionDenied));
        let resolver = ResourceResolver::with_file_system(&scripted_config(), fs);

        let response = resolver.resolve("/secret.txt");
        assert_eq!(response.status, StatusCode::Forbidden);
    }

    #[test]
    fn test_permission_denied_on_stat_is_forbidden() {
        let mut fs = ScriptedFs::default();
        fs.kinds.insert(PathBuf::from("/srv/locked"), Err(io::ErrorKind::PermissionDenied));
        let resolver = ResourceResolver::with_file_system(&scripted_config(), fs);

        assert_eq!(resolver.resolve("/locked").status, StatusCode::Forbidden);
    }

    #[test]
    fn test_unreadable_listing_is_forbidden() {
        let mut fs = ScriptedFs::default();
        fs.kinds.insert(PathBuf::from("/srv/dir"), Ok(EntryKind::Directory));
        let config = ServerConfig {
            directory_indexing: true,
            ..scripted_config()
        };
        let resolver = ResourceResolver::with_file_system(&config, fs);

        assert_eq!(resolver.resolve("/dir/").status, StatusCode::Forbidden);
    }

    #[test]
    fn test_unexpected_error_is_internal_and_not_leaked() {
        let mut fs = ScriptedFs::default();
        fs.kinds.insert(PathBuf::from("/srv/broken"), Ok(EntryKind::File));
        fs.reads.insert(PathBuf::from("/srv/broken"), Err(io::ErrorKind::InvalidData));
        let resolver = ResourceResolver::with_file_system(&scripted_config(), fs);

        let response = resolver.resolve("/broken");
        assert_eq!(response.status, StatusCode::InternalServerError);
        let body = String::from_utf8_lossy(&response.body);
        assert!(body.contains("500 Internal Server Error"));
        assert!(!body.contains("scripted"));
        assert!(!body.contains("/srv"));
    }

    #[test]
    fn test_special_file_is_forbidden() {
        let mut fs = ScriptedFs::default();
        fs.kinds.insert(PathBuf::from("/srv/fifo"), Ok(EntryKind::Other));
        let resolver = ResourceResolver::with_file_system(&scripted_config(), fs);

        assert_eq!(resolver.resolve("/fifo").status, StatusCode::Forbidden);
    }

    #[test]
    fn test_render_index_normalizes_request_path() {
        let entries = vec!["a.txt".to_string(), "sub".to_string()];

        let html = render_index("/files/", &entries);
        assert!(html.contains("<a href='/files/a.txt'>a.txt</a>"));
        assert!(html.contains("<a href='/files/sub'>sub</a>"));

        let html = render_index("files", &entries);
        assert!(html.contains("<a href='/files/a.txt'>a.txt</a>"));

        let html = render_index("/", &entries);
        assert!(html.contains("<a href='/a.txt'>a.txt</a>"));
    }

    #[test]
    fn test_render_index_keeps_entry_order_and_escapes() {
        let entries = vec!["z.txt".to_string(), "<a>.txt".to_string()];
        let html = render_index("/d/", &entries);

        let z = html.find("z.txt").unwrap();
        let a = html.find("&lt;a&gt;.txt").unwrap();
        assert!(z < a);
        assert!(!html.contains("<a>.txt"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
