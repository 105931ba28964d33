//! HTTP server implementation.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use crate::resolver::{FileSystem, ResourceResolver};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::worker::{self, Connection, ConnectionContext, WorkQueue};

/// Stops a running [`HttpServer`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Ask the server to stop. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`stop`](Self::stop) has been called.
    async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// An HTTP file server.
///
/// Owns the listening socket and the worker pool while [`serve`](Self::serve)
/// runs; [`ShutdownHandle::stop`] closes both.
///
/// The work queue between the accept loop and the workers is unbounded: when
/// connections arrive faster than the workers answer them they wait in
/// memory, and nothing is rejected.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    resolver: Arc<ResourceResolver>,
    shutdown: ShutdownHandle,
}

impl HttpServer {
    /// Create a new HTTP server serving `config.document_root` from disk.
    pub fn new(config: ServerConfig) -> Self {
        let resolver = ResourceResolver::new(&config);
        Self::with_resolver(config, resolver)
    }

    /// Create a server that resolves requests on top of `fs`.
    pub fn with_file_system(config: ServerConfig, fs: impl FileSystem + 'static) -> Self {
        let resolver = ResourceResolver::with_file_system(&config, fs);
        Self::with_resolver(config, resolver)
    }

    fn with_resolver(config: ServerConfig, resolver: ResourceResolver) -> Self {
        Self {
            config,
            resolver: Arc::new(resolver),
            shutdown: ShutdownHandle::new(),
        }
    }

    /// A handle that stops this server.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Log the banner and the settings that shape responses.
    fn display_server_info(&self) {
        info!("{}, starting...", self.config.server_info);
        info!("Document root: {}", self.config.document_root.display());
        info!(
            "Default page: {}, directory indexing: {}, workers: {}",
            self.config.default_page,
            if self.config.directory_indexing { "on" } else { "off" },
            self.config.threads
        );
    }

    /// Bind the listening socket.
    pub async fn bind(&self) -> Result<TcpListener, Error> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        info!("Listening on {addr}");
        Ok(listener)
    }

    /// Stop the server on Ctrl+C or SIGTERM.
    fn setup_signal_handler(shutdown: ShutdownHandle) -> JoinHandle<()> {
        tokio::spawn(async move {
            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        error!("Error setting up SIGTERM handler: {e}");
                        std::future::pending::<()>().await;
                    }
                }
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                result = signal::ctrl_c() => match result {
                    Ok(()) => info!("Received Ctrl+C, shutting down"),
                    Err(e) => {
                        error!("Error setting up Ctrl+C handler: {e}");
                        return;
                    }
                },
                _ = terminate => info!("Received SIGTERM, shutting down"),
            }
            shutdown.stop();
        })
    }

    /// Start the server: bind, then serve until stopped by a signal or a
    /// [`ShutdownHandle`].
    pub async fn start(&self) -> Result<(), Error> {
        self.display_server_info();
        let listener = self.bind().await?;

        let signals = Self::setup_signal_handler(self.shutdown_handle());
        let result = self.serve(listener).await;
        signals.abort();
        result
    }

    /// Spawn worker `id` into `workers`.
    fn spawn_worker(
        workers: &mut JoinSet<()>,
        id: usize,
        queue: &WorkQueue,
        ctx: &Arc<ConnectionContext>,
    ) {
        workers.spawn(worker::run(id, Arc::clone(queue), Arc::clone(ctx)));
    }

    /// Handle an error from `accept`. Errors that end the accept loop are
    /// returned.
    async fn handle_accept_error(e: std::io::Error) -> Result<(), Error> {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return Err(Error::IoError(e));
        }

        // Usually descriptor exhaustion; give connections time to close.
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        Ok(())
    }

    /// Abort every worker. Dropping their tasks closes the connections they
    /// hold.
    async fn perform_shutdown(workers: &mut JoinSet<()>) {
        info!("Closing {len} workers...", len = workers.len());
        workers.shutdown().await;
        info!("Server shutdown complete");
    }

    /// Accept connections on `listener` and hand them to the worker pool
    /// until the server is stopped.
    ///
    /// Returns `Ok(())` after a requested stop, or the error that ended the
    /// accept loop.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Error> {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<Connection>();
        let queue: WorkQueue = Arc::new(Mutex::new(queue_rx));
        let ctx = Arc::new(ConnectionContext::new(&self.config, Arc::clone(&self.resolver)));

        let mut workers = JoinSet::new();
        for id in 0..self.config.threads {
            Self::spawn_worker(&mut workers, id, &queue, &ctx);
        }
        let mut next_id = self.config.threads;

        let stopped = self.shutdown.stopped();
        tokio::pin!(stopped);
        let mut result = Ok(());

        loop {
            tokio::select! {
                _ = &mut stopped => {
                    info!("Shutting down server...");
                    break;
                }

                Some(finished) = workers.join_next() => {
                    match finished {
                        Err(e) if e.is_panic() => error!("Worker panicked: {e}"),
                        Err(e) => warn!("Worker stopped: {e}"),
                        Ok(()) => warn!("Worker exited"),
                    }
                    Self::spawn_worker(&mut workers, next_id, &queue, &ctx);
                    next_id += 1;
                }

                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            info!("Accepted connection from {peer}");
                            if queue_tx.send(Connection { stream, peer }).is_err() {
                                error!("Work queue closed, shutting down");
                                break;
                            }
                        }
                        Err(e) => {
                            if let Err(e) = Self::handle_accept_error(e).await {
                                result = Err(e);
                                break;
                            }
                        }
                    }
                }
            }
        }

        drop(listener);
        drop(queue_tx);
        Self::perform_shutdown(&mut workers).await;

        result
    }
}
