//! Connection workers.
//!
//! A fixed number of workers drain the shared work queue. Each worker owns
//! the connection it dequeued until it has answered and closed it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};

use crate::parser::parse_request;
use crate::resolver::ResourceResolver;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};

/// An accepted connection and the address of its peer.
#[derive(Debug)]
pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

/// The receiving end of the work queue, shared by all workers.
///
/// Holding the lock while waiting in `recv` keeps dequeues mutually
/// exclusive; the other workers wait on the lock.
pub(crate) type WorkQueue = Arc<Mutex<mpsc::UnboundedReceiver<Connection>>>;

/// Everything a worker needs to answer one connection.
pub struct ConnectionContext {
    /// The resolver shared by all workers.
    pub resolver: Arc<ResourceResolver>,
    /// Value of the `Server` response header.
    pub server_info: String,
    /// The most bytes read for one request.
    pub read_buffer_size: usize,
    /// How long to wait for the request bytes.
    pub read_timeout: Duration,
}

impl ConnectionContext {
    /// Build a context from `config` around an existing resolver.
    pub fn new(config: &ServerConfig, resolver: Arc<ResourceResolver>) -> Self {
        Self {
            resolver,
            server_info: config.server_info.clone(),
            read_buffer_size: config.read_buffer_size,
            read_timeout: config.read_timeout(),
        }
    }
}

/// Run one worker until the queue is closed.
pub(crate) async fn run(id: usize, queue: WorkQueue, ctx: Arc<ConnectionContext>) {
    debug!("Worker {id} started");
    loop {
        let next = {
            let mut receiver = queue.lock().await;
            receiver.recv().await
        };
        let Some(Connection { mut stream, peer }) = next else {
            break;
        };

        match handle_connection(&mut stream, peer, &ctx).await {
            Ok(status) => debug!("Worker {id} answered {peer} with {status}"),
            Err(e @ (Error::Timeout(_) | Error::Closed(_) | Error::Read { .. })) => info!("{e}"),
            Err(e @ Error::ParseError(_)) => error!("Error parsing header from {peer}: {e}"),
            Err(e) => warn!("Error answering {peer}: {e}"),
        }

        if let Err(e) = stream.shutdown().await {
            debug!("Error closing connection to {peer}: {e}");
        }
    }
    debug!("Worker {id} stopped: queue closed");
}

/// Read one request from `stream`, answer it, and report the status sent.
///
/// Returns an error when no request arrived in time, when the peer closed
/// the connection without sending one, when the request could not be parsed
/// (a 500 response has then already been sent), or when the response could
/// not be written. The caller closes the connection.
pub async fn handle_connection<S>(
    stream: &mut S,
    peer: SocketAddr,
    ctx: &ConnectionContext,
) -> Result<StatusCode, Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; ctx.read_buffer_size];

    let n = match tokio::time::timeout(ctx.read_timeout, stream.read(&mut buf)).await {
        Ok(Ok(0)) => return Err(Error::Closed(peer)),
        Err(_) => return Err(Error::Timeout(peer)),
        Ok(Ok(n)) => n,
        Ok(Err(source)) => return Err(Error::Read { peer, source }),
    };

    let request = match parse_request(&buf[..n]) {
        Ok(request) => request,
        Err(e) => {
            let response = HttpResponse::error(StatusCode::InternalServerError);
            response.write_to(stream, &ctx.server_info).await?;
            return Err(Error::ParseError(e));
        }
    };

    info!(
        "Serving {method} '{target}' to {peer}",
        method = request.method,
        target = request.target
    );

    // Resolution blocks on the filesystem. A panic in it surfaces as a JoinError.
    let resolver = Arc::clone(&ctx.resolver);
    let target = request.target.clone();
    let response = match tokio::task::spawn_blocking(move || resolver.resolve(&target)).await {
        Ok(response) => response,
        Err(e) => {
            error!("Error getting requested file for {peer}: {e}");
            HttpResponse::error(StatusCode::InternalServerError)
        }
    };

    response.write_to(stream, &ctx.server_info).await?;
    Ok(response.status)
}
