use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::settings::ServerConfig;

use super::http_handler::HttpHandler;

/// Plain-HTTP listener that runs every request through the [`HttpHandler`].
pub struct GatewayServer {
    bind: String,
    max_connections: usize,
    handler: Arc<HttpHandler>,
    active: Arc<AtomicUsize>,
}

impl GatewayServer {
    pub fn new(config: &ServerConfig, handler: Arc<HttpHandler>) -> Self {
        Self {
            bind: config.bind.clone(),
            max_connections: config.max_connections,
            handler,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind the listener and accept connections until the task is aborted.
    pub async fn run(&self) -> Result<()> {
        let listener = bind_tcp_listener(&self.bind)
            .with_context(|| format!("Failed to bind {}", self.bind))?;
        let listener = TcpListener::from_std(listener)?;
        info!(addr = %self.bind, "HTTP listener started");

        self.serve(listener).await;
        Ok(())
    }

    async fn serve(&self, listener: TcpListener) {
        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(err) => {
                    warn!("Failed to accept TCP connection: {}", err);
                    continue;
                }
            };

            let peer_ip = peer_addr.ip();

            if self.active.load(Ordering::Relaxed) >= self.max_connections {
                debug!(client_ip = %peer_ip, "Max connections reached, dropping");
                drop(stream);
                continue;
            }

            let guard = ConnectionGuard::new(Arc::clone(&self.active));
            let handler = Arc::clone(&self.handler);

            tokio::spawn(async move {
                let _guard = guard;
                if let Err(err) = handle_connection(stream, handler, peer_ip).await {
                    debug!(
                        client_ip = %peer_ip,
                        error = %err,
                        "Connection handling ended with error"
                    );
                }
            });
        }
    }
}

fn bind_tcp_listener(addr: &str) -> Result<std::net::TcpListener> {
    let sock_addr: std::net::SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", addr))?;

    let domain = if sock_addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&sock_addr.into())?;
    socket.listen(1024)?;

    Ok(socket.into())
}

async fn handle_connection(
    stream: TcpStream,
    handler: Arc<HttpHandler>,
    peer_ip: IpAddr,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let h = Arc::clone(&handler);
        async move { Ok::<_, std::convert::Infallible>(h.handle(req, peer_ip).await) }
    });

    http1::Builder::new().serve_connection(io, service).await
}

/// Decrements the active connection count when a connection task ends.
struct ConnectionGuard {
    active: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Self { active }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}
