use crate::error::{ProxyError, Result};
use crate::request::{ProxyBody, Target, empty, error_response, to_origin_form};
use hostwatch_core::ObservationHook;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, client};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP forward proxy that reports every request to an [`ObservationHook`]
pub struct ProxyServer {
    listener: TcpListener,
    hook: Arc<dyn ObservationHook>,
}

impl ProxyServer {
    /// Bind the listening socket
    pub async fn bind(addr: &str, hook: Arc<dyn ObservationHook>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ProxyError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self { listener, hook })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` is cancelled
    ///
    /// Connections already being served keep running in their own tasks.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!("Starting proxy server on {}", self.local_addr()?);

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Proxy stopped accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        // Back off so fd exhaustion doesn't spin the loop
                        warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            debug!("Client connected: {}", peer);
            let hook = Arc::clone(&self.hook);

            // Spawn a task for each connection
            tokio::spawn(async move {
                serve_connection(stream, hook).await;
                debug!("Client disconnected: {}", peer);
            });
        }
    }
}

async fn serve_connection(stream: TcpStream, hook: Arc<dyn ObservationHook>) {
    let service = service_fn(move |req| {
        let hook = Arc::clone(&hook);
        async move { proxy(req, hook.as_ref()).await }
    });

    if let Err(e) = http1::Builder::new()
        .preserve_header_case(true)
        .title_case_headers(true)
        .serve_connection(TokioIo::new(stream), service)
        .with_upgrades()
        .await
    {
        debug!("Connection error: {}", e);
    }
}

/// Observe the request, then forward it
///
/// Forwarding failures become error responses; they never touch the hook.
async fn proxy(
    req: Request<Incoming>,
    hook: &dyn ObservationHook,
) -> std::result::Result<Response<ProxyBody>, Infallible> {
    let target = match Target::from_request(&req) {
        Ok(target) => target,
        Err(e) => {
            debug!("Rejecting request: {}", e);
            return Ok(error_response(StatusCode::BAD_REQUEST, &e.to_string()));
        }
    };

    let resp = match target {
        Target::Tunnel { authority } => {
            hook.on_tunnel(&authority);
            tunnel(req, authority).await
        }
        Target::Forward { host, addr, path } => {
            hook.on_request(&host, &path);
            forward(req, addr).await
        }
    };

    Ok(resp)
}

/// Dial the CONNECT target, then splice bytes once the client upgrades
async fn tunnel(req: Request<Incoming>, authority: String) -> Response<ProxyBody> {
    let mut upstream = match TcpStream::connect(&authority).await {
        Ok(stream) => stream,
        Err(e) => {
            debug!("Remote connection failed to {}: {}", authority, e);
            return error_response(StatusCode::BAD_GATEWAY, "Bad Gateway");
        }
    };

    tokio::spawn(async move {
        match hyper::upgrade::on(req).await {
            Ok(upgraded) => {
                let mut client = TokioIo::new(upgraded);
                if let Err(e) = tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
                    debug!("Tunnel error: {}", e);
                }
                debug!("Tunnel closed for {}", authority);
            }
            Err(e) => debug!("Upgrade failed for {}: {}", authority, e),
        }
    });

    Response::new(empty())
}

/// Send a plain HTTP request to its origin and relay the response
async fn forward(mut req: Request<Incoming>, addr: String) -> Response<ProxyBody> {
    if let Err(e) = to_origin_form(&mut req) {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }

    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            debug!("Remote connection failed to {}: {}", addr, e);
            return error_response(StatusCode::BAD_GATEWAY, "Bad Gateway");
        }
    };

    let (mut sender, conn) = match client::conn::http1::Builder::new()
        .preserve_header_case(true)
        .title_case_headers(true)
        .handshake(TokioIo::new(stream))
        .await
    {
        Ok(parts) => parts,
        Err(e) => {
            debug!("Handshake failed with {}: {}", addr, e);
            return error_response(StatusCode::BAD_GATEWAY, "Bad Gateway");
        }
    };

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!("Upstream connection failed: {}", e);
        }
    });

    match sender.send_request(req).await {
        Ok(resp) => resp.map(|body| body.boxed()),
        Err(e) => {
            debug!("Upstream request to {} failed: {}", addr, e);
            error_response(StatusCode::BAD_GATEWAY, "Bad Gateway")
        }
    }
}
