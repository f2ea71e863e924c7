// TCP accept loop and the per-connection proxy pipeline
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use uuid::Uuid;

use crate::blocklist::Blocklist;
use crate::config::Srv;
use crate::http::{self, HttpRequest, HttpResponse};
use crate::records::{RequestRecord, ResponseRecord};
use crate::registry::{BackendTarget, Registry};
use crate::sink::LogSink;

pub struct Proxy {
    cfg: Srv,
    registry: Registry,
    blocklist: Arc<Blocklist>,
    requests: Arc<LogSink<RequestRecord>>,
    responses: Arc<LogSink<ResponseRecord>>,
}

impl Proxy {
    pub fn new(cfg: Srv, registry: Registry) -> Self {
        let blocklist = Arc::new(Blocklist::new(cfg.blocklist_file.as_str(), cfg.blocklist_reload));
        let requests = Arc::new(LogSink::new(cfg.request_log.as_str(), cfg.flush_threshold, cfg.flush_interval));
        let responses = Arc::new(LogSink::new(cfg.response_log.as_str(), cfg.flush_threshold, cfg.flush_interval));
        Proxy { cfg, registry, blocklist, requests, responses }
    }

    pub fn blocklist(&self) -> &Arc<Blocklist> {
        &self.blocklist
    }

    /// Start the stateful collaborators: blocklist reconciliation and the
    /// two sink flush timers.
    pub fn start(self: &Arc<Self>) {
        self.blocklist.start();
        self.requests.start();
        self.responses.start();
    }

    /// Stop the collaborators. The sinks flush once more so nothing
    /// buffered is lost.
    pub fn shutdown(&self) {
        self.blocklist.stop();
        self.requests.stop();
        self.responses.stop();
        crate::log::info(&format!("Totals: {}", crate::metrics::summary()));
    }

    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.cfg.listen_addr).await?;
        crate::log::info(&format!("Listening on {}", self.cfg.listen_addr));
        let proxy = Arc::new(self);
        proxy.start();
        tokio::select! {
            r = Self::accept_loop(Arc::clone(&proxy), listener) => r?,
            _ = tokio::signal::ctrl_c() => {
                crate::log::info("Shutting down...");
            }
        }
        proxy.shutdown();
        crate::log::info("Server stopped.");
        Ok(())
    }

    /// One lightweight task per accepted connection; accept errors are
    /// logged and the loop keeps serving.
    pub async fn accept_loop(proxy: Arc<Self>, listener: TcpListener) -> std::io::Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let proxy = Arc::clone(&proxy);
                    tokio::spawn(async move {
                        proxy.handle_client(stream, addr).await;
                    });
                }
                Err(e) => {
                    crate::log::error(&format!("Accept error: {e}"));
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }

    async fn handle_client(self: Arc<Self>, mut client: TcpStream, peer: std::net::SocketAddr) {
        crate::metrics::inc_connections();
        let client_ip = peer.ip().to_string();

        let mut buf = vec![0u8; self.cfg.buffer_size];
        let n = match client.read(&mut buf).await {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) => {
                crate::log::debug(&format!("Client read error from {client_ip}: {e}"));
                return;
            }
        };
        buf.truncate(n);
        crate::metrics::add_bytes_in(n as u64);

        let is_upgrade = http::is_websocket_upgrade(&buf);

        // Checked before any parsing or backend I/O is spent on the request.
        if self.blocklist.is_blocked(&client_ip) {
            crate::metrics::inc_blocked();
            crate::log::warn(&format!("Blocked request from {client_ip}"));
            let _ = client.write_all(&HttpResponse::proxy_error(403, "Your IP is blocked")).await;
            let _ = client.shutdown().await;
            return;
        }

        let mut req = match HttpRequest::parse(&buf) {
            Some(r) => r,
            None => {
                crate::log::debug(&format!("Unparseable request from {client_ip}"));
                return;
            }
        };
        crate::metrics::inc_requests();
        crate::log::request(&req.method, &req.path, &client_ip);

        let id = Uuid::new_v4();
        let record = RequestRecord::new(id, &client_ip, &req);
        let sink = Arc::clone(&self.requests);
        tokio::spawn(async move { sink.add(record) });

        let host = match req.get_header("Host") {
            Some(h) => h.to_string(),
            None => {
                crate::log::warn("No Host header found in request");
                return;
            }
        };
        let target = match self.registry.resolve(&host) {
            Some(t) => t,
            None => {
                crate::log::warn(&format!("No backend found for host: {host}"));
                let _ = client.write_all(&HttpResponse::proxy_error(502, "No backend found")).await;
                let _ = client.shutdown().await;
                return;
            }
        };
        crate::log::route(&host, &target.addr());

        let connect = TcpStream::connect((target.host.as_str(), target.port));
        let mut backend = match timeout(Duration::from_secs(self.cfg.connect_timeout), connect).await {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                crate::metrics::inc_backend_errors();
                crate::log::error(&format!("Error connecting to backend {}: {e}", target.addr()));
                let _ = client.write_all(&HttpResponse::proxy_error(502, "Backend connection error")).await;
                let _ = client.shutdown().await;
                return;
            }
            Err(_) => {
                crate::metrics::inc_backend_errors();
                crate::log::error(&format!("Timeout connecting to backend {}", target.addr()));
                let _ = client.write_all(&HttpResponse::proxy_error(504, "Backend connection timed out")).await;
                let _ = client.shutdown().await;
                return;
            }
        };

        req.rewrite_for_backend(&target.host, target.port);
        if let Err(e) = backend.write_all(&req.to_bytes()).await {
            crate::metrics::inc_backend_errors();
            crate::log::error(&format!("Error writing to backend {}: {e}", target.addr()));
            return;
        }

        if is_upgrade {
            crate::metrics::inc_tunnels();
            tunnel(client, backend, self.cfg.buffer_size).await;
        } else {
            self.stream_response(id, &mut client, &mut backend, &target).await;
            if let Err(e) = backend.shutdown().await {
                crate::log::debug(&format!("Error closing backend connection: {e}"));
            }
            if let Err(e) = client.shutdown().await {
                crate::log::debug(&format!("Error closing client connection: {e}"));
            }
        }
    }

    /// Chunked relay of an ordinary HTTP response. The first chunk is also
    /// parsed for the response record; a read timeout or error just ends the
    /// loop, and whatever already reached the client stands.
    async fn stream_response(
        &self,
        id: Uuid,
        client: &mut TcpStream,
        backend: &mut TcpStream,
        target: &BackendTarget,
    ) {
        let mut buf = vec![0u8; self.cfg.buffer_size];
        let mut first = true;
        loop {
            let n = match timeout(Duration::from_secs(self.cfg.read_timeout), backend.read(&mut buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    crate::log::error(&format!("Error reading from backend {}: {e}", target.addr()));
                    break;
                }
                Err(_) => {
                    crate::log::error(&format!("Timeout reading from backend {}", target.addr()));
                    break;
                }
            };
            if first {
                first = false;
                if let Some(resp) = HttpResponse::parse(&buf[..n]) {
                    let record = ResponseRecord::new(id, &resp);
                    let sink = Arc::clone(&self.responses);
                    tokio::spawn(async move { sink.add(record) });
                }
            }
            crate::metrics::add_bytes_out(n as u64);
            if client.write_all(&buf[..n]).await.is_err() {
                break;
            }
        }
    }
}

/// Raw bidirectional relay for upgraded connections. The first direction to
/// reach end-of-stream aborts the other, so no loop is left waiting on a
/// peer that will never send again.
async fn tunnel(client: TcpStream, backend: TcpStream, buf_size: usize) {
    let (client_read, client_write) = client.into_split();
    let (backend_read, backend_write) = backend.into_split();
    let mut c2b = tokio::spawn(pump(client_read, backend_write, buf_size, crate::metrics::add_bytes_in));
    let mut b2c = tokio::spawn(pump(backend_read, client_write, buf_size, crate::metrics::add_bytes_out));
    tokio::select! {
        _ = &mut c2b => b2c.abort(),
        _ = &mut b2c => c2b.abort(),
    }
}

async fn pump(mut r: OwnedReadHalf, mut w: OwnedWriteHalf, buf_size: usize, count: fn(u64)) {
    let mut buf = vec![0u8; buf_size];
    loop {
        match r.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                count(n as u64);
                if w.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    let _ = w.shutdown().await;
}
