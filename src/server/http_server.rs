use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

use super::request::parse_request;
use super::service::AppService;

/// Wrapper around a `tiny_http` server driving an [`AppService`].
pub struct HttpServer(pub AppService);

/// Handle to a running HTTP server
pub struct ServerHandle {
    addr: SocketAddr,
    server: Arc<tiny_http::Server>,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to (useful after binding port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if no connection succeeds within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting requests and wait for the accept loop to exit.
    pub fn stop(self) {
        self.server.unblock();
        if self.handle.join().is_err() {
            warn!("server thread panicked");
        }
    }

    /// Block until the accept loop exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the server thread panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl HttpServer {
    /// Bind `addr` and serve requests one at a time on a background thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let server = tiny_http::Server::http(addr).map_err(io::Error::other)?;
        let addr = server.server_addr().to_ip().unwrap_or(addr);
        let server = Arc::new(server);
        info!(%addr, "listening");

        let service = self.0;
        let accept = Arc::clone(&server);
        let handle = thread::Builder::new()
            .name("skelgen-http".to_string())
            .spawn(move || {
                for mut request in accept.incoming_requests() {
                    let parsed = parse_request(&mut request);
                    let response = service.call(&parsed).into_http();
                    if let Err(err) = request.respond(response) {
                        warn!(error = %err, "failed to write response");
                    }
                }
                info!("server stopped");
            })?;
        Ok(ServerHandle {
            addr,
            server,
            handle,
        })
    }
}
