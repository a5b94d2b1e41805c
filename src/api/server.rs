//! Synchronous HTTP front end.
//!
//! One [`tiny_http::Server`] listener shared by a small pool of worker
//! threads. Each worker blocks on the accept queue with a timeout so it can
//! notice the shutdown flag; requests in flight finish before their worker
//! exits. No async runtime, no executor: directory walks are blocking disk
//! work, so threads are the honest shape for this server.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info};
use tiny_http::Server;

use crate::api::{handlers, ServeError};
use crate::sizing::Aggregator;

/// How long a worker blocks on the accept queue before rechecking the
/// shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// HTTP server over a shared aggregation engine.
pub struct ApiServer {
    server: Arc<Server>,
    sizes: Arc<Aggregator>,
    workers: usize,
}

impl ApiServer {
    /// Bind `addr`, e.g. `127.0.0.1:8080`. Port 0 asks the OS for a free
    /// port; read it back with [`ApiServer::local_addr`].
    ///
    /// # Errors
    ///
    /// [`ServeError::Bind`] when the socket cannot be opened.
    pub fn bind(addr: &str, sizes: Arc<Aggregator>, workers: usize) -> Result<Self, ServeError> {
        let server = Server::http(addr).map_err(|err| ServeError::Bind {
            addr: addr.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            server: Arc::new(server),
            sizes,
            workers: workers.max(1),
        })
    }

    /// The address actually bound.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve until `shutdown` turns true, then drain the workers.
    ///
    /// Blocks the calling thread for the life of the server.
    pub fn run(&self, shutdown: &Arc<AtomicBool>) {
        info!(
            "Serving {} on {} worker threads",
            self.sizes.root().display(),
            self.workers
        );

        let mut handles = Vec::with_capacity(self.workers);
        for worker in 0..self.workers {
            let server = Arc::clone(&self.server);
            let sizes = Arc::clone(&self.sizes);
            let shutdown = Arc::clone(shutdown);
            handles.push(thread::spawn(move || {
                debug!("Worker {} ready", worker);
                while !shutdown.load(Ordering::SeqCst) {
                    match server.recv_timeout(POLL_INTERVAL) {
                        Ok(Some(request)) => handlers::handle_request(&sizes, request),
                        Ok(None) => {}
                        Err(err) => {
                            error!("Worker {} lost the listener: {}", worker, err);
                            break;
                        }
                    }
                }
                debug!("Worker {} stopped", worker);
            }));
        }

        for handle in handles {
            if handle.join().is_err() {
                error!("A worker thread panicked");
            }
        }
        info!("All workers drained");
    }
}

impl std::fmt::Debug for ApiServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiServer")
            .field("addr", &self.local_addr())
            .field("workers", &self.workers)
            .finish()
    }
}
