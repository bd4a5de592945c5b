//! Static preview server for the output directory.
//!
//! Files are served literally from the output root; directories without an
//! `index.html` get a generated listing.

mod lifecycle;
mod listing;
mod network;
mod path;
mod response;

use crate::{config::ProjectConfig, error, log};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tiny_http::{Request, Server};

use path::Target;

/// Worker threads answering requests.
const REQUEST_WORKERS: usize = 4;

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    root: PathBuf,
}

/// A running request loop.
pub struct ServerHandle {
    server: Arc<Server>,
    thread: JoinHandle<()>,
}

/// Bind the preview server for `config`, register it for Ctrl+C and start
/// serving on a background thread.
pub fn start_server(config: &ProjectConfig) -> Result<ServerHandle> {
    let bound = BoundServer::bind(
        config.serve.interface,
        config.serve.port,
        &config.build.output,
    )?;
    // Ctrl+C unblocks the request loop through this handle
    crate::core::register_server(Arc::clone(&bound.server));
    bound.report();
    bound.spawn()
}

impl BoundServer {
    /// Bind without starting the request loop.
    pub fn bind(interface: std::net::IpAddr, port: u16, root: &Path) -> Result<Self> {
        let (server, addr) = lifecycle::bind(interface, port)?;
        Ok(Self {
            server: Arc::new(server),
            addr,
            root: root.to_path_buf(),
        })
    }

    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Log the loopback and LAN URLs.
    pub fn report(&self) {
        let port = self.addr().port();
        let host = network::local_network_host();
        log!("serve"; "Server running at:");
        log!("serve"; "  Local:    http://{}:{}", network::LOOPBACK_HOST, port);
        log!("serve"; "  Network:  http://{}:{}", host, port);
    }

    /// Start the request loop on a background thread.
    pub fn spawn(self) -> Result<ServerHandle> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_WORKERS)
            .thread_name(|i| format!("mjml-serve-{i}"))
            .build()
            .context("Failed to create request thread pool")?;

        let server = Arc::clone(&self.server);
        let root = Arc::new(self.root);
        let thread = thread::Builder::new()
            .name("mjml-serve".into())
            .spawn(move || run_request_loop(&server, &pool, &root))
            .context("Failed to spawn server thread")?;

        Ok(ServerHandle {
            server: self.server,
            thread,
        })
    }
}

impl ServerHandle {
    /// Unblock the request loop and wait for it to exit.
    pub fn stop(self) {
        self.server.unblock();
        let _ = self.thread.join();
    }
}

fn run_request_loop(server: &Server, pool: &rayon::ThreadPool, root: &Arc<PathBuf>) {
    for request in server.incoming_requests() {
        let root = Arc::clone(root);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &root) {
                error!("serve"; "request error: {:#}", e);
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, root: &Path) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !response::is_allowed_method(&request) {
        return response::respond_method_not_allowed(request);
    }

    match path::resolve_path(request.url(), root) {
        Some(Target::File(file)) => response::respond_file(request, &file),
        Some(Target::Directory(dir)) => {
            let url_path = path::normalize_url(request.url());
            match listing::render_listing(&dir, &url_path) {
                Ok(html) => response::respond_listing(request, html),
                Err(e) => {
                    let e = anyhow::Error::from(e)
                        .context(format!("Failed to list {}", dir.display()));
                    response::respond_internal_error(request, &e)
                }
            }
        }
        None => response::respond_not_found(request),
    }
}
