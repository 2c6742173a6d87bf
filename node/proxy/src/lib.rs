mod error;
mod session;
mod wallet;

pub use error::SessionError;
pub use session::SessionDeps;

use poolproxy_node_sender::Sender;
use poolproxy_node_store::Store;
use poolproxy_node_tcp::Acceptor;
use poolproxy_node_upstream::UpstreamClient;
use poolproxy_node_verifier::Verifier;

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
};

/// Everything the proxy needs from config to bind its two listeners (spec.md §4.4/§4.2).
pub struct ProxyConfig {
    pub listen: SocketAddr,
    pub notify_listen: SocketAddr,
    pub max_connections: usize,
    pub timeout: Duration,
    pub pool_target: String,
}

/// Owns the miner-facing TCP acceptor and the upstream notify receiver, and the Sender
/// that sits between them. Mirrors `original_source/core/proxy.go::Proxy`, minus the raw
/// session-pointer set it kept for itself — session registration now lives entirely in
/// the Sender's subscriber map (spec.md §9, DESIGN.md).
pub struct Proxy {
    sender: Arc<Sender>,
    acceptor_quit: Arc<Notify>,
    notify_quit: Arc<Notify>,
    accept_task: JoinHandle<()>,
    notify_task: JoinHandle<()>,
}

impl Proxy {
    /// Binds the stratum listener and the notify HTTP server and starts accepting.
    pub async fn start(
        config: ProxyConfig,
        store: Arc<Mutex<Store>>,
        upstream: UpstreamClient,
        verifier: Arc<Verifier>,
    ) -> std::io::Result<Self> {
        let (sender, inbound_tx) = Sender::spawn(config.pool_target.clone());

        let acceptor = Acceptor::bind(config.listen, config.max_connections).await?;
        let acceptor_quit = acceptor.quit_handle();

        let next_session_id = Arc::new(AtomicU64::new(1));
        let deps = SessionDeps {
            sender: sender.clone(),
            store,
            upstream,
            verifier,
            pool_target: config.pool_target.clone(),
            timeout: config.timeout,
        };

        let accept_task = tokio::spawn(acceptor.run(move |socket, peer_addr, permit| {
            let deps = deps.clone();
            let next_session_id = next_session_id.clone();
            let session_id = next_session_id.fetch_add(1, Ordering::Relaxed);
            async move {
                session::run_session(socket, peer_addr, permit, session_id, deps).await;
            }
        }));

        let notify_quit = Arc::new(Notify::new());
        let notify_quit_wait = notify_quit.clone();
        let notify_listen = config.notify_listen;
        let notify_task = tokio::spawn(async move {
            if let Err(error) =
                poolproxy_node_notify::serve(notify_listen, inbound_tx, wait_for_quit(notify_quit_wait)).await
            {
                tracing::error!(%error, "notify receiver exited with an error");
            }
        });

        tracing::info!(listen = %config.listen, notify = %config.notify_listen, "proxy started");
        Ok(Self { sender, acceptor_quit, notify_quit, accept_task, notify_task })
    }

    /// Handle to the fan-out engine, e.g. for the State Aggregator to read `latestWork`.
    pub fn sender(&self) -> Arc<Sender> {
        self.sender.clone()
    }

    /// Stops the acceptor and the notify receiver, then waits for both to exit.
    /// In-flight sessions are not forcibly closed — they drain on their own idle
    /// deadline or the next failed write, matching spec.md §5's shutdown rule.
    pub async fn shutdown(self) {
        self.acceptor_quit.notify_one();
        self.notify_quit.notify_one();
        let _ = self.accept_task.await;
        let _ = self.notify_task.await;
    }
}

async fn wait_for_quit(quit: Arc<Notify>) {
    quit.notified().await;
}
