use crate::config::Config;

use poolproxy_node_aggregator::Aggregator;
use poolproxy_node_harvester::Harvester;
use poolproxy_node_proxy::{Proxy, ProxyConfig};
use poolproxy_node_store::Store;
use poolproxy_node_upstream::UpstreamClient;
use poolproxy_node_verifier::Verifier;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};

/// Owns the upstream client and the store, and conditionally owns a [`Proxy`], a state
/// [`Aggregator`], and a [`Harvester`] per `proxy.enabled`/`harvester.enabled` (spec.md
/// §4.9, grounded on `original_source/core/server.go`'s `Start`/`Close`).
pub struct Node {
    store: Arc<Mutex<Store>>,
    proxy: Option<Proxy>,
    aggregator: Option<Aggregator>,
    harvester: Option<Harvester>,
    debugger: Option<JoinHandle<()>>,
}

impl Node {
    pub async fn start(config: Config) -> Result<Self> {
        let debugger = if config.debugger.enable {
            tracing::info!(listen = %config.debugger.listen, "diagnostics endpoint enabled");
            Some(poolproxy_node_metrics::initialize_metrics(config.debugger.listen))
        } else {
            None
        };

        let store = Store::connect(&config.postgres.address, &config.postgres.database, &config.postgres.username, &config.postgres.password)
            .await
            .context("failed to connect to postgres")?;
        let store = Arc::new(Mutex::new(store));

        let upstream = UpstreamClient::new(&config.proxy.daemon.host, config.proxy.daemon.port, config.proxy.daemon.chain);

        let mut proxy = None;
        let mut aggregator = None;

        if config.proxy.enabled {
            let verifier = Arc::new(Verifier::new(std::env::temp_dir().join("poolproxy-ethash")));
            let proxy_config = ProxyConfig {
                listen: config.proxy.listen,
                notify_listen: config.proxy.daemon.notify_listen,
                max_connections: config.proxy.max_connections,
                timeout: config.proxy.timeout,
                pool_target: config.proxy.target.clone(),
            };
            let started = Proxy::start(proxy_config, store.clone(), upstream.clone(), verifier).await.context("failed to start the proxy")?;

            aggregator = Some(Aggregator::spawn(config.proxy.state_interval, store.clone(), started.sender(), upstream.clone()));
            proxy = Some(started);
        }

        let harvester = if config.harvester.enabled {
            Some(Harvester::spawn(config.harvester.interval, store.clone(), upstream.clone(), config.harvester.as_harvester_config()))
        } else {
            None
        };

        Ok(Self { store, proxy, aggregator, harvester, debugger })
    }

    /// Closes components in the order `proxy -> aggregator -> harvester`, then lets the
    /// store's connection drop — mirrors `server.go::Close`'s `proxy.Close();
    /// postgres.Close(); harvester.Close()`, with the aggregator (absent from the
    /// original) closed between the two since it depends on the proxy's Sender.
    pub async fn shutdown(self) {
        if let Some(proxy) = self.proxy {
            proxy.shutdown().await;
        }
        if let Some(aggregator) = self.aggregator {
            aggregator.shutdown().await;
        }
        if let Some(harvester) = self.harvester {
            harvester.shutdown().await;
        }
        if let Some(debugger) = self.debugger {
            debugger.abort();
        }
        drop(self.store);
    }
}
