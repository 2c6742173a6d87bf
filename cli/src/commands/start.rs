use crate::helpers::{check_open_files_limit, initialize_logger, spawn_detached};

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Starts the mining-pool proxy.
#[derive(Debug, Parser)]
pub struct Start {
    /// Path to the JSON configuration file.
    #[clap(default_value = "config.json", short, long)]
    pub config: PathBuf,
    /// Run detached, tracking the child's PID in `mp.lock`.
    #[clap(short, long)]
    pub daemon: bool,
}

impl Start {
    pub fn parse(self) -> Result<String> {
        if self.daemon {
            let config_arg = self.config.to_string_lossy().into_owned();
            let pid = spawn_detached(&["--config", &config_arg])?;
            return Ok(format!("Started in the background, PID {pid}"));
        }

        Self::runtime()?.block_on(async move { self.run().await })
    }

    async fn run(self) -> Result<String> {
        let config = poolproxy_node::Config::load(&self.config)
            .with_context(|| format!("failed to load configuration from {}", self.config.display()))?;

        let _log_receiver = initialize_logger(config.logger.level, config.logger.mode == "file", &config.logger.file);

        check_open_files_limit(config.proxy.max_connections as u64 + 256);

        let node = poolproxy_node::Node::start(config).await.context("failed to start the proxy")?;

        tracing::info!("poolproxy is running, press Ctrl-C to stop");

        #[cfg(target_family = "unix")]
        {
            let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(target_family = "unix"))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        node.shutdown().await;
        Ok("Shutdown complete".to_string())
    }

    /// Builds the multi-threaded runtime backing the proxy.
    fn runtime() -> Result<tokio::runtime::Runtime> {
        let num_cpus = num_cpus::get();
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_stack_size(8 * 1024 * 1024)
            .worker_threads(num_cpus.clamp(2, 16))
            .build()
            .context("failed to build the tokio runtime")
    }
}
