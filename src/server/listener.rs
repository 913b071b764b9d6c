//! Camera stream server
//!
//! Binds the HTTP listener, owns the registry for the lifetime of the
//! process and runs the background reaper next to it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::config::ServerConfig;
use super::routes::{router, AppState};
use crate::camera::CameraDirectory;
use crate::error::Result;
use crate::registry::StreamRegistry;
use crate::source::SourceConnector;

/// Camera stream server
pub struct CamServer {
    config: Arc<ServerConfig>,
    registry: Arc<StreamRegistry>,
    directory: Arc<dyn CameraDirectory>,
}

impl CamServer {
    /// Create a new server
    pub fn new(
        config: ServerConfig,
        directory: Arc<dyn CameraDirectory>,
        connector: Arc<dyn SourceConnector>,
    ) -> Self {
        let registry = Arc::new(StreamRegistry::with_config(connector, config.registry.clone()));

        Self {
            config: Arc::new(config),
            registry,
            directory,
        }
    }

    /// Get a reference to the stream registry
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Router serving this server's state
    pub fn router(&self) -> Router {
        router(AppState {
            registry: Arc::clone(&self.registry),
            directory: Arc::clone(&self.directory),
            config: Arc::clone(&self.config),
        })
    }

    /// Run the server until the process is killed
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    ///
    /// Streams left over from a previous run are stopped before the first
    /// request. On shutdown the registry is closed first: no new stream can
    /// start, and stopping every worker ends open live responses so the
    /// graceful drain can complete.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.registry.shutdown_all().await;

        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            streaming = self.config.streaming_enabled,
            reap_interval_secs = self.config.registry.reap_interval.as_secs(),
            "Camera stream server listening"
        );

        let cancel = CancellationToken::new();
        let reaper = self.registry.spawn_reaper(cancel.clone());

        let registry = Arc::clone(&self.registry);
        let reaper_cancel = cancel.clone();
        let signal = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            reaper_cancel.cancel();
            registry.close().await;
        };

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await;

        // Stop reaper on shutdown
        cancel.cancel();
        if let Err(e) = reaper.await {
            tracing::warn!(error = %e, "Reaper task failed");
        }

        self.registry.close().await;
        tracing::info!("Camera stream server stopped");

        result.map_err(Into::into)
    }
}
