// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, recovery, serving, shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use kvs_core::MemoryStore;
use kvs_storage::{
    restore, ErrorFeed, FileTransactionLogger, LoggerError, LoggerOptions, PostgresParams,
    PostgresTransactionLogger, RecoveryError, RecoveryStats, TracedTransactionLogger,
    TransactionLogger, WriteFailurePolicy,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{Backend, Config, ConfigError};
use crate::server::{self, AppState};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open {backend} transaction log: {source}")]
    OpenLogger {
        backend: &'static str,
        source: LoggerError,
    },

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error("failed to start transaction logger: {0}")]
    Logger(#[from] LoggerError),

    #[error("failed to bind {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub logger: Arc<dyn TransactionLogger>,
    pub listener: TcpListener,
    /// What replay restored at startup
    pub recovered: RecoveryStats,
    monitor: Option<JoinHandle<()>>,
    pub start_time: Instant,
}

/// Start the daemon: open the log, rebuild the store, go live, bind
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Open the backend; failure here is fatal
    let logger = open_logger(config).await?;

    // 2. Replay into a fresh store before accepting any writes
    let store = Arc::new(MemoryStore::new());
    let recovered = match restore(logger.as_ref(), store.as_ref()).await {
        Ok(stats) => stats,
        Err(e) => {
            error!(applied = store.len(), error = %e, "replay failed, refusing to serve");
            return Err(e.into());
        }
    };

    // 3. Go live, watching for asynchronous write failures
    let feed = logger.errors();
    logger.run()?;
    let monitor = spawn_error_monitor(feed);

    // 4. Bind LAST, once the store is complete
    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            if let Err(close_err) = logger.close().await {
                warn!(error = %close_err, "failed to close transaction log");
            }
            return Err(LifecycleError::BindFailed(config.bind_addr, e));
        }
    };

    info!(
        addr = %listener.local_addr()?,
        keys = store.len(),
        events = recovered.events,
        "daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        store,
        logger,
        listener,
        recovered,
        monitor,
        start_time: Instant::now(),
    })
}

/// Open the configured backend, wrapped with tracing
pub async fn open_logger(config: &Config) -> Result<Arc<dyn TransactionLogger>, LifecycleError> {
    match &config.backend {
        Backend::File { path } => {
            let options = LoggerOptions::new(WriteFailurePolicy::Halt)
                .with_queue_capacity(config.queue_capacity);
            let logger = FileTransactionLogger::open_with(path, options).map_err(|source| {
                LifecycleError::OpenLogger {
                    backend: "file",
                    source,
                }
            })?;
            info!(path = %path.display(), "opened file transaction log");
            Ok(Arc::new(TracedTransactionLogger::new(logger)))
        }
        Backend::Postgres {
            host,
            database,
            user,
            password,
            port,
        } => {
            let params = PostgresParams::new(host, database, user, password).with_port(*port);
            let options = LoggerOptions::new(WriteFailurePolicy::Continue)
                .with_queue_capacity(config.queue_capacity);
            let logger = PostgresTransactionLogger::connect_with(&params, options)
                .await
                .map_err(|source| LifecycleError::OpenLogger {
                    backend: "postgres",
                    source,
                })?;
            Ok(Arc::new(TracedTransactionLogger::new(logger)))
        }
    }
}

/// Log every error the committer reports until its feed closes
fn spawn_error_monitor(feed: Option<ErrorFeed>) -> Option<JoinHandle<()>> {
    let mut feed = feed?;
    Some(tokio::spawn(async move {
        while let Some(e) = feed.recv().await {
            error!(error = %e, "transaction log write failed");
        }
        debug!("error feed closed");
    }))
}

impl DaemonState {
    pub fn local_addr(&self) -> Result<SocketAddr, LifecycleError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve HTTP until `signal` resolves, then shut down
    pub async fn serve<F>(self, signal: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = AppState::new(self.store.clone(), self.logger.clone());
        let app = server::router(state);

        let DaemonState {
            listener,
            logger,
            monitor,
            start_time,
            ..
        } = self;

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await;
        if let Err(e) = &served {
            error!(error = %e, "server error");
        }

        shutdown(logger.as_ref(), monitor, start_time).await?;
        served.map_err(LifecycleError::Io)
    }
}

/// Drain the transaction log and wait for the error monitor
async fn shutdown(
    logger: &dyn TransactionLogger,
    monitor: Option<JoinHandle<()>>,
    start_time: Instant,
) -> Result<(), LifecycleError> {
    info!("Shutting down daemon...");

    // 1. Every acknowledged write reaches durable storage
    logger.close().await?;

    // 2. The feed closes with the committer, ending the monitor
    if let Some(monitor) = monitor {
        if let Err(e) = monitor.await {
            warn!(error = %e, "error monitor failed");
        }
    }

    info!(
        uptime_secs = start_time.elapsed().as_secs(),
        "Daemon shutdown complete"
    );
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
