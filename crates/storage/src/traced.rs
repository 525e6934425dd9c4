// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced logger wrapper for consistent observability

use crate::error::LoggerError;
use crate::logger::{require_key, ErrorFeed, Replay, TransactionLogger};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any TransactionLogger
#[derive(Clone)]
pub struct TracedTransactionLogger<L> {
    inner: L,
}

impl<L> TracedTransactionLogger<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: TransactionLogger> TransactionLogger for TracedTransactionLogger<L> {
    async fn write_put(&self, key: &str, value: &str) -> Result<(), LoggerError> {
        let span = tracing::debug_span!("txlog.write_put", key, value_len = value.len());

        async {
            // Precondition: keys are never empty
            if let Err(e) = require_key(key) {
                tracing::warn!(error = %e, "rejected");
                return Err(e);
            }

            let start = std::time::Instant::now();
            let result = self.inner.write_put(key, value).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "queued"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "write failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn write_delete(&self, key: &str) -> Result<(), LoggerError> {
        let span = tracing::debug_span!("txlog.write_delete", key);

        async {
            if let Err(e) = require_key(key) {
                tracing::warn!(error = %e, "rejected");
                return Err(e);
            }

            let result = self.inner.write_delete(key).await;
            match &result {
                Ok(()) => tracing::debug!("queued"),
                Err(e) => tracing::error!(error = %e, "write failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn errors(&self) -> Option<ErrorFeed> {
        let feed = self.inner.errors();
        tracing::trace!(taken = feed.is_some(), "error feed requested");
        feed
    }

    fn read_events(&self) -> Replay {
        let _span = tracing::info_span!("txlog.read_events").entered();
        tracing::info!("replay starting");
        self.inner.read_events()
    }

    fn run(&self) -> Result<(), LoggerError> {
        let _span = tracing::info_span!("txlog.run").entered();

        let result = self.inner.run();
        match &result {
            Ok(()) => tracing::info!("committer started"),
            Err(e) => tracing::error!(error = %e, "start failed"),
        }
        result
    }

    async fn close(&self) -> Result<(), LoggerError> {
        let span = tracing::info_span!("txlog.close");

        async {
            let start = std::time::Instant::now();
            let result = self.inner.close().await;
            let elapsed = start.elapsed();

            // Closing twice is harmless
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "closed"),
                Err(e) => tracing::warn!(error = %e, "close failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
