// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PostgreSQL-backed transaction logger
//!
//! Each event is one row of the `transactions` table. Sequence numbers are
//! assigned by the database (`BIGSERIAL`), not by this process.

use crate::commit::{CommitQueue, EventSink};
use crate::error::LoggerError;
use crate::logger::{
    require_key, ErrorFeed, LoggerOptions, Replay, TransactionLogger, WriteFailurePolicy,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use kvs_core::{Event, EventType};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tokio::sync::mpsc;

const TABLE_EXISTS: &str = "SELECT EXISTS (SELECT FROM pg_tables \
     WHERE schemaname = 'public' AND tablename = 'transactions')";

const CREATE_TABLE: &str = "CREATE TABLE transactions (
    sequence   BIGSERIAL PRIMARY KEY,
    event_type SMALLINT NOT NULL,
    key        TEXT,
    value      TEXT
)";

const INSERT_EVENT: &str =
    "INSERT INTO transactions (event_type, key, value) VALUES ($1, $2, $3) RETURNING sequence";

const SELECT_EVENTS: &str =
    "SELECT sequence, event_type, key, value FROM transactions ORDER BY sequence";

/// Connection parameters for the relational backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresParams {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

impl PostgresParams {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            port: 5432,
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Transaction logger writing rows to PostgreSQL
pub struct PostgresTransactionLogger {
    pool: PgPool,
    queue: CommitQueue,
}

impl PostgresTransactionLogger {
    /// Connect and bootstrap the table; write failures are reported and skipped
    pub async fn connect(params: &PostgresParams) -> Result<Self, LoggerError> {
        Self::connect_with(params, LoggerOptions::new(WriteFailurePolicy::Continue)).await
    }

    pub async fn connect_with(
        params: &PostgresParams,
        options: LoggerOptions,
    ) -> Result<Self, LoggerError> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(params.connect_timeout)
            .connect_with(params.connect_options())
            .await?;

        tracing::info!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            "connected to postgres"
        );
        Self::from_pool(pool, options).await
    }

    /// Use an existing pool, creating the `transactions` table if needed
    pub async fn from_pool(pool: PgPool, options: LoggerOptions) -> Result<Self, LoggerError> {
        let exists: bool = sqlx::query_scalar(TABLE_EXISTS).fetch_one(&pool).await?;
        if !exists {
            sqlx::query(CREATE_TABLE).execute(&pool).await?;
            tracing::info!("created transactions table");
        }

        Ok(Self {
            pool,
            queue: CommitQueue::new(options),
        })
    }

    pub fn options(&self) -> LoggerOptions {
        self.queue.options()
    }
}

#[async_trait]
impl TransactionLogger for PostgresTransactionLogger {
    async fn write_put(&self, key: &str, value: &str) -> Result<(), LoggerError> {
        require_key(key)?;
        self.queue.enqueue(Event::put(key, value)).await
    }

    async fn write_delete(&self, key: &str) -> Result<(), LoggerError> {
        require_key(key)?;
        self.queue.enqueue(Event::delete(key)).await
    }

    fn errors(&self) -> Option<ErrorFeed> {
        self.queue.errors()
    }

    fn read_events(&self) -> Replay {
        let (event_tx, error_tx, replay) = Replay::channel();
        let pool = self.pool.clone();

        tokio::spawn(async move {
            match replay_table(&pool, &event_tx).await {
                Ok(Some(count)) => tracing::debug!(count, "replay finished"),
                Ok(None) => tracing::debug!("replay abandoned by consumer"),
                Err(e) => {
                    let _ = error_tx.send(e).await;
                }
            }
        });

        replay
    }

    fn run(&self) -> Result<(), LoggerError> {
        self.queue.start(PostgresSink {
            pool: self.pool.clone(),
        })
    }

    async fn close(&self) -> Result<(), LoggerError> {
        self.queue.close().await?;
        self.pool.close().await;
        Ok(())
    }
}

struct PostgresSink {
    pool: PgPool,
}

#[async_trait]
impl EventSink for PostgresSink {
    async fn append(&mut self, event: &Event) -> Result<u64, LoggerError> {
        let value = match event.event_type {
            EventType::Put => Some(event.value.as_str()),
            EventType::Delete => None,
        };

        let sequence: i64 = sqlx::query_scalar(INSERT_EVENT)
            .bind(i16::from(event.event_type.code()))
            .bind(&event.key)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;

        Ok(to_sequence(sequence))
    }
}

// BIGSERIAL never yields negatives; anything else fails the ordering check
fn to_sequence(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

async fn replay_table(
    pool: &PgPool,
    events: &mpsc::Sender<Event>,
) -> Result<Option<u64>, LoggerError> {
    let mut rows = sqlx::query_as::<_, (i64, i16, Option<String>, Option<String>)>(SELECT_EVENTS)
        .fetch(pool);

    let mut previous = 0;
    let mut count = 0;

    while let Some((sequence, event_type, key, value)) = rows.try_next().await? {
        let sequence = to_sequence(sequence);
        if sequence <= previous {
            return Err(LoggerError::OutOfOrder {
                previous,
                found: sequence,
            });
        }
        previous = sequence;

        let event = event_from_row(sequence, event_type, key, value)?;
        if events.send(event).await.is_err() {
            return Ok(None);
        }
        count += 1;
    }

    Ok(Some(count))
}

/// Decode one `transactions` row; ordering is checked by the caller
fn event_from_row(
    sequence: u64,
    event_type: i16,
    key: Option<String>,
    value: Option<String>,
) -> Result<Event, LoggerError> {
    let event_type = EventType::try_from(event_type)?;
    let key = key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| LoggerError::InvalidRow {
            sequence,
            reason: "missing key".to_string(),
        })?;
    let value = match event_type {
        EventType::Put => value.unwrap_or_default(),
        EventType::Delete => String::new(),
    };

    Ok(Event {
        sequence,
        event_type,
        key,
        value,
    })
}

#[cfg(test)]
#[path = "postgres_tests.rs"]
mod tests;
