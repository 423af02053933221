// SQLite Connector

use crate::error::{map_address_error, map_close_error, map_open_error, map_query_error};
use crate::scalar::sqlite_scalar;
use async_trait::async_trait;
use pulsecheck_core::domain::{ProbeError, ScalarValue};
use pulsecheck_core::port::{Connector, StoreConnection};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::Connection;
use std::str::FromStr;
use tracing::debug;

/// Opens single, unpooled SQLite connections
///
/// Addresses use sqlx URL syntax: `sqlite::memory:`, `sqlite://path/app.db?mode=ro`.
/// Missing database files are not created, so a wrong path reports Unhealthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

/// Open SQLite connection; dropping it closes the handle
#[derive(Debug)]
pub struct SqliteProbeConnection {
    inner: sqlx::SqliteConnection,
}

#[async_trait]
impl Connector for SqliteConnector {
    type Options = SqliteConnectOptions;
    type Connection = SqliteProbeConnection;

    fn prepare(&self, address: &str) -> Result<SqliteConnectOptions, ProbeError> {
        SqliteConnectOptions::from_str(address).map_err(map_address_error)
    }

    async fn open(
        &self,
        options: SqliteConnectOptions,
    ) -> Result<SqliteProbeConnection, ProbeError> {
        let inner = sqlx::SqliteConnection::connect_with(&options)
            .await
            .map_err(map_open_error)?;

        debug!("SQLite probe connection opened");
        Ok(SqliteProbeConnection { inner })
    }
}

#[async_trait]
impl StoreConnection for SqliteProbeConnection {
    async fn execute_scalar(&mut self, command: &str) -> Result<ScalarValue, ProbeError> {
        let row = sqlx::query(command)
            .fetch_optional(&mut self.inner)
            .await
            .map_err(map_query_error)?;

        match row {
            Some(row) => sqlite_scalar(&row),
            None => Ok(ScalarValue::Null),
        }
    }

    async fn close(self) -> Result<(), ProbeError> {
        self.inner.close().await.map_err(map_close_error)
    }
}
