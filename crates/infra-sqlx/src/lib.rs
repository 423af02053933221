// pulsecheck Infrastructure - sqlx Adapters
// Implements: Connector for SQLite and PostgreSQL, plus registration helpers

mod error;
mod postgres;
mod registration;
mod scalar;
mod sqlite;

pub use postgres::{PostgresConnector, PostgresProbeConnection};
pub use registration::{PostgresProbe, SqliteProbe, SqlxChecksExt, POSTGRES_NAME, SQLITE_NAME};
pub use sqlite::{SqliteConnector, SqliteProbeConnection};

// Re-exported so configure hooks can name the option types without a direct sqlx dependency
pub use sqlx::postgres::PgConnectOptions;
pub use sqlx::sqlite::SqliteConnectOptions;
