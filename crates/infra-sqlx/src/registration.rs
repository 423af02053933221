// Registration helpers for sqlx-backed probes

use crate::postgres::PostgresConnector;
use crate::sqlite::SqliteConnector;
use pulsecheck_core::application::{HealthChecksBuilder, ProbeRegistration};
use std::sync::Arc;

/// Default check name for SQLite probes
pub const SQLITE_NAME: &str = "sqlite";

/// Default check name for PostgreSQL probes
pub const POSTGRES_NAME: &str = "postgres";

pub type SqliteProbe = ProbeRegistration<SqliteConnector>;
pub type PostgresProbe = ProbeRegistration<PostgresConnector>;

/// Adds sqlx probes to a [`HealthChecksBuilder`]
///
/// # Example
/// ```text
/// let service = HealthChecksBuilder::new()
///     .add_sqlite("sqlite://app.db")
///     .add_postgres_with(
///         PostgresProbe::from_factory(|| settings.database_url())
///             .tags(["db"])
///             .timeout(Duration::from_secs(2)),
///     )
///     .build()?;
/// ```
pub trait SqlxChecksExt: Sized {
    /// SQLite probe with the default command and name
    fn add_sqlite(self, address: impl Into<String>) -> Self {
        self.add_sqlite_with(SqliteProbe::new(address))
    }

    fn add_sqlite_with(self, probe: SqliteProbe) -> Self;

    /// PostgreSQL probe with the default command and name
    fn add_postgres(self, address: impl Into<String>) -> Self {
        self.add_postgres_with(PostgresProbe::new(address))
    }

    fn add_postgres_with(self, probe: PostgresProbe) -> Self;
}

impl SqlxChecksExt for HealthChecksBuilder {
    fn add_sqlite_with(self, probe: SqliteProbe) -> Self {
        self.add(probe.into_registration(Arc::new(SqliteConnector), SQLITE_NAME))
    }

    fn add_postgres_with(self, probe: PostgresProbe) -> Self {
        self.add(probe.into_registration(Arc::new(PostgresConnector), POSTGRES_NAME))
    }
}
