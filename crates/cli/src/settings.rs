//! Probe file loading
//!
//! The probe file lists the checks to run. TOML, YAML and JSON are accepted
//! (picked by extension), and `PULSECHECK__*` environment variables override
//! top-level keys:
//!
//! ```toml
//! default_timeout_ms = 5000
//!
//! [[probes]]
//! name = "app-db"
//! kind = "sqlite"
//! address = "sqlite://var/app.db"
//! tags = ["db"]
//!
//! [[probes]]
//! kind = "postgres"
//! address_env = "DATABASE_URL"
//! failure_status = "Degraded"
//! degraded_above = 100
//! command = "SELECT count(*) FROM pending_jobs"
//! ```

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use pulsecheck_core::application::{HealthChecksBuilder, ProbeRegistration};
use pulsecheck_core::domain::{HealthStatus, ProbeOutcome};
use pulsecheck_core::port::Connector;
use pulsecheck_infra_sqlx::{
    PgConnectOptions, PostgresProbe, SqliteConnectOptions, SqliteProbe, SqlxChecksExt,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_APPLICATION_NAME: &str = "pulsecheck";
const PROBE_FILE_NAME: &str = "pulsecheck.toml";
const ENV_PREFIX: &str = "PULSECHECK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeSettings {
    /// Check name; defaults to the kind
    pub name: Option<String>,
    pub kind: ProbeKind,
    pub address: Option<String>,
    /// Environment variable read for the address when the checks are built
    pub address_env: Option<String>,
    pub command: Option<String>,
    pub failure_status: Option<HealthStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub timeout_ms: Option<u64>,
    /// Report Degraded when the command's integer result exceeds this value
    pub degraded_above: Option<i64>,
    /// SQLite only
    pub busy_timeout_ms: Option<u64>,
    /// PostgreSQL only
    pub application_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default)]
    pub probes: Vec<ProbeSettings>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Platform config dir + `pulsecheck.toml`, or the working directory
pub fn default_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "pulsecheck")
        .map(|dirs| dirs.config_dir().join(PROBE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(PROBE_FILE_NAME))
}

/// Load the probe file at `path`, applying environment overrides
pub fn load(path: &Path) -> Result<Settings> {
    Config::builder()
        .add_source(File::from(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read probe file {}", path.display()))?
        .try_deserialize()
        .with_context(|| format!("Invalid probe file {}", path.display()))
}

/// Parse probe settings from a string (no environment overrides)
pub fn parse(contents: &str, format: FileFormat) -> Result<Settings> {
    Config::builder()
        .add_source(File::from_str(contents, format))
        .build()
        .context("Failed to parse probe settings")?
        .try_deserialize()
        .context("Invalid probe settings")
}

impl Settings {
    /// Register every probe; registration attributes are validated on build
    pub fn into_builder(self) -> Result<HealthChecksBuilder> {
        let default_timeout = Duration::from_millis(self.default_timeout_ms);

        self.probes
            .into_iter()
            .enumerate()
            .try_fold(HealthChecksBuilder::new(), |builder, (index, probe)| {
                probe
                    .register(builder, default_timeout)
                    .with_context(|| format!("Invalid probe #{}", index + 1))
            })
    }
}

impl ProbeSettings {
    fn register(
        self,
        builder: HealthChecksBuilder,
        default_timeout: Duration,
    ) -> Result<HealthChecksBuilder> {
        match self.kind {
            ProbeKind::Sqlite => {
                let mut probe: SqliteProbe = self.registration(default_timeout)?;
                if let Some(ms) = self.busy_timeout_ms {
                    probe = probe.configure(sqlite_busy_timeout(Duration::from_millis(ms)));
                }
                Ok(builder.add_sqlite_with(probe))
            }
            ProbeKind::Postgres => {
                let application_name = self
                    .application_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string());
                let probe: PostgresProbe = self
                    .registration(default_timeout)?
                    .configure(postgres_application_name(application_name));
                Ok(builder.add_postgres_with(probe))
            }
        }
    }

    fn registration<C: Connector>(
        &self,
        default_timeout: Duration,
    ) -> Result<ProbeRegistration<C>> {
        let mut probe = match (&self.address, &self.address_env) {
            (Some(address), None) => ProbeRegistration::new(address.clone()),
            (None, Some(var)) => {
                if std::env::var_os(var).is_none() {
                    bail!("environment variable `{}` named by `address_env` is not set", var);
                }
                let var = var.clone();
                ProbeRegistration::from_factory(move || std::env::var(&var).unwrap_or_default())
            }
            (Some(_), Some(_)) => bail!("set either `address` or `address_env`, not both"),
            (None, None) => bail!("missing `address` or `address_env`"),
        };

        if let Some(name) = &self.name {
            probe = probe.name(name.clone());
        }
        if let Some(command) = &self.command {
            probe = probe.command(command.clone());
        }
        if let Some(status) = self.failure_status {
            probe = probe.failure_status(status);
        }
        if let Some(limit) = self.degraded_above {
            probe = probe.result_builder(move |value| match value.as_i64() {
                Some(v) if v > limit => {
                    ProbeOutcome::degraded(format!("Result {} exceeds {}", v, limit))
                        .with_data("value", v)
                }
                _ => ProbeOutcome::healthy().with_description(format!("Result {}", value)),
            });
        }

        let timeout = self
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(default_timeout);

        Ok(probe.tags(self.tags.iter().cloned()).timeout(timeout))
    }
}

fn sqlite_busy_timeout(
    timeout: Duration,
) -> impl Fn(SqliteConnectOptions) -> SqliteConnectOptions + Send + Sync + 'static {
    move |options| options.busy_timeout(timeout)
}

fn postgres_application_name(
    name: String,
) -> impl Fn(PgConnectOptions) -> PgConnectOptions + Send + Sync + 'static {
    move |options| options.application_name(&name)
}
